//! # Database models and interation utilities
//!
//! This crate provides definitions for database models that can be used, in conjunction
//! with [`sea_orm`], to interact with the database in a typed manner.
//!
//! Besides the entity definitions it carries the projection queries used by the
//! authorization resolver (see [`role_user`] and [`user_cert`]), utilities to map
//! transaction errors ([`TransactionErrorExt::into_raw_result`]) and commonly used
//! `SELECT` query utilities ([`SelectExt`]).

pub mod node;
pub mod role;
pub mod role_node;
pub mod role_user;
pub mod space;
pub mod user;
pub mod user_cert;

use std::error::Error;

use async_trait::async_trait;
pub use sea_orm::{
    self, sea_query, ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, Database,
    DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait, FromQueryResult, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, QueryTrait, StatementBuilder, TransactionError,
    TransactionTrait, TryGetableMany,
};
pub use time::{OffsetDateTime, PrimitiveDateTime};

/// Current UTC time as the naive timestamp type stored in `created_at`
/// and `updated_at` columns.
pub fn current_timestamp() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_utc();
    PrimitiveDateTime::new(now.date(), now.time())
}

/// Utility methods for operating with transaction errors.
pub trait TransactionErrorExt<T, E> {
    /// Convert transaction [`Result`] into a [`Result`] with a custom error.
    ///
    /// Connection-level errors are converted with the custom error's
    /// `From<DbErr>` implementation, errors raised inside the transaction
    /// closure are passed through unchanged:
    ///
    /// ```ignore
    /// let result: Result<(), ApiError> = db
    ///     .transaction(|txn| Box::pin(async move { Ok(()) }))
    ///     .await
    ///     .into_raw_result();
    /// ```
    fn into_raw_result(self) -> Result<T, E>;
}

impl<T, E> TransactionErrorExt<T, E> for Result<T, TransactionError<E>>
where
    E: Error + From<DbErr>,
{
    fn into_raw_result(self) -> Result<T, E> {
        match self {
            Ok(val) => Ok(val),
            Err(TransactionError::Connection(err)) => Err(err.into()),
            Err(TransactionError::Transaction(err)) => Err(err),
        }
    }
}

/// Utility methods for SELECT queries.
#[async_trait]
pub trait SelectExt {
    /// Check if at least one record that satisfies a query.
    ///
    /// # Example
    ///
    /// ```ignore
    /// // Determine if at least one record of entity exists in the database
    /// let exists = Entity::find()
    ///     .select_only()
    ///     .exists(&db)
    ///     .await?;
    /// ```
    async fn exists<C: ConnectionTrait + Send>(self, db: &C) -> Result<bool, DbErr>;
}

#[async_trait]
impl<T> SelectExt for T
where
    T: QueryTrait<QueryStatement = sea_query::SelectStatement> + Send,
{
    async fn exists<C: ConnectionTrait + Send>(self, db: &C) -> Result<bool, DbErr> {
        use crate::sea_query::{Expr, Query};

        let mut query = self.into_query();

        // Fix failing tests with SQLite by returning at least some expr
        query.expr(1);

        let stmt = StatementBuilder::build(
            Query::select().expr(Expr::exists(query)),
            &db.get_database_backend(),
        );

        db.query_one(stmt).await?.unwrap().try_get_by_index(0)
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::{ActiveValue, ConnectionTrait, Database, EntityTrait, QuerySelect, Schema};

    use crate::{space, SelectExt};

    #[tokio::test]
    async fn exists() {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("unable to create test database");

        let builder = db.get_database_backend();
        let table = Schema::new(builder).create_table_from_entity(space::Entity);
        db.execute(builder.build(&table)).await.unwrap();

        let exists = space::Entity::find().select_only().exists(&db).await.unwrap();

        assert!(!exists);

        space::Entity::insert(space::ActiveModel {
            name: ActiveValue::Set(String::from("production")),
            description: ActiveValue::Set(String::new()),
            created_at: ActiveValue::Set(crate::current_timestamp()),
            ..Default::default()
        })
        .exec_without_returning(&db)
        .await
        .unwrap();

        let exists = space::Entity::find().select_only().exists(&db).await.unwrap();

        assert!(exists);
    }
}
