use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use db::{
    sea_query::Expr, user, user_cert, ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait,
    QueryFilter, TransactionErrorExt, TransactionTrait,
};
use serde_json::{json, Value};
use tracing::info;

use crate::error::ApiError;

/// Public key replacement handler.
///
/// The request body is the new OpenSSH public key line as a JSON string.
/// Every outstanding certificate of the user was issued against the old
/// key, so all of them are revoked in the same transaction; the rows stay
/// behind as history and as revocation-list fodder until they age out.
pub(super) async fn update(
    State(db): State<Arc<DatabaseConnection>>,
    Path(user_id): Path<i64>,
    Json(public_key): Json<String>,
) -> Result<Json<Value>, ApiError> {
    if public_key.is_empty() {
        return Err(ApiError::InvalidParameter("public key is required"));
    }

    db.transaction(|txn| {
        Box::pin(async move {
            let user = user::Entity::find_by_id(user_id)
                .one(txn)
                .await?
                .ok_or(ApiError::UserNotFound)?;

            let username = user.username.clone();

            let mut active: user::ActiveModel = user.into();
            active.pub_key = ActiveValue::Set(public_key);
            active.updated_at = ActiveValue::Set(db::current_timestamp());
            db::ActiveModelTrait::update(active, txn).await?;

            user_cert::Entity::update_many()
                .col_expr(user_cert::Column::IsRevoked, Expr::value(true))
                .filter(user_cert::Column::UserId.eq(user_id))
                .exec(txn)
                .await?;

            info!(%username, "user public key updated, outstanding certs revoked");

            Ok(Json(json!({})))
        })
    })
    .await
    .into_raw_result()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::testing::{
        create_certificate_authority, create_database, seed_user, test_public_key, RequestBodyExt,
    };

    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use db::{user_cert, ActiveValue, ColumnTrait, EntityTrait, QueryFilter};
    use tower::Service;

    #[tokio::test]
    async fn revokes_all_outstanding_certs() {
        let db = create_database().await;

        let alice = seed_user(&db, "alice@x.y").await;

        for _ in 0..2 {
            user_cert::Entity::insert(user_cert::ActiveModel {
                user_id: ActiveValue::Set(alice.id),
                cert: ActiveValue::Set(String::new()),
                expires_at: ActiveValue::Set(i64::MAX),
                is_revoked: ActiveValue::Set(false),
                created_at: ActiveValue::Set(db::current_timestamp()),
                updated_at: ActiveValue::Set(db::current_timestamp()),
                ..Default::default()
            })
            .exec_without_returning(&db)
            .await
            .unwrap();
        }

        let db = Arc::new(db);
        let mut service = crate::app_router(db.clone(), create_certificate_authority());

        let response = service
            .call(
                Request::builder()
                    .method("PUT")
                    .uri(format!("/api/v1/guard/user/{}/publicKey", alice.id))
                    .header("Content-Type", "application/json")
                    .body(Body::from_json(test_public_key()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let certs = user_cert::Entity::find()
            .filter(user_cert::Column::UserId.eq(alice.id))
            .all(&*db)
            .await
            .unwrap();

        assert_eq!(certs.len(), 2);
        assert!(certs.iter().all(|cert| cert.is_revoked));
    }
}
