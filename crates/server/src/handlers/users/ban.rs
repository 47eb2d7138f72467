use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use db::{
    role_user, user, ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    TransactionErrorExt, TransactionTrait,
};
use serde_json::{json, Value};
use tracing::info;

use crate::error::ApiError;

/// User ban handler.
///
/// Removes the user from every role before setting the flag, so the next
/// poll of any affected node no longer lists them. Outstanding certificates
/// are left untouched; revocation is an explicit separate step.
pub(super) async fn ban(
    State(db): State<Arc<DatabaseConnection>>,
    Path(user_id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    db.transaction(|txn| {
        Box::pin(async move {
            let user = user::Entity::find_by_id(user_id)
                .one(txn)
                .await?
                .ok_or(ApiError::UserNotFound)?;

            role_user::Entity::delete_many()
                .filter(role_user::Column::UserId.eq(user.id))
                .exec(txn)
                .await?;

            let username = user.username.clone();

            let mut active: user::ActiveModel = user.into();
            active.banned = ActiveValue::Set(true);
            active.updated_at = ActiveValue::Set(db::current_timestamp());
            db::ActiveModelTrait::update(active, txn).await?;

            info!(%username, "user banned");

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
        bind_user, create_certificate_authority, create_database, seed_role, seed_space, seed_user,
    };

    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use db::{role_user, user, ColumnTrait, EntityTrait, QueryFilter};
    use tower::Service;

    #[tokio::test]
    async fn removes_role_memberships() {
        let db = create_database().await;

        let space = seed_space(&db).await;
        let alice = seed_user(&db, "alice@x.y").await;

        let admins = seed_role(&db, space.id, "admins").await;
        let operators = seed_role(&db, space.id, "operators").await;
        bind_user(&db, admins.id, alice.id).await;
        bind_user(&db, operators.id, alice.id).await;

        let db = Arc::new(db);
        let mut service = crate::app_router(db.clone(), create_certificate_authority());

        let response = service
            .call(
                Request::builder()
                    .method("POST")
                    .uri(format!("/api/v1/guard/user/{}/ban", alice.id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let memberships = role_user::Entity::find()
            .filter(role_user::Column::UserId.eq(alice.id))
            .all(&*db)
            .await
            .unwrap();

        assert!(memberships.is_empty());

        let banned = user::Entity::find_by_id(alice.id)
            .one(&*db)
            .await
            .unwrap()
            .unwrap();

        assert!(banned.banned);
    }

    #[tokio::test]
    async fn unknown_user() {
        let db = create_database().await;

        let mut service = crate::app_router(Arc::new(db), create_certificate_authority());

        let response = service
            .call(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/guard/user/42/ban")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
