use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use db::{
    role, role_user, user, ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, TransactionErrorExt, TransactionTrait,
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::ApiError;

/// Add users to a role. Users already in the role are skipped.
pub(super) async fn add(
    State(db): State<Arc<DatabaseConnection>>,
    Path((_space_id, role_id)): Path<(i64, i64)>,
    Json(user_ids): Json<Vec<i64>>,
) -> Result<Json<Value>, ApiError> {
    db.transaction(|txn| {
        Box::pin(async move {
            let role = role::Entity::find_by_id(role_id)
                .one(txn)
                .await?
                .ok_or(ApiError::RoleNotFound)?;

            for user_id in user_ids {
                let member = role_user::Entity::find()
                    .filter(role_user::Column::RoleId.eq(role.id))
                    .filter(role_user::Column::UserId.eq(user_id))
                    .one(txn)
                    .await?;

                if member.is_some() {
                    // already in the role, skip
                    continue;
                }

                let user = user::Entity::find_by_id(user_id)
                    .one(txn)
                    .await?
                    .ok_or(ApiError::UserNotFound)?;

                role_user::Entity::insert(role_user::ActiveModel {
                    role_id: ActiveValue::Set(role.id),
                    user_id: ActiveValue::Set(user.id),
                    created_at: ActiveValue::Set(db::current_timestamp()),
                    ..Default::default()
                })
                .exec_without_returning(txn)
                .await?;
            }

            Ok(Json(json!({})))
        })
    })
    .await
    .into_raw_result()
}

/// Single role member list entry.
#[derive(Serialize)]
pub(super) struct RoleUserEntry {
    /// User identifier.
    id: i64,

    /// Display name.
    username: String,

    /// User email.
    email: String,
}

/// List users that are members of a role.
pub(super) async fn list(
    State(db): State<Arc<DatabaseConnection>>,
    Path((_space_id, role_id)): Path<(i64, i64)>,
) -> Result<Json<Vec<RoleUserEntry>>, ApiError> {
    let members = role_user::Entity::find()
        .filter(role_user::Column::RoleId.eq(role_id))
        .order_by_asc(role_user::Column::Id)
        .find_also_related(user::Entity)
        .all(&*db)
        .await?;

    Ok(Json(
        members
            .into_iter()
            .filter_map(|(_, user)| {
                user.map(|user| RoleUserEntry {
                    id: user.id,
                    username: user.username,
                    email: user.email,
                })
            })
            .collect(),
    ))
}

/// Remove users from a role. An empty id list removes every member.
pub(super) async fn batch_remove(
    State(db): State<Arc<DatabaseConnection>>,
    Path((_space_id, role_id)): Path<(i64, i64)>,
    Json(user_ids): Json<Vec<i64>>,
) -> Result<Json<Value>, ApiError> {
    let mut query = role_user::Entity::delete_many()
        .filter(role_user::Column::RoleId.eq(role_id));

    if !user_ids.is_empty() {
        query = query.filter(role_user::Column::UserId.is_in(user_ids));
    }

    query.exec(&*db).await?;

    Ok(Json(json!({})))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::testing::{
        create_certificate_authority, create_database, seed_role, seed_space, seed_user,
        RequestBodyExt, ResponseBodyExt,
    };

    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::json;
    use tower::Service;

    #[tokio::test]
    async fn add_list_and_batch_remove() {
        let db = create_database().await;

        let space = seed_space(&db).await;
        let role = seed_role(&db, space.id, "admins").await;
        let alice = seed_user(&db, "alice@x.y").await;
        let bob = seed_user(&db, "bob@x.y").await;

        let mut service = crate::app_router(Arc::new(db), create_certificate_authority());

        let response = service
            .call(
                Request::builder()
                    .method("POST")
                    .uri(format!(
                        "/api/v1/guard/space/{}/role/{}/user",
                        space.id, role.id
                    ))
                    .header("Content-Type", "application/json")
                    .body(Body::from_json(json!([alice.id, bob.id])))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let response = service
            .call(
                Request::builder()
                    .method("GET")
                    .uri(format!(
                        "/api/v1/guard/space/{}/role/{}/user",
                        space.id, role.id
                    ))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let body = response.json().await;
        let members = body.as_array().expect("expected an array");

        assert_eq!(members.len(), 2);
        assert_eq!(members[0]["email"], "alice@x.y");
        assert_eq!(members[1]["email"], "bob@x.y");

        let response = service
            .call(
                Request::builder()
                    .method("POST")
                    .uri(format!(
                        "/api/v1/guard/space/{}/role/{}/user/batch/delete",
                        space.id, role.id
                    ))
                    .header("Content-Type", "application/json")
                    .body(Body::from_json(json!([alice.id])))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let response = service
            .call(
                Request::builder()
                    .method("GET")
                    .uri(format!(
                        "/api/v1/guard/space/{}/role/{}/user",
                        space.id, role.id
                    ))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let body = response.json().await;
        let members = body.as_array().expect("expected an array");

        assert_eq!(members.len(), 1);
        assert_eq!(members[0]["email"], "bob@x.y");
    }

    #[tokio::test]
    async fn rejects_unknown_user() {
        let db = create_database().await;

        let space = seed_space(&db).await;
        let role = seed_role(&db, space.id, "admins").await;

        let mut service = crate::app_router(Arc::new(db), create_certificate_authority());

        let response = service
            .call(
                Request::builder()
                    .method("POST")
                    .uri(format!(
                        "/api/v1/guard/space/{}/role/{}/user",
                        space.id, role.id
                    ))
                    .header("Content-Type", "application/json")
                    .body(Body::from_json(json!([42])))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
