use std::sync::Arc;

use axum::{extract::State, Extension, Json};
use db::{
    role_node, role_user, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    TransactionErrorExt, TransactionTrait,
};

use crate::{auth::AuthenticatedNode, error::ApiError};

/// Authorized-keys handler.
///
/// Fallback for hosts whose sshd cannot do certificate authentication:
/// the union of member public keys over every role binding the node,
/// deduplicated by exact string match in first-seen order.
pub(super) async fn authorized_keys(
    State(db): State<Arc<DatabaseConnection>>,
    Extension(node): Extension<AuthenticatedNode>,
) -> Result<Json<Vec<String>>, ApiError> {
    let keys = db
        .transaction(|txn| {
            Box::pin(async move {
                let bindings = role_node::Entity::find()
                    .filter(role_node::Column::NodeId.eq(node.id))
                    .order_by_asc(role_node::Column::Id)
                    .all(txn)
                    .await?;

                let mut keys: Vec<String> = Vec::new();

                for binding in bindings {
                    for key in role_user::public_keys_by_role_id(txn, binding.role_id).await? {
                        if !keys.contains(&key) {
                            keys.push(key);
                        }
                    }
                }

                Ok::<_, ApiError>(keys)
            })
        })
        .await
        .into_raw_result()?;

    Ok(Json(keys))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::testing::{
        bind_node, bind_user, create_certificate_authority, create_database, seed_node, seed_role,
        seed_space, seed_user, signed_request, ResponseBodyExt,
    };

    use axum::http::StatusCode;
    use tower::Service;

    #[tokio::test]
    async fn deduplicates_across_roles() {
        let db = create_database().await;

        let space = seed_space(&db).await;
        let node = seed_node(&db, space.id, &["root"]).await;

        let alice = seed_user(&db, "alice@x.y").await;
        let bob = seed_user(&db, "bob@x.y").await;

        let admins = seed_role(&db, space.id, "admins").await;
        let operators = seed_role(&db, space.id, "operators").await;

        bind_node(&db, admins.id, node.id, "root").await;
        bind_node(&db, operators.id, node.id, "root").await;

        // Alice is a member of both roles; her key must appear once.
        bind_user(&db, admins.id, alice.id).await;
        bind_user(&db, operators.id, alice.id).await;
        bind_user(&db, operators.id, bob.id).await;

        let mut service = crate::app_router(Arc::new(db), create_certificate_authority());

        let response = service
            .call(signed_request(
                "/api/v1/guard/authorized-keys",
                &node,
                "1700000000",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = response.json().await;
        let keys = body.as_array().expect("expected an array");

        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0], serde_json::Value::String(alice.pub_key));
        assert_eq!(keys[1], serde_json::Value::String(bob.pub_key));
    }

    #[tokio::test]
    async fn empty_without_bindings() {
        let db = create_database().await;

        let space = seed_space(&db).await;
        let node = seed_node(&db, space.id, &["root"]).await;

        let mut service = crate::app_router(Arc::new(db), create_certificate_authority());

        let response = service
            .call(signed_request(
                "/api/v1/guard/authorized-keys",
                &node,
                "1700000000",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = response.json().await;
        assert_eq!(body, serde_json::json!([]));
    }
}
