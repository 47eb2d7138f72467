use std::sync::Arc;

use axum::{extract::State, Extension, Json};
use db::{
    role_node, role_user, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    TransactionErrorExt, TransactionTrait,
};
use serde::Serialize;

use crate::{auth::AuthenticatedNode, error::ApiError};

/// Principals of one local account on the polling node.
#[derive(Serialize)]
pub(crate) struct Principals {
    /// Local account name the principals may assume.
    pub role: String,

    /// Principal (email) list for the account.
    pub principals: Vec<String>,
}

/// Per-account principals handler.
///
/// Role bindings are grouped by the *account* they bind, not by role name,
/// so two roles binding the node as `root` fold into one group. Groups keep
/// binding creation order, emails keep membership creation order, and
/// duplicates across roles are left in place; sshd tolerates them.
pub(super) async fn principals(
    State(db): State<Arc<DatabaseConnection>>,
    Extension(node): Extension<AuthenticatedNode>,
) -> Result<Json<Vec<Principals>>, ApiError> {
    let groups = db
        .transaction(|txn| {
            Box::pin(async move {
                let bindings = role_node::Entity::find()
                    .filter(role_node::Column::NodeId.eq(node.id))
                    .order_by_asc(role_node::Column::Id)
                    .all(txn)
                    .await?;

                let mut groups: Vec<Principals> = Vec::with_capacity(bindings.len());

                for binding in bindings {
                    let emails = role_user::emails_by_role_id(txn, binding.role_id).await?;

                    match groups.iter().position(|group| group.role == binding.account) {
                        Some(index) => groups[index].principals.extend(emails),
                        None => groups.push(Principals {
                            role: binding.account,
                            principals: emails,
                        }),
                    }
                }

                Ok::<_, ApiError>(groups)
            })
        })
        .await
        .into_raw_result()?;

    if groups.is_empty() {
        return Err(ApiError::PrincipalsNotFound);
    }

    Ok(Json(groups))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::testing::{
        bind_node, bind_user, create_certificate_authority, create_database, seed_node, seed_role,
        seed_space, seed_user, signed_request, ResponseBodyExt,
    };

    use assert_json::assert_json;
    use axum::http::StatusCode;
    use tower::Service;

    #[tokio::test]
    async fn groups_by_account_across_roles() {
        let db = create_database().await;

        let space = seed_space(&db).await;
        let node = seed_node(&db, space.id, &["root", "deploy"]).await;

        let alice = seed_user(&db, "alice@x.y").await;
        let bob = seed_user(&db, "bob@x.y").await;
        let carol = seed_user(&db, "carol@x.y").await;

        let admins = seed_role(&db, space.id, "admins").await;
        let operators = seed_role(&db, space.id, "operators").await;
        let deployers = seed_role(&db, space.id, "deployers").await;

        bind_node(&db, admins.id, node.id, "root").await;
        bind_node(&db, operators.id, node.id, "root").await;
        bind_node(&db, deployers.id, node.id, "deploy").await;

        bind_user(&db, admins.id, alice.id).await;
        bind_user(&db, operators.id, bob.id).await;
        bind_user(&db, deployers.id, carol.id).await;

        let mut service = crate::app_router(Arc::new(db), create_certificate_authority());

        let response = service
            .call(signed_request("/api/v1/guard/principals", &node, "1700000000"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        assert_json!(response.json().await, [
            {
                "role": "root",
                "principals": ["alice@x.y", "bob@x.y"]
            },
            {
                "role": "deploy",
                "principals": ["carol@x.y"]
            }
        ]);
    }

    #[tokio::test]
    async fn excludes_banned_users() {
        let db = create_database().await;

        let space = seed_space(&db).await;
        let node = seed_node(&db, space.id, &["root"]).await;

        let alice = seed_user(&db, "alice@x.y").await;
        let mallory = seed_user(&db, "mallory@x.y").await;

        let admins = seed_role(&db, space.id, "admins").await;
        bind_node(&db, admins.id, node.id, "root").await;
        bind_user(&db, admins.id, alice.id).await;
        bind_user(&db, admins.id, mallory.id).await;

        let mut active: db::user::ActiveModel = mallory.into();
        active.banned = db::ActiveValue::Set(true);
        db::ActiveModelTrait::update(active, &db).await.unwrap();

        let mut service = crate::app_router(Arc::new(db), create_certificate_authority());

        let response = service
            .call(signed_request("/api/v1/guard/principals", &node, "1700000000"))
            .await
            .unwrap();

        assert_json!(response.json().await, [
            {
                "role": "root",
                "principals": ["alice@x.y"]
            }
        ]);
    }

    #[tokio::test]
    async fn not_found_without_bindings() {
        let db = create_database().await;

        let space = seed_space(&db).await;
        let node = seed_node(&db, space.id, &["root"]).await;

        let mut service = crate::app_router(Arc::new(db), create_certificate_authority());

        let response = service
            .call(signed_request("/api/v1/guard/principals", &node, "1700000000"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
