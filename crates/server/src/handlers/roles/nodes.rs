use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use db::{
    node, role, role_node, ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, TransactionErrorExt, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ApiError;

/// One node to bind to a role. The node may be addressed either by its
/// numeric id or by its unique identifier.
#[derive(Deserialize)]
pub(super) struct RoleNodeRequest {
    /// Numeric node identifier; zero means "use `unique_id` instead".
    #[serde(default)]
    node_id: i64,

    /// Public node identifier, used when `node_id` is zero.
    #[serde(default)]
    unique_id: String,

    /// Local account to bind the node under. Empty selects the node's
    /// default account.
    #[serde(default)]
    account: String,
}

/// Bind nodes to a role.
///
/// Nodes already bound are skipped. A requested account must be one of the
/// node's local accounts; when none is requested, element 0 of the node's
/// account list is used.
pub(super) async fn add(
    State(db): State<Arc<DatabaseConnection>>,
    Path((_space_id, role_id)): Path<(i64, i64)>,
    Json(request): Json<Vec<RoleNodeRequest>>,
) -> Result<Json<Value>, ApiError> {
    db.transaction(|txn| {
        Box::pin(async move {
            let role = role::Entity::find_by_id(role_id)
                .one(txn)
                .await?
                .ok_or(ApiError::RoleNotFound)?;

            for source in request {
                let node = if source.node_id != 0 {
                    node::Entity::find_by_id(source.node_id).one(txn).await?
                } else {
                    node::Entity::find()
                        .filter(node::Column::UniqueId.eq(&source.unique_id))
                        .one(txn)
                        .await?
                };

                let Some(node) = node else {
                    return Err(ApiError::NodeNotFound);
                };

                let bound = role_node::Entity::find()
                    .filter(role_node::Column::RoleId.eq(role.id))
                    .filter(role_node::Column::NodeId.eq(node.id))
                    .one(txn)
                    .await?;

                if bound.is_some() {
                    // already in the role, skip
                    continue;
                }

                let account = if source.account.is_empty() {
                    // accounts are validated to be non-empty at registration
                    node.accounts.0[0].clone()
                } else if node.accounts.0.contains(&source.account) {
                    source.account
                } else {
                    return Err(ApiError::InvalidParameter(
                        "account is not available on the node",
                    ));
                };

                role_node::Entity::insert(role_node::ActiveModel {
                    role_id: ActiveValue::Set(role.id),
                    node_id: ActiveValue::Set(node.id),
                    account: ActiveValue::Set(account),
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

/// Single bound-node list entry, joined with node attributes.
#[derive(Serialize)]
pub(super) struct RoleNodeEntry {
    /// Node identifier.
    id: i64,

    /// Human readable node name.
    name: String,

    /// Free-form description.
    description: String,

    /// Public node identifier.
    unique_id: String,

    /// Node IP address.
    ip: String,

    /// Last successful poll, unix seconds.
    last_heartbeat: i64,

    /// Account the role binds the node under.
    account: String,
}

/// List nodes bound to a role.
pub(super) async fn list(
    State(db): State<Arc<DatabaseConnection>>,
    Path((_space_id, role_id)): Path<(i64, i64)>,
) -> Result<Json<Vec<RoleNodeEntry>>, ApiError> {
    let bindings = role_node::Entity::find()
        .filter(role_node::Column::RoleId.eq(role_id))
        .order_by_asc(role_node::Column::Id)
        .find_also_related(node::Entity)
        .all(&*db)
        .await?;

    Ok(Json(
        bindings
            .into_iter()
            .filter_map(|(binding, node)| {
                node.map(|node| RoleNodeEntry {
                    id: node.id,
                    name: node.name,
                    description: node.description,
                    unique_id: node.unique_id,
                    ip: node.ip,
                    last_heartbeat: node.last_heartbeat,
                    account: binding.account,
                })
            })
            .collect(),
    ))
}

/// Remove nodes from a role. An empty id list removes every binding.
pub(super) async fn batch_remove(
    State(db): State<Arc<DatabaseConnection>>,
    Path((_space_id, role_id)): Path<(i64, i64)>,
    Json(node_ids): Json<Vec<i64>>,
) -> Result<Json<Value>, ApiError> {
    let mut query = role_node::Entity::delete_many()
        .filter(role_node::Column::RoleId.eq(role_id));

    if !node_ids.is_empty() {
        query = query.filter(role_node::Column::NodeId.is_in(node_ids));
    }

    query.exec(&*db).await?;

    Ok(Json(json!({})))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::testing::{
        create_certificate_authority, create_database, seed_node, seed_role, seed_space,
        RequestBodyExt, ResponseBodyExt,
    };

    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::json;
    use tower::Service;

    #[tokio::test]
    async fn binds_with_default_and_explicit_accounts() {
        let db = create_database().await;

        let space = seed_space(&db).await;
        let node = seed_node(&db, space.id, &["root", "deploy"]).await;
        let role = seed_role(&db, space.id, "admins").await;

        let mut service = crate::app_router(Arc::new(db), create_certificate_authority());

        let response = service
            .call(
                Request::builder()
                    .method("POST")
                    .uri(format!(
                        "/api/v1/guard/space/{}/role/{}/node",
                        space.id, role.id
                    ))
                    .header("Content-Type", "application/json")
                    .body(Body::from_json(json!([{ "node_id": node.id }])))
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
                        "/api/v1/guard/space/{}/role/{}/node",
                        space.id, role.id
                    ))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let body = response.json().await;
        let bindings = body.as_array().expect("expected an array");

        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0]["id"], 1);
        assert_eq!(bindings[0]["unique_id"], node.unique_id.as_str());
        assert_eq!(bindings[0]["account"], "root");
    }

    #[tokio::test]
    async fn binds_by_unique_id() {
        let db = create_database().await;

        let space = seed_space(&db).await;
        let node = seed_node(&db, space.id, &["root", "deploy"]).await;
        let role = seed_role(&db, space.id, "deployers").await;

        let mut service = crate::app_router(Arc::new(db), create_certificate_authority());

        let response = service
            .call(
                Request::builder()
                    .method("POST")
                    .uri(format!(
                        "/api/v1/guard/space/{}/role/{}/node",
                        space.id, role.id
                    ))
                    .header("Content-Type", "application/json")
                    .body(Body::from_json(json!([{
                        "unique_id": node.unique_id,
                        "account": "deploy"
                    }])))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn rejects_unknown_account() {
        let db = create_database().await;

        let space = seed_space(&db).await;
        let node = seed_node(&db, space.id, &["root"]).await;
        let role = seed_role(&db, space.id, "admins").await;

        let mut service = crate::app_router(Arc::new(db), create_certificate_authority());

        let response = service
            .call(
                Request::builder()
                    .method("POST")
                    .uri(format!(
                        "/api/v1/guard/space/{}/role/{}/node",
                        space.id, role.id
                    ))
                    .header("Content-Type", "application/json")
                    .body(Body::from_json(json!([{
                        "node_id": node.id,
                        "account": "postgres"
                    }])))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn skips_duplicate_bindings() {
        let db = create_database().await;

        let space = seed_space(&db).await;
        let node = seed_node(&db, space.id, &["root"]).await;
        let role = seed_role(&db, space.id, "admins").await;

        let mut service = crate::app_router(Arc::new(db), create_certificate_authority());

        for _ in 0..2 {
            let response = service
                .call(
                    Request::builder()
                        .method("POST")
                        .uri(format!(
                            "/api/v1/guard/space/{}/role/{}/node",
                            space.id, role.id
                        ))
                        .header("Content-Type", "application/json")
                        .body(Body::from_json(json!([{ "node_id": node.id }])))
                        .unwrap(),
                )
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = service
            .call(
                Request::builder()
                    .method("GET")
                    .uri(format!(
                        "/api/v1/guard/space/{}/role/{}/node",
                        space.id, role.id
                    ))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let body = response.json().await;
        assert_eq!(body.as_array().unwrap().len(), 1);
    }
}
