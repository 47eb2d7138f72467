use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use db::{
    node, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use serde::Serialize;

use crate::{error::ApiError, pagination::Pagination};

/// Single node list entry. The shared secret is never listed.
#[derive(Serialize)]
pub(super) struct NodeListEntry {
    /// Node identifier.
    id: i64,

    /// Public node identifier.
    unique_id: String,

    /// Human readable node name.
    name: String,

    /// Free-form description.
    description: String,

    /// Node IP address.
    ip: String,

    /// Last successful poll, unix seconds. Zero if the node never polled.
    last_heartbeat: i64,

    /// Local accounts available on the node.
    accounts: Vec<String>,

    /// Creation time, unix seconds.
    created_at: i64,
}

/// Node list response.
#[derive(Serialize)]
pub(super) struct ListNodesResponse {
    /// Total count of nodes in the space.
    total: u64,

    /// Current page of nodes.
    nodes: Vec<NodeListEntry>,
}

pub(super) async fn list(
    State(db): State<Arc<DatabaseConnection>>,
    Path(space_id): Path<i64>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<ListNodesResponse>, ApiError> {
    let total = node::Entity::find()
        .filter(node::Column::SpaceId.eq(space_id))
        .count(&*db)
        .await?;

    let nodes = node::Entity::find()
        .filter(node::Column::SpaceId.eq(space_id))
        .order_by_asc(node::Column::Id)
        .offset(pagination.offset())
        .limit(pagination.limit())
        .all(&*db)
        .await?;

    Ok(Json(ListNodesResponse {
        total,
        nodes: nodes
            .into_iter()
            .map(|node| NodeListEntry {
                id: node.id,
                unique_id: node.unique_id,
                name: node.name,
                description: node.description,
                ip: node.ip,
                last_heartbeat: node.last_heartbeat,
                accounts: node.accounts.0,
                created_at: node.created_at.assume_utc().unix_timestamp(),
            })
            .collect(),
    }))
}
