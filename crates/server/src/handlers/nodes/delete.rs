use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use db::{
    node, role_node, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    TransactionErrorExt, TransactionTrait,
};
use serde_json::{json, Value};

use crate::error::ApiError;

/// Node deletion handler.
///
/// Role bindings referencing the node are removed in the same transaction,
/// so no role is ever left pointing at a missing node.
pub(super) async fn delete(
    State(db): State<Arc<DatabaseConnection>>,
    Path((_space_id, node_id)): Path<(i64, i64)>,
) -> Result<Json<Value>, ApiError> {
    db.transaction(|txn| {
        Box::pin(async move {
            role_node::Entity::delete_many()
                .filter(role_node::Column::NodeId.eq(node_id))
                .exec(txn)
                .await?;

            node::Entity::delete_by_id(node_id).exec(txn).await?;

            Ok::<_, ApiError>(Json(json!({})))
        })
    })
    .await
    .into_raw_result()
}
