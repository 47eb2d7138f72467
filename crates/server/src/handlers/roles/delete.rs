use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use db::{
    role, role_node, role_user, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    TransactionErrorExt, TransactionTrait,
};
use serde_json::{json, Value};
use tracing::info;

use crate::error::ApiError;

/// Role deletion handler. Memberships go first, then the role row.
pub(super) async fn delete(
    State(db): State<Arc<DatabaseConnection>>,
    Path((_space_id, role_id)): Path<(i64, i64)>,
) -> Result<Json<Value>, ApiError> {
    db.transaction(|txn| {
        Box::pin(async move {
            role_user::Entity::delete_many()
                .filter(role_user::Column::RoleId.eq(role_id))
                .exec(txn)
                .await?;

            role_node::Entity::delete_many()
                .filter(role_node::Column::RoleId.eq(role_id))
                .exec(txn)
                .await?;

            role::Entity::delete_by_id(role_id).exec(txn).await?;

            info!(role_id, "role deleted");

            Ok::<_, ApiError>(Json(json!({})))
        })
    })
    .await
    .into_raw_result()
}
