use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use db::{role, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;

use crate::error::ApiError;

/// Single role list entry.
#[derive(Serialize)]
pub(super) struct RoleListEntry {
    /// Role identifier.
    id: i64,

    /// Role name.
    name: String,

    /// Free-form description.
    description: String,

    /// Creation time, unix seconds.
    created_at: i64,
}

pub(super) async fn list(
    State(db): State<Arc<DatabaseConnection>>,
    Path(space_id): Path<i64>,
) -> Result<Json<Vec<RoleListEntry>>, ApiError> {
    let roles = role::Entity::find()
        .filter(role::Column::SpaceId.eq(space_id))
        .order_by_asc(role::Column::Id)
        .all(&*db)
        .await?;

    Ok(Json(
        roles
            .into_iter()
            .map(|role| RoleListEntry {
                id: role.id,
                name: role.name,
                description: role.description,
                created_at: role.created_at.assume_utc().unix_timestamp(),
            })
            .collect(),
    ))
}
