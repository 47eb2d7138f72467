use std::sync::Arc;

use axum::{extract::State, Json};
use db::{space, DatabaseConnection, EntityTrait, QueryOrder};
use serde::Serialize;

use crate::error::ApiError;

/// Single space list entry.
#[derive(Serialize)]
pub(super) struct SpaceListEntry {
    /// Space identifier.
    id: i64,

    /// Space name.
    name: String,

    /// Free-form description.
    description: String,

    /// Creation time, unix seconds.
    created_at: i64,
}

pub(super) async fn list(
    State(db): State<Arc<DatabaseConnection>>,
) -> Result<Json<Vec<SpaceListEntry>>, ApiError> {
    let spaces = space::Entity::find()
        .order_by_asc(space::Column::Id)
        .all(&*db)
        .await?;

    Ok(Json(
        spaces
            .into_iter()
            .map(|space| SpaceListEntry {
                id: space.id,
                name: space.name,
                description: space.description,
                created_at: space.created_at.assume_utc().unix_timestamp(),
            })
            .collect(),
    ))
}
