use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use db::{
    role, space, ActiveValue, DatabaseConnection, EntityTrait, TransactionErrorExt,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Role creation request.
#[derive(Deserialize)]
pub(super) struct CreateRoleRequest {
    /// Role name.
    name: String,

    /// Free-form description.
    #[serde(default)]
    description: String,
}

/// Role creation response.
#[derive(Serialize)]
pub(super) struct CreateRoleResponse {
    /// Created role identifier.
    id: i64,
}

pub(super) async fn create(
    State(db): State<Arc<DatabaseConnection>>,
    Path(space_id): Path<i64>,
    Json(request): Json<CreateRoleRequest>,
) -> Result<Json<CreateRoleResponse>, ApiError> {
    if request.name.is_empty() {
        return Err(ApiError::InvalidParameter("name is required"));
    }

    db.transaction(|txn| {
        Box::pin(async move {
            let space = space::Entity::find_by_id(space_id)
                .one(txn)
                .await?
                .ok_or(ApiError::SpaceNotFound)?;

            let model = role::Entity::insert(role::ActiveModel {
                space_id: ActiveValue::Set(space.id),
                name: ActiveValue::Set(request.name),
                description: ActiveValue::Set(request.description),
                created_at: ActiveValue::Set(db::current_timestamp()),
                ..Default::default()
            })
            .exec_with_returning(txn)
            .await?;

            Ok(Json(CreateRoleResponse { id: model.id }))
        })
    })
    .await
    .into_raw_result()
}
