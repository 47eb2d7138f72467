use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use db::{
    node, space, ActiveValue, DatabaseConnection, EntityTrait, TransactionErrorExt,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ApiError;

/// Node registration request.
#[derive(Deserialize)]
pub(super) struct CreateNodeRequest {
    /// Human readable node name.
    name: String,

    /// Free-form description.
    #[serde(default)]
    description: String,

    /// Node IP address, internal or external.
    #[serde(default)]
    ip: String,

    /// Local accounts available on the node. Must not be empty;
    /// element 0 becomes the default account for role bindings.
    #[serde(default)]
    accounts: Vec<String>,
}

/// Node registration response. The secret is returned here and never again.
#[derive(Serialize)]
pub(super) struct CreateNodeResponse {
    /// Node identifier.
    id: i64,

    /// Public node identifier used in polled requests.
    unique_id: String,

    /// Shared secret used to sign polled requests.
    secret: String,
}

pub(super) async fn create(
    State(db): State<Arc<DatabaseConnection>>,
    Path(space_id): Path<i64>,
    Json(request): Json<CreateNodeRequest>,
) -> Result<Json<CreateNodeResponse>, ApiError> {
    if request.name.is_empty() {
        return Err(ApiError::InvalidParameter("name is required"));
    }

    if request.accounts.is_empty() {
        return Err(ApiError::InvalidParameter("accounts is required"));
    }

    db.transaction(|txn| {
        Box::pin(async move {
            let space = space::Entity::find_by_id(space_id)
                .one(txn)
                .await?
                .ok_or(ApiError::SpaceNotFound)?;

            let (unique_id, secret) = node::generate_credentials();

            let model = node::Entity::insert(node::ActiveModel {
                space_id: ActiveValue::Set(space.id),
                name: ActiveValue::Set(request.name),
                description: ActiveValue::Set(request.description),
                unique_id: ActiveValue::Set(unique_id),
                secret: ActiveValue::Set(secret),
                ip: ActiveValue::Set(request.ip),
                last_heartbeat: ActiveValue::Set(0),
                accounts: ActiveValue::Set(node::AccountList(request.accounts)),
                created_at: ActiveValue::Set(db::current_timestamp()),
                updated_at: ActiveValue::Set(db::current_timestamp()),
                ..Default::default()
            })
            .exec_with_returning(txn)
            .await?;

            info!(name = %model.name, space = %space.name, "node registered");

            Ok(Json(CreateNodeResponse {
                id: model.id,
                unique_id: model.unique_id,
                secret: model.secret,
            }))
        })
    })
    .await
    .into_raw_result()
}
