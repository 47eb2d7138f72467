use std::sync::Arc;

use axum::{extract::State, Json};
use db::{
    user, ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect,
    SelectExt, TransactionErrorExt, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ApiError;

/// User creation request.
#[derive(Deserialize)]
pub(super) struct CreateUserRequest {
    /// Display name.
    username: String,

    /// Unique email; doubles as the certificate principal.
    email: String,

    /// OpenSSH public key line.
    public_key: String,
}

/// User creation response.
#[derive(Serialize)]
pub(super) struct CreateUserResponse {
    /// Created user identifier.
    id: i64,
}

pub(super) async fn create(
    State(db): State<Arc<DatabaseConnection>>,
    Json(request): Json<CreateUserRequest>,
) -> Result<Json<CreateUserResponse>, ApiError> {
    if request.email.is_empty() {
        return Err(ApiError::InvalidParameter("email is required"));
    }

    if request.public_key.is_empty() {
        return Err(ApiError::InvalidParameter("public key is required"));
    }

    db.transaction(|txn| {
        Box::pin(async move {
            let email_exists = user::Entity::find()
                .select_only()
                .filter(user::Column::Email.eq(&request.email))
                .exists(txn)
                .await?;

            if email_exists {
                return Err(ApiError::UserAlreadyExists);
            }

            let model = user::Entity::insert(user::ActiveModel {
                username: ActiveValue::Set(request.username),
                email: ActiveValue::Set(request.email),
                pub_key: ActiveValue::Set(request.public_key),
                banned: ActiveValue::Set(false),
                created_at: ActiveValue::Set(db::current_timestamp()),
                updated_at: ActiveValue::Set(db::current_timestamp()),
                ..Default::default()
            })
            .exec_with_returning(txn)
            .await?;

            info!(username = %model.username, email = %model.email, "user created");

            Ok(Json(CreateUserResponse { id: model.id }))
        })
    })
    .await
    .into_raw_result()
}
