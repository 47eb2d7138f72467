use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use db::{user, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Full user details.
#[derive(Serialize)]
pub(super) struct UserDetails {
    /// User identifier.
    id: i64,

    /// Display name.
    username: String,

    /// User email.
    email: String,

    /// OpenSSH public key line.
    pub_key: String,

    /// Ban flag.
    banned: bool,

    /// Creation time, unix seconds.
    created_at: i64,

    /// Last update time, unix seconds.
    updated_at: i64,
}

impl From<user::Model> for UserDetails {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            pub_key: user.pub_key,
            banned: user.banned,
            created_at: user.created_at.assume_utc().unix_timestamp(),
            updated_at: user.updated_at.assume_utc().unix_timestamp(),
        }
    }
}

pub(super) async fn details(
    State(db): State<Arc<DatabaseConnection>>,
    Path(user_id): Path<i64>,
) -> Result<Json<UserDetails>, ApiError> {
    let user = user::Entity::find_by_id(user_id)
        .one(&*db)
        .await?
        .ok_or(ApiError::UserNotFound)?;

    Ok(Json(user.into()))
}

/// Query string deserialization struct for the email lookup.
#[derive(Deserialize)]
pub(super) struct UserQuery {
    /// Email to look up.
    #[serde(default)]
    email: String,
}

/// Look a user up by email.
pub(super) async fn query(
    State(db): State<Arc<DatabaseConnection>>,
    Query(query): Query<UserQuery>,
) -> Result<Json<UserDetails>, ApiError> {
    if query.email.is_empty() {
        return Err(ApiError::InvalidParameter("email is required"));
    }

    let user = user::Entity::find()
        .filter(user::Column::Email.eq(&query.email))
        .one(&*db)
        .await?
        .ok_or(ApiError::UserNotFound)?;

    Ok(Json(user.into()))
}
