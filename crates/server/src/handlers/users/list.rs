use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use db::{user, DatabaseConnection, EntityTrait, PaginatorTrait, QueryOrder, QuerySelect};
use serde::Serialize;

use crate::{error::ApiError, pagination::Pagination};

/// Single user list entry. The public key is deliberately omitted;
/// it is only exposed through the per-user details route.
#[derive(Serialize)]
pub(super) struct UserListEntry {
    /// User identifier.
    id: i64,

    /// Display name.
    username: String,

    /// User email.
    email: String,

    /// Ban flag.
    banned: bool,

    /// Creation time, unix seconds.
    created_at: i64,
}

/// User list response.
#[derive(Serialize)]
pub(super) struct ListUsersResponse {
    /// Total count of registered users.
    total: u64,

    /// Current page of users.
    users: Vec<UserListEntry>,
}

pub(super) async fn list(
    State(db): State<Arc<DatabaseConnection>>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<ListUsersResponse>, ApiError> {
    let total = user::Entity::find().count(&*db).await?;

    let users = user::Entity::find()
        .order_by_asc(user::Column::Id)
        .offset(pagination.offset())
        .limit(pagination.limit())
        .all(&*db)
        .await?;

    Ok(Json(ListUsersResponse {
        total,
        users: users
            .into_iter()
            .map(|user| UserListEntry {
                id: user.id,
                username: user.username,
                email: user.email,
                banned: user.banned,
                created_at: user.created_at.assume_utc().unix_timestamp(),
            })
            .collect(),
    }))
}
