/// Role creation route.
mod create;

/// Role deletion route.
mod delete;

/// Role list route.
mod list;

/// Role node binding routes.
mod nodes;

/// Role user membership routes.
mod users;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use db::DatabaseConnection;

/// Create a router that provides an API server with role management routes,
/// nested under a space path.
pub(crate) fn routes() -> Router<Arc<DatabaseConnection>> {
    Router::new()
        .route("/", get(list::list).post(create::create))
        .route("/:roleID", axum::routing::delete(delete::delete))
        .route("/:roleID/node", get(nodes::list).post(nodes::add))
        .route("/:roleID/node/batch/delete", post(nodes::batch_remove))
        .route("/:roleID/user", get(users::list).post(users::add))
        .route("/:roleID/user/batch/delete", post(users::batch_remove))
}
