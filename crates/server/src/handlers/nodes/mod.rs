/// Node creation route.
mod create;

/// Node deletion route.
mod delete;

/// Node list route.
mod list;

use std::sync::Arc;

use axum::{routing::get, Router};
use db::DatabaseConnection;

/// Create a router that provides an API server with node management routes,
/// nested under a space path.
pub(crate) fn routes() -> Router<Arc<DatabaseConnection>> {
    Router::new()
        .route("/", get(list::list).post(create::create))
        .route("/:nodeID", axum::routing::delete(delete::delete))
}
