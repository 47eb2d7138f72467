/// Space creation route.
mod create;

/// Space list route.
mod list;

use std::sync::Arc;

use axum::{routing::get, Router};
use db::DatabaseConnection;

/// Create a router that provides an API server with space management routes.
pub(crate) fn routes() -> Router<Arc<DatabaseConnection>> {
    Router::new().route("/", get(list::list).post(create::create))
}
