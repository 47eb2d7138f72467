/// User ban route.
mod ban;

/// Certificate grant route.
mod cert;

/// User creation route.
mod create;

/// User details and email query routes.
mod details;

/// User list route.
mod list;

/// Public key replacement route.
mod public_key;

use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};
use db::DatabaseConnection;

/// Create a router that provides an API server with user management routes.
pub(crate) fn routes() -> Router<Arc<DatabaseConnection>> {
    Router::new()
        .route("/user", post(create::create).get(details::query))
        .route("/users", get(list::list))
        .route("/user/:userID", get(details::details))
        .route("/user/:userID/ban", post(ban::ban))
        .route("/user/:userID/publicKey", put(public_key::update))
        .route("/user/:userID/cert", post(cert::grant))
}
