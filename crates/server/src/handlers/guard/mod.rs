/// Legacy authorized-keys route.
mod authorized_keys;

/// CA public key route.
mod ca;

/// Key revocation list route.
mod krl;

/// Per-account principals route.
mod principals;

use std::sync::Arc;

use axum::{middleware::from_fn_with_state, routing::get, Router};
use db::DatabaseConnection;

use crate::auth;

/// Create a router with the endpoints hosts poll, all guarded by the
/// node signature middleware.
pub(crate) fn routes(database: Arc<DatabaseConnection>) -> Router<Arc<DatabaseConnection>> {
    Router::new()
        .route("/ca", get(ca::ca))
        .route("/principals", get(principals::principals))
        .route("/krl", get(krl::krl))
        .route("/authorized-keys", get(authorized_keys::authorized_keys))
        .route_layer(from_fn_with_state(
            database,
            auth::require_node_signature,
        ))
}
