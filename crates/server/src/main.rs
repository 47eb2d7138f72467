mod auth;
mod certificate;
mod error;
mod handlers;
mod pagination;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use axum::{Extension, Router, Server};
use certificate::CertificateAuthority;
use common::{config::Config, logging};
use db::{Database, DatabaseConnection};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = Config::new()?;

    logging::init(&config);

    let Some(server_config) = config.server.as_ref() else {
        return Err(anyhow::Error::msg("unable to load server config"));
    };

    let Some(ca_config) = config.ca.as_ref() else {
        return Err(anyhow::Error::msg("unable to load certificate authority config"));
    };

    info!("loading certificate authority key material");
    let private_key = std::fs::read(&ca_config.private_key_path)?;
    let public_key = std::fs::read(&ca_config.public_key_path)?;
    let passphrase = ca_config.passphrase.clone();
    let certificate_authority = Arc::new(CertificateAuthority::new(
        private_key,
        public_key,
        move || passphrase.clone(),
    ));

    info!("connecting to database");
    let database = Arc::new(Database::connect(&config.database.url).await?);
    let server = Server::bind(&server_config.address);

    server
        .serve(app_router(database, certificate_authority).into_make_service())
        .await?;

    Ok(())
}

fn app_router(
    database: Arc<DatabaseConnection>,
    certificate_authority: Arc<CertificateAuthority>,
) -> Router {
    let space_routes = Router::new()
        .merge(handlers::spaces::routes())
        .nest("/:spaceID/node", handlers::nodes::routes())
        .nest("/:spaceID/role", handlers::roles::routes());

    let api_routes = Router::new()
        .merge(handlers::guard::routes(database.clone()))
        .merge(handlers::users::routes())
        .nest("/space", space_routes);

    Router::new()
        .nest("/api/v1/guard", api_routes)
        .layer(Extension(certificate_authority))
        .with_state(database)
}
