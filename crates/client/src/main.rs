//! # Guard host client
//!
//! Runs on every managed host and keeps the local sshd trust material in
//! sync with the guard server: the trusted user CA keys file, the
//! per-account authorized principals directory, the key revocation list
//! and a legacy authorized-keys fallback file.
//!
//! Every polled request is signed with the node's shared secret, and every
//! response body is verified against the server's signature header before
//! any file is touched.

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

use clap::Parser;
use commands::{Cli, Commands};

/// Server API access (HTTP implementation and dry-run fake).
mod api;

/// CLI subcommands.
mod commands;

/// Managed sshd configuration fragment.
mod sshd_config;

/// CLI entrypoint.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt().with_target(false).compact().init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::InitSshdConfig(args) => commands::init_sshd_config::run(&cli, args)?,
        Commands::Ca => commands::ca::run(&cli).await?,
        Commands::Principals => commands::principals::run(&cli).await?,
        Commands::RevokeKeys => commands::revoke_keys::run(&cli).await?,
        Commands::AuthorizedKeys(args) => commands::authorized_keys::run(&cli, args).await?,
        Commands::Daemon(args) => commands::daemon::run(&cli, args).await?,
    }

    Ok(())
}
