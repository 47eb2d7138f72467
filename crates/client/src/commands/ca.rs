use std::{fs, path::PathBuf, sync::Arc};

use common::signature::md5_hex;
use tracing::info;

use crate::api::Guard;

use super::{load_fragment, read_optional, Cli, CommandError, SyncError};

/// Reconciles the trusted user CA keys file against the server.
pub(crate) struct CaSync {
    /// API handle used to fetch the CA public key.
    guard: Arc<dyn Guard>,

    /// Path of the `TrustedUserCAKeys` file.
    trusted_user_ca_keys: PathBuf,
}

impl CaSync {
    /// Create a new CA reconciler.
    pub(crate) fn new(guard: Arc<dyn Guard>, trusted_user_ca_keys: PathBuf) -> Self {
        Self {
            guard,
            trusted_user_ca_keys,
        }
    }

    /// Fetch the remote CA key and rewrite the local file when the digests
    /// differ. Returns whether the file was rewritten.
    pub(crate) async fn run(&self) -> Result<bool, SyncError> {
        let remote = self.guard.get_ca().await?;
        let local = read_optional(&self.trusted_user_ca_keys)?;

        if md5_hex(remote.as_bytes()) == md5_hex(&local) {
            info!("trusted user CA keys are up to date");
            return Ok(false);
        }

        fs::write(&self.trusted_user_ca_keys, remote)?;
        info!(
            path = %self.trusted_user_ca_keys.display(),
            "trusted user CA keys updated"
        );

        Ok(true)
    }
}

/// Entry point for the `ca` subcommand.
pub(crate) async fn run(cli: &Cli) -> Result<(), CommandError> {
    let guard = super::build_guard(cli)?;
    let config = load_fragment(cli)?;

    if config.trusted_user_ca_keys.is_empty() {
        return Err(CommandError::Invalid(String::from(
            "trusted user ca keys path is empty",
        )));
    }

    CaSync::new(guard, PathBuf::from(&config.trusted_user_ca_keys))
        .run()
        .await?;

    Ok(())
}
