use std::{fs, path::PathBuf, sync::Arc};

use common::signature::md5_hex;
use tracing::info;

use crate::api::Guard;

use super::{read_optional, AuthorizedKeys, Cli, CommandError, SyncError};

/// Reconciles the legacy authorized-keys fallback file, used on hosts
/// whose sshd cannot do certificate authentication.
pub(crate) struct AuthorizedKeysSync {
    /// API handle used to fetch the key list.
    guard: Arc<dyn Guard>,

    /// Path of the managed authorized-keys file.
    authorized_keys_path: PathBuf,
}

impl AuthorizedKeysSync {
    /// Create a new authorized-keys reconciler.
    pub(crate) fn new(guard: Arc<dyn Guard>, authorized_keys_path: PathBuf) -> Self {
        Self {
            guard,
            authorized_keys_path,
        }
    }

    /// Fetch the remote key list and rewrite the local file when the
    /// digests differ. Returns whether the file was rewritten.
    pub(crate) async fn run(&self) -> Result<bool, SyncError> {
        let remote = self.guard.get_authorized_keys().await?;

        let mut content = String::new();
        for key in &remote {
            content.push_str(key);
            content.push('\n');
        }

        let local = read_optional(&self.authorized_keys_path)?;

        if md5_hex(content.as_bytes()) == md5_hex(&local) {
            info!("authorized keys are up to date");
            return Ok(false);
        }

        fs::write(&self.authorized_keys_path, content)?;
        info!(
            path = %self.authorized_keys_path.display(),
            "authorized keys updated"
        );

        Ok(true)
    }
}

/// Entry point for the `authorized-keys` subcommand.
pub(crate) async fn run(cli: &Cli, args: &AuthorizedKeys) -> Result<(), CommandError> {
    let guard = super::build_guard(cli)?;

    let path = match &args.authorized_keys_path {
        Some(path) => path.clone(),
        None => home::home_dir()
            .ok_or_else(|| CommandError::Invalid(String::from("unable to find home directory")))?
            .join(".ssh/guard_keys"),
    };

    AuthorizedKeysSync::new(guard, path).run().await?;

    Ok(())
}
