use std::{fs, path::PathBuf, sync::Arc};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use common::signature::md5_hex;
use tracing::info;

use crate::api::Guard;

use super::{load_fragment, read_optional, Cli, CommandError, SyncError};

/// Reconciles the binary key revocation list file.
///
/// The server sends the KRL base64-encoded, with an empty string meaning
/// "no revocations"; an empty local file carries the same meaning for sshd.
pub(crate) struct RevokedKeysSync {
    /// API handle used to fetch the revocation list.
    guard: Arc<dyn Guard>,

    /// Path of the `RevokedKeys` file.
    revoked_keys: PathBuf,
}

impl RevokedKeysSync {
    /// Create a new revocation list reconciler.
    pub(crate) fn new(guard: Arc<dyn Guard>, revoked_keys: PathBuf) -> Self {
        Self {
            guard,
            revoked_keys,
        }
    }

    /// Fetch the remote revocation list and rewrite the local file when the
    /// digests differ. Returns whether the file was rewritten.
    pub(crate) async fn run(&self) -> Result<bool, SyncError> {
        let remote = self.guard.get_krl().await?;

        let bytes = if remote.is_empty() {
            Vec::new()
        } else {
            STANDARD.decode(remote)?
        };

        let local = read_optional(&self.revoked_keys)?;

        if md5_hex(&bytes) == md5_hex(&local) {
            info!("revoked keys are up to date");
            return Ok(false);
        }

        fs::write(&self.revoked_keys, bytes)?;
        info!(path = %self.revoked_keys.display(), "revoked keys updated");

        Ok(true)
    }
}

/// Entry point for the `revoke-keys` subcommand.
pub(crate) async fn run(cli: &Cli) -> Result<(), CommandError> {
    let guard = super::build_guard(cli)?;
    let config = load_fragment(cli)?;

    if config.revoked_keys.is_empty() {
        return Err(CommandError::Invalid(String::from(
            "revoked keys path is empty",
        )));
    }

    RevokedKeysSync::new(guard, PathBuf::from(&config.revoked_keys))
        .run()
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use base64::{engine::general_purpose::STANDARD, Engine as _};

    use crate::api::{FakeGuard, Guard, GuardApiError, Principals};

    use super::RevokedKeysSync;

    /// Fake that serves a non-empty revocation list.
    struct RevokingGuard;

    #[async_trait]
    impl Guard for RevokingGuard {
        async fn get_ca(&self) -> Result<String, GuardApiError> {
            Ok(String::new())
        }

        async fn get_principals(&self) -> Result<Vec<Principals>, GuardApiError> {
            Ok(Vec::new())
        }

        async fn get_krl(&self) -> Result<String, GuardApiError> {
            Ok(STANDARD.encode(b"binary-krl"))
        }

        async fn get_authorized_keys(&self) -> Result<Vec<String>, GuardApiError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn empty_revocation_list_writes_empty_file_once() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("revoked-keys");

        let sync = RevokedKeysSync::new(Arc::new(FakeGuard), target.clone());

        assert!(sync.run().await.unwrap());
        assert_eq!(std::fs::read(&target).unwrap(), Vec::<u8>::new());

        assert!(!sync.run().await.unwrap());
    }

    #[tokio::test]
    async fn decodes_and_writes_krl_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("revoked-keys");

        let sync = RevokedKeysSync::new(Arc::new(RevokingGuard), target.clone());

        assert!(sync.run().await.unwrap());
        assert_eq!(std::fs::read(&target).unwrap(), b"binary-krl");

        assert!(!sync.run().await.unwrap());
    }
}
