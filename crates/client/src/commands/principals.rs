use std::{fs, path::PathBuf, sync::Arc};

use common::signature::md5_hex;
use tracing::info;

use crate::api::{Guard, Principals};

use super::{load_fragment, read_optional, Cli, CommandError, SyncError};

/// Reconciles the per-account authorized principals directory.
///
/// Each remote group becomes one file named after the account. Files are
/// overwritten when their digest differs and left alone when equal; files
/// for accounts the server no longer mentions are not removed.
pub(crate) struct PrincipalsSync {
    /// API handle used to fetch the principals groups.
    guard: Arc<dyn Guard>,

    /// Directory holding one principals file per account.
    authorized_principals_dir: PathBuf,
}

impl PrincipalsSync {
    /// Create a new principals reconciler.
    pub(crate) fn new(guard: Arc<dyn Guard>, authorized_principals_dir: PathBuf) -> Self {
        Self {
            guard,
            authorized_principals_dir,
        }
    }

    /// Fetch the remote groups and rewrite differing files.
    /// Returns whether any file was rewritten.
    pub(crate) async fn run(&self) -> Result<bool, SyncError> {
        let remote = self.guard.get_principals().await?;

        fs::create_dir_all(&self.authorized_principals_dir)?;

        let mut updated = false;

        for group in remote {
            let content = render(&group);
            let path = self.authorized_principals_dir.join(&group.role);
            let local = read_optional(&path)?;

            if md5_hex(content.as_bytes()) == md5_hex(&local) {
                info!(role = %group.role, "principals are up to date");
                continue;
            }

            fs::write(&path, content)?;
            info!(role = %group.role, "principals updated");
            updated = true;
        }

        Ok(updated)
    }
}

/// Serialize one principals group into its file content: the managed-file
/// header followed by one email per line, without a trailing newline.
fn render(group: &Principals) -> String {
    format!(
        "# Authorized principals for role {}\n# This file is managed by guard, do not edit it manually\n{}",
        group.role,
        group.principals.join("\n"),
    )
}

/// Entry point for the `principals` subcommand.
pub(crate) async fn run(cli: &Cli) -> Result<(), CommandError> {
    let guard = super::build_guard(cli)?;
    let config = load_fragment(cli)?;

    let dir = config.principals_dir();
    if dir.is_empty() {
        return Err(CommandError::Invalid(String::from(
            "authorized principals path is empty",
        )));
    }

    PrincipalsSync::new(guard, PathBuf::from(dir)).run().await?;

    Ok(())
}
