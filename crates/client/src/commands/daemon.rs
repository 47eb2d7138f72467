use std::{path::PathBuf, str::FromStr, sync::Arc};

use chrono::Utc;
use cron::Schedule;
use tracing::{error, info};

use crate::{api::Guard, sshd_config::SshdConfig};

use super::{
    ca::CaSync, load_fragment, principals::PrincipalsSync, revoke_keys::RevokedKeysSync, Cli,
    CommandError, Daemon, SyncError,
};

/// One reconciliation section of a daemon cycle.
enum Section {
    /// Trusted user CA keys file.
    Ca(CaSync),

    /// Per-account principals directory.
    Principals(PrincipalsSync),

    /// Key revocation list file.
    RevokedKeys(RevokedKeysSync),
}

impl Section {
    /// Section name used in logs.
    fn name(&self) -> &'static str {
        match self {
            Section::Ca(_) => "ca",
            Section::Principals(_) => "principals",
            Section::RevokedKeys(_) => "revoke-keys",
        }
    }

    /// Run the section once.
    async fn run(&self) -> Result<bool, SyncError> {
        match self {
            Section::Ca(sync) => sync.run().await,
            Section::Principals(sync) => sync.run().await,
            Section::RevokedKeys(sync) => sync.run().await,
        }
    }
}

/// Resolve the `--section` flags into concrete reconcilers.
/// `all` expands to every section.
fn build_sections(
    names: &[String],
    config: &SshdConfig,
    guard: Arc<dyn Guard>,
) -> Result<Vec<Section>, CommandError> {
    let names: Vec<&str> = if names.iter().any(|name| name == "all") {
        vec!["ca", "principals", "revoke-keys"]
    } else {
        names.iter().map(String::as_str).collect()
    };

    let mut sections = Vec::with_capacity(names.len());

    for name in names {
        let section = match name {
            "ca" => Section::Ca(CaSync::new(
                guard.clone(),
                PathBuf::from(&config.trusted_user_ca_keys),
            )),
            "principals" => Section::Principals(PrincipalsSync::new(
                guard.clone(),
                PathBuf::from(config.principals_dir()),
            )),
            "revoke-keys" => Section::RevokedKeys(RevokedKeysSync::new(
                guard.clone(),
                PathBuf::from(&config.revoked_keys),
            )),
            other => {
                return Err(CommandError::Invalid(format!(
                    "unsupported section: {other}"
                )))
            }
        };

        sections.push(section);
    }

    Ok(sections)
}

/// Run every section sequentially; a failing section is logged
/// and the remaining sections still run.
async fn run_sections(sections: &[Section]) {
    for section in sections {
        if let Err(err) = section.run().await {
            error!(section = section.name(), %err, "section failed");
        }
    }
}

/// Entry point for the `daemon` subcommand.
///
/// Runs one immediate cycle, then repeats on the cron schedule until the
/// process receives an interrupt. Cycles never overlap; a tick that fires
/// while a cycle is still running is effectively skipped.
pub(crate) async fn run(cli: &Cli, args: &Daemon) -> Result<(), CommandError> {
    let guard = super::build_guard(cli)?;
    let config = load_fragment(cli)?;

    let schedule = Schedule::from_str(&args.cron)?;
    let sections = build_sections(&args.section, &config, guard)?;

    run_sections(&sections).await;

    loop {
        let Some(next) = schedule.upcoming(Utc).next() else {
            break;
        };

        let delay = (next - Utc::now()).to_std().unwrap_or_default();

        tokio::select! {
            _ = tokio::time::sleep(delay) => run_sections(&sections).await,
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    info!("daemon stopped");
    Ok(())
}
