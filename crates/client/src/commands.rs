/// `authorized-keys` subcommand.
pub(crate) mod authorized_keys;

/// `ca` subcommand.
pub(crate) mod ca;

/// `daemon` subcommand.
pub(crate) mod daemon;

/// `init-sshd-config` subcommand.
pub(crate) mod init_sshd_config;

/// `principals` subcommand.
pub(crate) mod principals;

/// `revoke-keys` subcommand.
pub(crate) mod revoke_keys;

use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use clap::{Args, Parser, Subcommand};
use derive_more::{Display, Error, From};

use crate::{
    api::{FakeGuard, Guard, GuardApiError, HttpGuard},
    sshd_config::{SshdConfig, SshdConfigError},
};

/// CLI configuration.
#[derive(Parser)]
#[command(about)]
pub(crate) struct Cli {
    /// Directory that holds sshd configuration fragments.
    #[arg(long, default_value = "/etc/ssh/sshd_config.d/")]
    pub sshd_config_dir: PathBuf,

    /// Name of the managed sshd configuration fragment.
    #[arg(short, long, default_value = "guard.conf")]
    pub file_name: String,

    /// Address of the guard server.
    #[arg(long)]
    pub address: Option<String>,

    /// Node unique identifier issued at registration.
    #[arg(long)]
    pub node_id: Option<String>,

    /// Node shared secret issued at registration.
    #[arg(long)]
    pub node_secret: Option<String>,

    /// Swap the server API for an in-memory fake.
    #[arg(long)]
    pub dry_run: bool,

    /// Selected subcommand.
    #[command(subcommand)]
    pub command: Commands,
}

/// Supported subcommands.
#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Write the managed sshd configuration fragment.
    InitSshdConfig(InitSshdConfig),

    /// Update the trusted user CA keys file.
    Ca,

    /// Update the per-account authorized principals files.
    Principals,

    /// Update the SSH key revocation list file.
    RevokeKeys,

    /// Update the fallback authorized keys file.
    AuthorizedKeys(AuthorizedKeys),

    /// Run the reconciliation sections on a cron schedule.
    Daemon(Daemon),
}

/// `init-sshd-config` subcommand configuration.
#[derive(Args)]
pub(crate) struct InitSshdConfig {
    /// AuthorizedPrincipalsFile path written into the fragment.
    #[arg(long, default_value = "/etc/ssh/auth_principals/%u")]
    pub auth_principals_file: String,

    /// TrustedUserCAKeys path written into the fragment.
    #[arg(long, default_value = "/etc/ssh/guard.pub")]
    pub ca_pub_file: String,

    /// RevokedKeys path written into the fragment.
    #[arg(long, default_value = "/etc/ssh/sshd_config.d/revoked-keys")]
    pub revoked_keys: String,
}

/// `authorized-keys` subcommand configuration.
#[derive(Args)]
pub(crate) struct AuthorizedKeys {
    /// Target file; defaults to `$HOME/.ssh/guard_keys`.
    #[arg(long)]
    pub authorized_keys_path: Option<PathBuf>,
}

/// `daemon` subcommand configuration.
#[derive(Args)]
pub(crate) struct Daemon {
    /// Cron expression controlling the reconciliation schedule.
    #[arg(short, long, default_value = "0 0/5 * * * *")]
    pub cron: String,

    /// Sections to run: all, ca, principals, revoke-keys.
    #[arg(short, long, default_value = "all")]
    pub section: Vec<String>,
}

/// Errors produced by the reconciliation sections.
#[derive(Debug, Display, From, Error)]
pub(crate) enum SyncError {
    /// Server API failure.
    Api(GuardApiError),

    /// Local filesystem failure.
    Io(io::Error),

    /// Revocation list payload was not valid base64.
    Base64(base64::DecodeError),
}

/// Errors produced while preparing or running a subcommand.
#[derive(Debug, Display, From, Error)]
pub(crate) enum CommandError {
    /// Reconciliation failure.
    Sync(SyncError),

    /// Managed sshd fragment failure.
    SshdConfig(SshdConfigError),

    /// Server API setup failure.
    Api(GuardApiError),

    /// Malformed cron expression.
    Cron(cron::error::Error),

    /// Missing or inconsistent command line configuration.
    #[display(fmt = "{}", _0)]
    Invalid(#[error(not(source))] String),
}

/// Build the server API handle from the global flags.
///
/// `--dry-run` short-circuits to the in-memory fake; otherwise the server
/// address and node credentials are all required.
pub(crate) fn build_guard(cli: &Cli) -> Result<Arc<dyn Guard>, CommandError> {
    if cli.dry_run {
        return Ok(Arc::new(FakeGuard));
    }

    let address = require_flag(&cli.address, "guard server address is required")?;
    let node_id = require_flag(&cli.node_id, "node ID is required")?;
    let node_secret = require_flag(&cli.node_secret, "node secret is required")?;

    Ok(Arc::new(HttpGuard::new(
        address,
        node_id.to_owned(),
        node_secret.to_owned(),
    )?))
}

/// Extract a required, non-empty flag value.
fn require_flag<'a>(
    value: &'a Option<String>,
    message: &str,
) -> Result<&'a str, CommandError> {
    value
        .as_deref()
        .filter(|value| !value.is_empty())
        .ok_or_else(|| CommandError::Invalid(message.to_owned()))
}

/// Load the managed sshd fragment the reconcilers take their paths from.
pub(crate) fn load_fragment(cli: &Cli) -> Result<SshdConfig, CommandError> {
    let path = cli.sshd_config_dir.join(&cli.file_name);

    SshdConfig::read(&path)?.ok_or_else(|| {
        CommandError::Invalid(format!(
            "sshd configuration fragment {} not found, run init-sshd-config first",
            path.display()
        ))
    })
}

/// Read a file, treating a missing file as empty content.
pub(crate) fn read_optional(path: &Path) -> io::Result<Vec<u8>> {
    match fs::read(path) {
        Ok(bytes) => Ok(bytes),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(err) => Err(err),
    }
}
