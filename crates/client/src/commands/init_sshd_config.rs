use tracing::info;

use crate::sshd_config::SshdConfig;

use super::{Cli, CommandError, InitSshdConfig};

/// Entry point for the `init-sshd-config` subcommand.
///
/// Writes the managed fragment the other subcommands (and sshd itself)
/// read their paths from. Safe to re-run; the fragment is replaced whole.
pub(crate) fn run(cli: &Cli, args: &InitSshdConfig) -> Result<(), CommandError> {
    let config = SshdConfig {
        trusted_user_ca_keys: args.ca_pub_file.clone(),
        authorized_principals_file: args.auth_principals_file.clone(),
        revoked_keys: args.revoked_keys.clone(),
    };

    let path = cli.sshd_config_dir.join(&cli.file_name);
    config.write(&path)?;

    info!(
        path = %path.display(),
        trusted_user_ca_keys = %config.trusted_user_ca_keys,
        authorized_principals_file = %config.authorized_principals_file,
        revoked_keys = %config.revoked_keys,
        "sshd configuration fragment written"
    );

    Ok(())
}
