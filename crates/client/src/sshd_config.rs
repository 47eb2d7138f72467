use std::{fs, io, path::Path};

use derive_more::{Display, Error, From};

/// Comment block written at the top of the managed fragment.
const DEFAULT_COMMENT: &str = "# This file is used to configure the SSH server.\n\
# It should not be edited manually.\n\
# For more information, see sshd_config(5).\n";

/// Errors that may occur while reading or writing the fragment.
#[derive(Debug, Display, From, Error)]
pub(crate) enum SshdConfigError {
    /// IO-related error.
    Io(io::Error),

    /// A non-comment line does not have the `Option value` shape.
    #[display(fmt = "invalid configuration line: {}", _0)]
    #[from(ignore)]
    InvalidLine(#[error(not(source))] String),

    /// A line names an option this fragment never contains.
    #[display(fmt = "unknown configuration option: {}", _0)]
    #[from(ignore)]
    UnknownOption(#[error(not(source))] String),
}

/// Paths managed through the sshd configuration fragment (`guard.conf`).
///
/// `init-sshd-config` writes the fragment once; every other subcommand
/// reads its paths back from it, so sshd and the reconcilers always agree
/// on where the trust material lives.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct SshdConfig {
    /// `TrustedUserCAKeys` sshd directive value.
    pub trusted_user_ca_keys: String,

    /// `AuthorizedPrincipalsFile` sshd directive value.
    pub authorized_principals_file: String,

    /// `RevokedKeys` sshd directive value.
    pub revoked_keys: String,
}

impl SshdConfig {
    /// Read the fragment at `path`. A missing file yields `None`.
    pub(crate) fn read(path: &Path) -> Result<Option<Self>, SshdConfigError> {
        let body = match fs::read_to_string(path) {
            Ok(body) => body,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        Ok(Some(Self::parse(&body)?))
    }

    /// Parse a fragment body, skipping comments and blank lines.
    pub(crate) fn parse(body: &str) -> Result<Self, SshdConfigError> {
        let mut config = Self::default();

        for line in body.lines() {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut parts = line.split_whitespace();
            let (Some(option), Some(value)) = (parts.next(), parts.next()) else {
                return Err(SshdConfigError::InvalidLine(line.to_owned()));
            };

            match option {
                "TrustedUserCAKeys" => config.trusted_user_ca_keys = value.to_owned(),
                "AuthorizedPrincipalsFile" => config.authorized_principals_file = value.to_owned(),
                "RevokedKeys" => config.revoked_keys = value.to_owned(),
                _ => return Err(SshdConfigError::UnknownOption(option.to_owned())),
            }
        }

        Ok(config)
    }

    /// Render the managed fragment, comment block included.
    pub(crate) fn render(&self) -> String {
        format!(
            "{DEFAULT_COMMENT}TrustedUserCAKeys {}\nAuthorizedPrincipalsFile {}\nRevokedKeys {}\n",
            self.trusted_user_ca_keys, self.authorized_principals_file, self.revoked_keys,
        )
    }

    /// Write the fragment to `path`, replacing any previous content.
    pub(crate) fn write(&self, path: &Path) -> Result<(), SshdConfigError> {
        fs::write(path, self.render())?;
        Ok(())
    }

    /// `AuthorizedPrincipalsFile` with a per-user `%u` suffix removed.
    ///
    /// sshd substitutes the login account for `%u`; the reconciler manages
    /// the directory above it, one file per account.
    pub(crate) fn principals_dir(&self) -> &str {
        self.authorized_principals_file.trim_end_matches("%u")
    }
}
