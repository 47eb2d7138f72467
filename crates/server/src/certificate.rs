//! # Certificate authority
//!
//! Signs SSH user certificates with the CA private key and produces key
//! revocation lists over certificate serials.
//!
//! Certificate signing is done natively with [`ssh_key`]. KRL emission is
//! not: the binary format hosts consume is whatever `ssh-keygen` writes, so
//! the revocation path shells out to `ssh-keygen -k` inside a throwaway
//! working directory and returns the bytes it produced.

use std::process::Stdio;

use derive_more::{Display, Error, From};
use ssh_key::{
    certificate::{Builder as CertificateBuilder, CertType},
    rand_core::OsRng,
    PrivateKey, PublicKey,
};
use tokio::process::Command;
use tracing::debug;

/// Certificate extensions set on every issued user certificate,
/// all empty-valued. No critical options are ever set.
const EXTENSIONS: [&str; 5] = [
    "permit-X11-forwarding",
    "permit-agent-forwarding",
    "permit-port-forwarding",
    "permit-pty",
    "permit-user-rc",
];

/// File inside the KRL working directory that receives the generated KRL.
const REVOKED_KEYS_FILE: &str = "revoked-keys";

/// File inside the KRL working directory holding the CA public key.
const CA_KEY_FILE: &str = "ca.pub";

/// File inside the KRL working directory listing the serials to revoke.
const REVOKE_LIST_FILE: &str = "list-to-revoke";

/// Errors that may occur during certificate signing or revocation.
#[derive(Debug, Display, From, Error)]
pub(crate) enum CertificateError {
    /// IO failure while preparing the KRL working directory.
    Io(std::io::Error),

    /// User public key could not be parsed as an OpenSSH authorized key line.
    #[display(fmt = "unable to parse user public key: {}", _0)]
    #[from(ignore)]
    MalformedPublicKey(ssh_key::Error),

    /// CA private key could not be parsed.
    #[display(fmt = "unable to parse CA private key: {}", _0)]
    #[from(ignore)]
    MalformedPrivateKey(ssh_key::Error),

    /// CA private key could not be decrypted with the current passphrase.
    #[display(fmt = "unable to decrypt CA private key: {}", _0)]
    #[from(ignore)]
    InvalidPassphrase(ssh_key::Error),

    /// Certificate construction or signing failure.
    #[display(fmt = "unable to sign certificate: {}", _0)]
    #[from(ignore)]
    Signing(ssh_key::Error),

    /// `ssh-keygen` exited unsuccessfully.
    #[display(fmt = "ssh-keygen failed: {}", output)]
    #[from(ignore)]
    KeygenFailed {
        /// Combined stdout and stderr of the failed invocation.
        #[error(not(source))]
        output: String,
    },
}

/// SSH certificate authority state.
///
/// The key material is read once at startup and shared read-only across
/// requests. The passphrase is resolved through a provider on every signing
/// call, so rotating it does not require a restart.
pub(crate) struct CertificateAuthority {
    private_key: Vec<u8>,
    public_key: Vec<u8>,
    passphrase: Box<dyn Fn() -> String + Send + Sync>,
}

impl CertificateAuthority {
    pub(crate) fn new(
        private_key: Vec<u8>,
        public_key: Vec<u8>,
        passphrase: impl Fn() -> String + Send + Sync + 'static,
    ) -> Self {
        Self {
            private_key,
            public_key,
            passphrase: Box::new(passphrase),
        }
    }

    /// CA public key exactly as served to hosts.
    pub(crate) fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    /// Sign an SSH user certificate over `user_public_key`.
    ///
    /// The certificate carries the given serial, key id and a single valid
    /// principal (both the user's email in practice), the caller-supplied
    /// unix-seconds validity window and the fixed extension set. Returns the
    /// OpenSSH authorized-key formatted blob, trailing newline included.
    pub(crate) fn sign_certificate(
        &self,
        user_public_key: &str,
        serial: u64,
        key_id: &str,
        principal: &str,
        valid_after: u64,
        valid_before: u64,
    ) -> Result<String, CertificateError> {
        let public_key = PublicKey::from_openssh(user_public_key)
            .map_err(CertificateError::MalformedPublicKey)?;

        let encrypted = PrivateKey::from_openssh(&self.private_key)
            .map_err(CertificateError::MalformedPrivateKey)?;
        let ca_key = encrypted
            .decrypt((self.passphrase)().as_bytes())
            .map_err(CertificateError::InvalidPassphrase)?;

        let mut builder =
            CertificateBuilder::new_with_random_nonce(&mut OsRng, &public_key, valid_after, valid_before)
                .map_err(CertificateError::Signing)?;

        builder.serial(serial).map_err(CertificateError::Signing)?;
        builder.key_id(key_id).map_err(CertificateError::Signing)?;
        builder
            .cert_type(CertType::User)
            .map_err(CertificateError::Signing)?;
        builder
            .valid_principal(principal)
            .map_err(CertificateError::Signing)?;

        for extension in EXTENSIONS {
            builder
                .extension(extension, "")
                .map_err(CertificateError::Signing)?;
        }

        let certificate = builder.sign(&ca_key).map_err(CertificateError::Signing)?;
        let mut blob = certificate.to_openssh().map_err(CertificateError::Signing)?;
        blob.push('\n');

        Ok(blob)
    }

    /// Produce an OpenSSH KRL over the given certificate serials.
    ///
    /// `ssh-keygen -k -f revoked-keys -s ca.pub list-to-revoke` runs inside
    /// a unique `guard_`-prefixed temporary directory which is removed when
    /// this function returns. The caller is responsible for base64-encoding
    /// the bytes for wire transport.
    pub(crate) async fn revoke_certificates(
        &self,
        serials: &[i64],
    ) -> Result<Vec<u8>, CertificateError> {
        let workdir = tempfile::Builder::new().prefix("guard_").tempdir()?;

        let mut revoke_list = String::new();
        for serial in serials {
            revoke_list.push_str(&format!("serial: {serial}\n"));
        }

        tokio::fs::write(workdir.path().join(REVOKE_LIST_FILE), revoke_list).await?;
        tokio::fs::write(workdir.path().join(CA_KEY_FILE), &self.public_key).await?;

        debug!(serials = serials.len(), "generating revocation list");

        let output = Command::new("ssh-keygen")
            .current_dir(workdir.path())
            .args(["-k", "-f", REVOKED_KEYS_FILE, "-s", CA_KEY_FILE, REVOKE_LIST_FILE])
            .stdin(Stdio::null())
            .output()
            .await?;

        if !output.status.success() {
            return Err(CertificateError::KeygenFailed {
                output: format!(
                    "{}{}",
                    String::from_utf8_lossy(&output.stdout),
                    String::from_utf8_lossy(&output.stderr)
                ),
            });
        }

        Ok(tokio::fs::read(workdir.path().join(REVOKED_KEYS_FILE)).await?)
    }
}
