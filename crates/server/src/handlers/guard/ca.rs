use std::sync::Arc;

use axum::{Extension, Json};

use crate::certificate::CertificateAuthority;

/// CA public key handler.
///
/// Served from the copy read at startup; hosts write the value verbatim
/// into their `TrustedUserCAKeys` file.
pub(super) async fn ca(
    Extension(certificate_authority): Extension<Arc<CertificateAuthority>>,
) -> Json<String> {
    Json(String::from_utf8_lossy(certificate_authority.public_key()).into_owned())
}
