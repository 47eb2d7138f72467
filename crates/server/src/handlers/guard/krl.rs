use std::sync::Arc;

use axum::{extract::State, Extension, Json};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use db::{user_cert, DatabaseConnection};
use time::OffsetDateTime;

use crate::{auth::AuthenticatedNode, certificate::CertificateAuthority, error::ApiError};

/// Key revocation list handler.
///
/// Collects the revoked, already-expired serials reachable from the node
/// and hands them to the certificate authority. An empty serial set yields
/// an empty string, which hosts read as "no KRL".
pub(super) async fn krl(
    State(db): State<Arc<DatabaseConnection>>,
    Extension(node): Extension<AuthenticatedNode>,
    Extension(certificate_authority): Extension<Arc<CertificateAuthority>>,
) -> Result<Json<String>, ApiError> {
    let now = OffsetDateTime::now_utc().unix_timestamp();
    let serials = user_cert::revoked_serials_by_node_id(&*db, node.id, now).await?;

    if serials.is_empty() {
        return Ok(Json(String::new()));
    }

    let krl = certificate_authority.revoke_certificates(&serials).await?;

    Ok(Json(STANDARD.encode(krl)))
}
