use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use db::{
    user, user_cert, ActiveValue, DatabaseConnection, EntityTrait, TransactionErrorExt,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::info;

use crate::{certificate::CertificateAuthority, error::ApiError};

/// Certificate grant request.
#[derive(Deserialize)]
pub(super) struct GrantCertRequest {
    /// Certificate lifetime in seconds.
    effect: i64,

    /// Validity window start, unix seconds. Zero means "now".
    #[serde(default)]
    start_date: i64,
}

/// Certificate grant response.
#[derive(Serialize)]
pub(super) struct GrantCertResponse {
    /// Signed certificate in OpenSSH authorized-key format.
    cert: String,
}

/// Certificate grant handler.
///
/// The certificate row is inserted first so its id can serve as the
/// certificate serial; the signed blob is stored back on the same row
/// within the transaction, so a signing failure leaves no half-issued
/// certificate behind. `expires_at` records the absolute end of the
/// validity window.
pub(super) async fn grant(
    State(db): State<Arc<DatabaseConnection>>,
    Extension(certificate_authority): Extension<Arc<CertificateAuthority>>,
    Path(user_id): Path<i64>,
    Json(request): Json<GrantCertRequest>,
) -> Result<Json<GrantCertResponse>, ApiError> {
    if request.effect <= 0 {
        return Err(ApiError::InvalidParameter("effect must be positive"));
    }

    db.transaction(|txn| {
        Box::pin(async move {
            let user = user::Entity::find_by_id(user_id)
                .one(txn)
                .await?
                .ok_or(ApiError::UserNotFound)?;

            if user.banned {
                return Err(ApiError::UserBanned);
            }

            let start = if request.start_date == 0 {
                OffsetDateTime::now_utc().unix_timestamp()
            } else {
                request.start_date
            };
            let end = start + request.effect;

            let cert_row = user_cert::Entity::insert(user_cert::ActiveModel {
                user_id: ActiveValue::Set(user.id),
                cert: ActiveValue::Set(String::new()),
                expires_at: ActiveValue::Set(end),
                is_revoked: ActiveValue::Set(false),
                created_at: ActiveValue::Set(db::current_timestamp()),
                updated_at: ActiveValue::Set(db::current_timestamp()),
                ..Default::default()
            })
            .exec_with_returning(txn)
            .await?;

            let blob = certificate_authority.sign_certificate(
                &user.pub_key,
                cert_row.id as u64,
                &user.email,
                &user.email,
                start as u64,
                end as u64,
            )?;

            let mut active: user_cert::ActiveModel = cert_row.into();
            active.cert = ActiveValue::Set(blob.clone());
            active.updated_at = ActiveValue::Set(db::current_timestamp());
            db::ActiveModelTrait::update(active, txn).await?;

            info!(email = %user.email, "certificate granted");

            Ok(Json(GrantCertResponse { cert: blob }))
        })
    })
    .await
    .into_raw_result()
}
