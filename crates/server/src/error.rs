use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use db::DbErr;
use derive_more::{Display, Error, From};
use serde_json::json;
use tracing::error;

use crate::certificate::CertificateError;

/// Errors surfaced on the API boundary.
///
/// Every variant except the opaque internal ones maps to a stable business
/// code that polled hosts and the web console rely on, serialized as
/// `{"code": N, "message": "…"}`. Internal failures are logged with their
/// context and collapse to a bare 500 so no store or signer detail leaks.
#[derive(Debug, Display, Error, From)]
pub(crate) enum ApiError {
    /// Database-related error.
    Database(DbErr),

    /// Certificate signing or revocation failure.
    Certificate(CertificateError),

    /// Response body could not be buffered for signing.
    #[display(fmt = "unable to sign response body")]
    ResponseSigning,

    #[display(fmt = "space not found")]
    SpaceNotFound,

    #[display(fmt = "node not found")]
    NodeNotFound,

    #[display(fmt = "role not found")]
    RoleNotFound,

    #[display(fmt = "user not found")]
    UserNotFound,

    #[display(fmt = "space name already exists")]
    SpaceNameAlreadyExists,

    #[display(fmt = "user is banned")]
    UserBanned,

    #[display(fmt = "user already exists")]
    UserAlreadyExists,

    #[display(fmt = "principals not found")]
    PrincipalsNotFound,

    #[display(fmt = "signature is invalid")]
    InvalidSignature,

    /// Request validation failure with a caller-facing message.
    #[display(fmt = "{}", _0)]
    InvalidParameter(#[error(not(source))] &'static str),
}

impl ApiError {
    /// Stable business code carried in the response body.
    fn business_code(&self) -> u32 {
        match self {
            ApiError::SpaceNotFound => 100001,
            ApiError::NodeNotFound => 100002,
            ApiError::RoleNotFound => 100003,
            ApiError::UserNotFound => 100004,
            ApiError::SpaceNameAlreadyExists => 100005,
            ApiError::UserBanned => 100006,
            ApiError::UserAlreadyExists => 100007,
            ApiError::PrincipalsNotFound => 100008,
            ApiError::InvalidSignature => 403,
            _ => 400,
        }
    }

    /// HTTP status the business code is delivered under.
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::SpaceNotFound
            | ApiError::NodeNotFound
            | ApiError::RoleNotFound
            | ApiError::UserNotFound
            | ApiError::PrincipalsNotFound => StatusCode::NOT_FOUND,
            ApiError::UserBanned | ApiError::InvalidSignature => StatusCode::FORBIDDEN,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Database(err) => {
                error!(%err, "store failure");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
            ApiError::Certificate(err) => {
                error!(%err, "certificate failure");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
            ApiError::ResponseSigning => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
            err => (
                err.status_code(),
                Json(json!({
                    "code": err.business_code(),
                    "message": err.to_string(),
                })),
            )
                .into_response(),
        }
    }
}
