use std::sync::Arc;

use axum::{
    body::{boxed, Full},
    extract::{Query, State},
    http::{header::HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use common::signature::simple_signature;
use db::{node, sea_query::Expr, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::Deserialize;
use time::OffsetDateTime;
use tracing::debug;

use crate::error::ApiError;

/// Request header carrying the caller-chosen unix-seconds timestamp.
pub(crate) const TIMESTAMP_HEADER: &str = "X-Timestamp";

/// Header carrying the timestamp signature on requests
/// and the body signature on responses.
pub(crate) const SIGNATURE_HEADER: &str = "X-Signature";

/// Identity of the node whose signature authenticated the current request.
///
/// The secret is fetched fresh from the store on every request, so a
/// rotated secret takes effect on the next poll without any cache to flush.
#[derive(Clone)]
pub(crate) struct AuthenticatedNode {
    /// Numeric node identifier.
    pub id: i64,

    /// Shared secret used to sign the response body.
    pub secret: String,
}

/// Query string deserialization struct for the node identifier.
#[derive(Deserialize)]
pub(super) struct NodeQuery {
    /// Node unique identifier (not the numeric id).
    #[serde(default, rename = "nodeID")]
    node_id: Option<String>,
}

/// Node authentication middleware for [`axum`].
///
/// Verifies that the caller holds the secret registered for the node named
/// by the `nodeID` query parameter: `X-Signature` must equal
/// `simple_signature(X-Timestamp, secret)`, compared case-sensitively.
/// On success the handler runs with an [`AuthenticatedNode`] extension, the
/// response body is signed into the `X-Signature` response header, and the
/// node's `last_heartbeat` is bumped before the response is returned.
pub(super) async fn require_node_signature<B>(
    State(db): State<Arc<DatabaseConnection>>,
    Query(query): Query<NodeQuery>,
    mut req: Request<B>,
    next: Next<B>,
) -> Result<Response, ApiError> {
    let node_id = query
        .node_id
        .as_deref()
        .filter(|value| !value.is_empty())
        .ok_or(ApiError::InvalidParameter("node id is required"))?;

    let timestamp = required_header(&req, TIMESTAMP_HEADER, "timestamp is required")?;
    let signature = required_header(&req, SIGNATURE_HEADER, "signature is required")?;

    let node = node::Entity::find()
        .filter(node::Column::UniqueId.eq(node_id))
        .one(&*db)
        .await?
        .ok_or(ApiError::NodeNotFound)?;

    let expected = simple_signature(timestamp.as_bytes(), node.secret.as_bytes());
    if expected != signature {
        debug!(node_id, "signature mismatch");
        return Err(ApiError::InvalidSignature);
    }

    req.extensions_mut().insert(AuthenticatedNode {
        id: node.id,
        secret: node.secret.clone(),
    });

    let response = next.run(req).await;
    let response = sign_response(response, &node.secret).await?;

    node::Entity::update_many()
        .col_expr(
            node::Column::LastHeartbeat,
            Expr::value(OffsetDateTime::now_utc().unix_timestamp()),
        )
        .filter(node::Column::Id.eq(node.id))
        .exec(&*db)
        .await?;

    Ok(response)
}

/// Read a non-empty request header, rejecting the request otherwise.
fn required_header<B>(
    req: &Request<B>,
    name: &str,
    message: &'static str,
) -> Result<String, ApiError> {
    req.headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
        .ok_or(ApiError::InvalidParameter(message))
}

/// Buffer the response body and stamp its signature header.
///
/// Headers are flushed together with the first body byte by the underlying
/// transport, so the body must be fully buffered before the signature
/// header can be set.
async fn sign_response(response: Response, secret: &str) -> Result<Response, ApiError> {
    let (mut parts, body) = response.into_parts();

    let bytes = hyper::body::to_bytes(body)
        .await
        .map_err(|_| ApiError::ResponseSigning)?;

    let signature = simple_signature(&bytes, secret.as_bytes());
    parts.headers.insert(
        HeaderName::from_static("x-signature"),
        HeaderValue::from_str(&signature).map_err(|_| ApiError::ResponseSigning)?,
    );

    Ok(Response::from_parts(parts, boxed(Full::from(bytes))))
}
