use async_trait::async_trait;
use common::signature::simple_signature;
use derive_more::{Display, Error, From};
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};

/// Request header carrying the caller-chosen unix-seconds timestamp.
pub(crate) const TIMESTAMP_HEADER: &str = "X-Timestamp";

/// Header carrying the timestamp signature on requests
/// and the body signature on responses.
pub(crate) const SIGNATURE_HEADER: &str = "X-Signature";

/// Principals of one local account, as served by the server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Principals {
    /// Local account name the principals may assume.
    pub role: String,

    /// Principal (email) list for the account.
    pub principals: Vec<String>,
}

/// Errors that may occur while polling the server.
#[derive(Debug, Display, From, Error)]
pub(crate) enum GuardApiError {
    /// Transport-level failure.
    Http(reqwest::Error),

    /// Malformed server address.
    Url(url::ParseError),

    /// Server answered with a non-200 status.
    #[display(fmt = "unexpected status code: {}", _0)]
    UnexpectedStatus(#[error(not(source))] StatusCode),

    /// Response signature missing or not matching the body.
    #[display(fmt = "response signature is invalid")]
    InvalidSignature,

    /// Malformed response payload.
    Json(serde_json::Error),
}

/// Server polling API.
///
/// Every method corresponds to one guarded server endpoint. The trait
/// exists so `--dry-run` can swap in [`FakeGuard`] without touching the
/// reconcilers.
#[async_trait]
pub(crate) trait Guard: Send + Sync {
    /// Fetch the CA public key text.
    async fn get_ca(&self) -> Result<String, GuardApiError>;

    /// Fetch the per-account principals groups.
    async fn get_principals(&self) -> Result<Vec<Principals>, GuardApiError>;

    /// Fetch the base64-encoded key revocation list; empty when none.
    async fn get_krl(&self) -> Result<String, GuardApiError>;

    /// Fetch the authorized public key lines.
    async fn get_authorized_keys(&self) -> Result<Vec<String>, GuardApiError>;
}

/// HTTP implementation of [`Guard`].
pub(crate) struct HttpGuard {
    /// Server base address.
    target: Url,

    /// Node unique identifier, sent as the `nodeID` query parameter.
    node_id: String,

    /// Node shared secret for request signing and response verification.
    node_secret: String,

    /// Shared HTTP client.
    client: Client,
}

impl HttpGuard {
    /// Create a new HTTP guard pointing at `address`.
    pub(crate) fn new(
        address: &str,
        node_id: String,
        node_secret: String,
    ) -> Result<Self, GuardApiError> {
        Ok(Self {
            target: Url::parse(address)?,
            node_id,
            node_secret,
            client: Client::new(),
        })
    }

    /// Issue a signed GET request and return the verified response body.
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, GuardApiError> {
        let mut url = self.target.clone();
        url.set_path(path);
        url.set_query(Some(&format!("nodeID={}", self.node_id)));

        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = simple_signature(timestamp.as_bytes(), self.node_secret.as_bytes());

        let response = self
            .client
            .get(url)
            .header(TIMESTAMP_HEADER, &timestamp)
            .header(SIGNATURE_HEADER, &signature)
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Err(GuardApiError::UnexpectedStatus(response.status()));
        }

        let response_signature = response
            .headers()
            .get(SIGNATURE_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned)
            .ok_or(GuardApiError::InvalidSignature)?;

        let body = response.bytes().await?;

        if simple_signature(&body, self.node_secret.as_bytes()) != response_signature {
            return Err(GuardApiError::InvalidSignature);
        }

        Ok(body.to_vec())
    }
}

#[async_trait]
impl Guard for HttpGuard {
    async fn get_ca(&self) -> Result<String, GuardApiError> {
        let body = self.fetch("/api/v1/guard/ca").await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn get_principals(&self) -> Result<Vec<Principals>, GuardApiError> {
        let body = self.fetch("/api/v1/guard/principals").await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn get_krl(&self) -> Result<String, GuardApiError> {
        let body = self.fetch("/api/v1/guard/krl").await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn get_authorized_keys(&self) -> Result<Vec<String>, GuardApiError> {
        let body = self.fetch("/api/v1/guard/authorized-keys").await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

/// In-memory stand-in for the server, selected with `--dry-run`.
pub(crate) struct FakeGuard;

#[async_trait]
impl Guard for FakeGuard {
    async fn get_ca(&self) -> Result<String, GuardApiError> {
        Ok(String::from("fake-ca"))
    }

    async fn get_principals(&self) -> Result<Vec<Principals>, GuardApiError> {
        Ok(vec![
            Principals {
                role: String::from("fake-role"),
                principals: vec![String::from("fake-principal"), String::from("fake")],
            },
            Principals {
                role: String::from("fake-role1"),
                principals: vec![String::from("fake-principal1")],
            },
        ])
    }

    async fn get_krl(&self) -> Result<String, GuardApiError> {
        Ok(String::new())
    }

    async fn get_authorized_keys(&self) -> Result<Vec<String>, GuardApiError> {
        Ok(vec![
            String::from("fake-authorized-key"),
            String::from("fake-authorized"),
        ])
    }
}
