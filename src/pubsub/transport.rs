//! Publish transport
//!
//! Wire types for `topics:publish` plus the transport seam the publisher
//! retries against. The real implementation signs requests with an
//! OAuth2 bearer token; tests substitute a scripted fake.

use super::auth::SCOPES;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;
use yup_oauth2::authenticator::DefaultAuthenticator;

/// Publish request body. The adapter sends one message per call.
#[derive(Debug, Clone, Serialize)]
pub struct PublishRequest {
    pub messages: Vec<PubsubMessage>,
}

/// One Pub/Sub message; `data` is the base64url payload and the only
/// attribute sent.
#[derive(Debug, Clone, Serialize)]
pub struct PubsubMessage {
    pub data: String,
}

/// Publish response: one server-assigned id per accepted message.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PublishResponse {
    #[serde(rename = "messageIds", default)]
    pub message_ids: Vec<String>,
}

/// Google error body: `{"error":{"code":..,"message":..,"status":..}}`
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorStatus,
}

#[derive(Debug, Deserialize)]
struct ErrorStatus {
    #[serde(default)]
    message: String,
}

/// Transport-level failures, split by how the publisher reacts to them
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Access token missing, expired, or unobtainable; refreshed and retried
    #[error("access token rejected: {0}")]
    AuthExpired(String),

    /// The request timed out; retried
    #[error("request timed out")]
    Timeout,

    /// Server answered with a non-retryable status
    #[error("server returned status {code}: {message}")]
    Status { code: u16, message: String },

    /// Any other transport failure, never retried
    #[error("request failed: {0}")]
    Request(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Seam between the retry loop and the network
#[async_trait]
pub trait PublishTransport: Send + Sync {
    /// Issue one publish call against the fully qualified topic path
    async fn publish(
        &self,
        topic: &str,
        request: &PublishRequest,
    ) -> Result<PublishResponse, TransportError>;

    /// Force-refresh the access token before a retry
    async fn refresh_token(&self) -> Result<(), TransportError>;
}

/// Real transport: reqwest + OAuth2 bearer tokens
pub struct HttpTransport {
    http: reqwest::Client,
    auth: DefaultAuthenticator,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(auth: DefaultAuthenticator, endpoint: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            auth,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }

    /// Cached access token; the authenticator fetches one when needed
    async fn bearer_token(&self) -> Result<String, TransportError> {
        let token = self
            .auth
            .token(SCOPES)
            .await
            .map_err(|e| TransportError::AuthExpired(e.to_string()))?;
        token
            .token()
            .map(str::to_owned)
            .ok_or_else(|| {
                TransportError::AuthExpired("token response carried no access token".to_string())
            })
    }
}

#[async_trait]
impl PublishTransport for HttpTransport {
    async fn publish(
        &self,
        topic: &str,
        request: &PublishRequest,
    ) -> Result<PublishResponse, TransportError> {
        let url = format!("{}/v1/{}:publish", self.endpoint, topic);
        let token = self.bearer_token().await?;

        debug!(%url, "sending publish request");
        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout
                } else {
                    TransportError::Request(Box::new(e))
                }
            })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(TransportError::AuthExpired(error_message(response).await));
        }
        if !status.is_success() {
            return Err(TransportError::Status {
                code: status.as_u16(),
                message: error_message(response).await,
            });
        }

        response
            .json()
            .await
            .map_err(|e| TransportError::Request(Box::new(e)))
    }

    async fn refresh_token(&self) -> Result<(), TransportError> {
        self.auth
            .force_refreshed_token(SCOPES)
            .await
            .map_err(|e| TransportError::AuthExpired(e.to_string()))?;
        Ok(())
    }
}

/// Pull the human-readable message out of a Google error body, falling
/// back to the raw text
async fn error_message(response: reqwest::Response) -> String {
    let raw = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorBody>(&raw) {
        Ok(body) if !body.error.message.is_empty() => body.error.message,
        _ => raw,
    }
}
