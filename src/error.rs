//! Domain error types for the Pub/Sub output adapter
//!
//! Structured thiserror types for navigable diagnostics and
//! compile-time exhaustive handling.
//!
//! All application code returns Result<T, PubsubOutputError>. Publish
//! failures are logged and swallowed at the `send` boundary; startup and
//! payload-construction failures propagate to the host.

use thiserror::Error;

/// Adapter errors
///
/// Every variant carries structured context fields so a failure can be
/// understood from the variant alone, without parsing message strings.
#[derive(Error, Debug)]
pub enum PubsubOutputError {
    /// Configuration error (setting missing or invalid)
    #[error("configuration error: {0}")]
    Config(String),

    /// Malformed or incomplete service-account key file.
    /// Fatal at startup; the adapter never becomes ready.
    #[error("invalid service-account key file '{path}': {reason}")]
    CredentialFormat { path: String, reason: String },

    /// Authentication failed outside the retryable token-expiry path
    #[error("authentication failed")]
    Auth(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Event serialization failed
    #[error("event serialization failed")]
    Serialization(#[source] serde_json::Error),

    /// The configured single payload field is absent from the event
    #[error("event is missing payload field '{field}'")]
    MissingField { field: String },

    /// Server rejected the publish request (never retried)
    #[error("publish to '{topic}' failed with status {status}: {message}")]
    PublishFailed {
        topic: String,
        status: u16,
        message: String,
    },

    /// Publish request failed below the HTTP layer (never retried)
    #[error("publish request to '{topic}' failed")]
    Transport {
        topic: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Transient-failure retries exhausted
    #[error("publish to '{topic}' gave up after {attempts} attempts")]
    RetriesExhausted {
        topic: String,
        attempts: u32,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// `send` called before `start` completed
    #[error("output not started")]
    NotStarted,
}
