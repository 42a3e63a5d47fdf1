//! Adapter configuration
//!
//! Handles validating host-supplied settings and loading them from
//! environment variables.

use crate::error::PubsubOutputError;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Default Pub/Sub REST endpoint
pub const DEFAULT_ENDPOINT: &str = "https://pubsub.googleapis.com";

/// Default retry cap, shared by both transient conditions
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Default initial backoff for timeout retries (doubled per retry)
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// Pub/Sub output configuration
///
/// Immutable once the adapter is constructed. The topic must already
/// exist; the adapter performs no topic management.
#[derive(Debug, Clone)]
pub struct PubsubConfig {
    /// Google Cloud project id (name, not number)
    pub project_id: String,

    /// Pub/Sub topic name
    pub topic: String,

    /// Fields removed from the payload before inclusion filtering.
    /// Exclusion takes precedence over inclusion.
    pub exclude_fields: Vec<String>,

    /// If non-empty, only these fields (post-exclusion) are kept
    pub include_fields: Vec<String>,

    /// If set, the payload is this single field's value and both lists
    /// above are ignored
    pub include_field: Option<String>,

    /// Service-account JSON key file. When unset, Application Default
    /// Credentials are used (e.g. the GCE metadata service).
    /// Relative paths are resolved against the working directory at
    /// startup; `~` is not expanded.
    pub json_key_file: Option<PathBuf>,

    /// REST endpoint base URL, overridable for emulators and tests
    pub endpoint: String,

    /// Retries allowed per publish beyond the first attempt
    pub max_retries: u32,

    /// Initial backoff before a timeout retry
    pub retry_backoff: Duration,
}

impl PubsubConfig {
    /// Create a configuration with defaults for everything optional
    pub fn new(project_id: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            topic: topic.into(),
            exclude_fields: Vec::new(),
            include_fields: Vec::new(),
            include_field: None,
            json_key_file: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, PubsubOutputError> {
        dotenvy::dotenv().ok();

        let project_id = env::var("PUBSUB_PROJECT_ID")
            .map_err(|_| PubsubOutputError::Config("PUBSUB_PROJECT_ID must be set".to_string()))?;

        let topic = env::var("PUBSUB_TOPIC")
            .map_err(|_| PubsubOutputError::Config("PUBSUB_TOPIC must be set".to_string()))?;

        let exclude_fields = env::var("PUBSUB_EXCLUDE_FIELDS")
            .map(|v| parse_field_list(&v))
            .unwrap_or_default();

        let include_fields = env::var("PUBSUB_INCLUDE_FIELDS")
            .map(|v| parse_field_list(&v))
            .unwrap_or_default();

        let include_field = env::var("PUBSUB_INCLUDE_FIELD")
            .ok()
            .filter(|v| !v.trim().is_empty());

        let json_key_file = env::var("PUBSUB_JSON_KEY_FILE")
            .or_else(|_| env::var("GOOGLE_APPLICATION_CREDENTIALS"))
            .ok()
            .map(PathBuf::from);

        let endpoint =
            env::var("PUBSUB_ENDPOINT").unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string());

        let max_retries = env::var("PUBSUB_MAX_RETRIES")
            .unwrap_or_else(|_| DEFAULT_MAX_RETRIES.to_string())
            .parse()
            .map_err(|e| {
                PubsubOutputError::Config(format!("PUBSUB_MAX_RETRIES must be a valid number: {e}"))
            })?;

        let retry_backoff_ms: u64 = env::var("PUBSUB_RETRY_BACKOFF_MS")
            .unwrap_or_else(|_| DEFAULT_RETRY_BACKOFF.as_millis().to_string())
            .parse()
            .map_err(|e| {
                PubsubOutputError::Config(format!(
                    "PUBSUB_RETRY_BACKOFF_MS must be a valid number: {e}"
                ))
            })?;

        let config = Self {
            project_id,
            topic,
            exclude_fields,
            include_fields,
            include_field,
            json_key_file,
            endpoint,
            max_retries,
            retry_backoff: Duration::from_millis(retry_backoff_ms),
        };
        config.validate()?;
        Ok(config)
    }

    /// Check required settings
    pub fn validate(&self) -> Result<(), PubsubOutputError> {
        if self.project_id.trim().is_empty() {
            return Err(PubsubOutputError::Config(
                "project_id must not be empty".to_string(),
            ));
        }
        if self.topic.trim().is_empty() {
            return Err(PubsubOutputError::Config(
                "topic must not be empty".to_string(),
            ));
        }
        if self.endpoint.trim().is_empty() {
            return Err(PubsubOutputError::Config(
                "endpoint must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Fully qualified topic path used in publish requests
    pub fn full_topic(&self) -> String {
        format!("projects/{}/topics/{}", self.project_id, self.topic)
    }
}

/// Parse a comma-separated field list, dropping empty entries
fn parse_field_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
