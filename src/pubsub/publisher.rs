//! Pub/Sub event publisher
//!
//! Wraps one publish call in the bounded retry loop: token refresh on
//! auth expiry, backoff on transport timeout, terminal otherwise.

use super::transport::{PublishRequest, PublishTransport, PubsubMessage, TransportError};
use crate::error::PubsubOutputError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Cap on the doubling timeout backoff
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Publisher for encoded event payloads
///
/// Holds the process-wide client handle. Token refresh is the only
/// mutation, and the host's single-concurrency contract means no publish
/// overlaps it.
pub struct PubsubPublisher {
    transport: Arc<dyn PublishTransport>,
    full_topic: String,
    max_retries: u32,
    retry_backoff: Duration,
    messages_published: AtomicU64,
    publish_failures: AtomicU64,
    token_refreshes: AtomicU64,
}

impl PubsubPublisher {
    pub fn new(
        transport: Arc<dyn PublishTransport>,
        full_topic: String,
        max_retries: u32,
        retry_backoff: Duration,
    ) -> Self {
        Self {
            transport,
            full_topic,
            max_retries,
            retry_backoff,
            messages_published: AtomicU64::new(0),
            publish_failures: AtomicU64::new(0),
            token_refreshes: AtomicU64::new(0),
        }
    }

    /// Fully qualified topic path
    pub fn full_topic(&self) -> &str {
        &self.full_topic
    }

    /// Get total messages published
    pub fn messages_published(&self) -> u64 {
        self.messages_published.load(Ordering::Relaxed)
    }

    /// Get total publish failures
    pub fn publish_failures(&self) -> u64 {
        self.publish_failures.load(Ordering::Relaxed)
    }

    /// Get total token refreshes performed before retries
    pub fn token_refreshes(&self) -> u64 {
        self.token_refreshes.load(Ordering::Relaxed)
    }

    /// Publish one encoded payload, retrying the two recognized transient
    /// conditions up to the configured cap. Returns the server-assigned
    /// message ids on success.
    pub async fn publish(&self, data: String) -> Result<Vec<String>, PubsubOutputError> {
        let request = PublishRequest {
            messages: vec![PubsubMessage { data }],
        };

        let mut attempts: u32 = 0;
        let mut backoff = self.retry_backoff;
        loop {
            attempts += 1;
            debug!(topic = %self.full_topic, attempts, "sending publish request");

            let err = match self.transport.publish(&self.full_topic, &request).await {
                Ok(response) => {
                    self.messages_published.fetch_add(1, Ordering::Relaxed);
                    return Ok(response.message_ids);
                }
                Err(e) => e,
            };

            match err {
                TransportError::AuthExpired(reason) if attempts <= self.max_retries => {
                    debug!(topic = %self.full_topic, reason, "access token rejected, refreshing");
                    if let Err(e) = self.transport.refresh_token().await {
                        self.publish_failures.fetch_add(1, Ordering::Relaxed);
                        return Err(PubsubOutputError::Auth(Box::new(e)));
                    }
                    self.token_refreshes.fetch_add(1, Ordering::Relaxed);
                    debug!(topic = %self.full_topic, "token refreshed, retrying request");
                }
                TransportError::Timeout if attempts <= self.max_retries => {
                    debug!(
                        topic = %self.full_topic,
                        backoff_ms = backoff.as_millis() as u64,
                        "request timed out, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(MAX_BACKOFF);
                }
                TransportError::Status { code, message } => {
                    self.publish_failures.fetch_add(1, Ordering::Relaxed);
                    return Err(PubsubOutputError::PublishFailed {
                        topic: self.full_topic.clone(),
                        status: code,
                        message,
                    });
                }
                TransportError::Request(source) => {
                    self.publish_failures.fetch_add(1, Ordering::Relaxed);
                    return Err(PubsubOutputError::Transport {
                        topic: self.full_topic.clone(),
                        source,
                    });
                }
                // AuthExpired or Timeout past the retry cap
                exhausted => {
                    self.publish_failures.fetch_add(1, Ordering::Relaxed);
                    warn!(topic = %self.full_topic, attempts, error = %exhausted, "retries exhausted");
                    return Err(PubsubOutputError::RetriesExhausted {
                        topic: self.full_topic.clone(),
                        attempts,
                        source: Box::new(exhausted),
                    });
                }
            }
        }
    }
}
