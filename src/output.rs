//! Adapter lifecycle
//!
//! Host-facing facade: `new` validates configuration, `start`
//! authenticates and wires the transport, `send` handles one event end
//! to end, `stop` tears down. The host contract is single-concurrency:
//! one event is in flight at a time, including its retries.

use crate::config::PubsubConfig;
use crate::error::PubsubOutputError;
use crate::events::{encode_payload, FieldRules, LogEvent};
use crate::pubsub::{auth, HttpTransport, PublishTransport, PubsubPublisher};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Pub/Sub output adapter
pub struct PubsubOutput {
    config: PubsubConfig,
    rules: FieldRules,
    full_topic: String,
    publisher: Option<PubsubPublisher>,
}

impl PubsubOutput {
    /// Create the adapter from a configuration. Validates settings and
    /// derives the field rules and topic path; no I/O happens until
    /// `start`.
    pub fn new(config: PubsubConfig) -> Result<Self, PubsubOutputError> {
        config.validate()?;
        let rules = FieldRules::new(
            config.exclude_fields.clone(),
            config.include_fields.clone(),
            config.include_field.clone(),
        );
        let full_topic = config.full_topic();
        Ok(Self {
            config,
            rules,
            full_topic,
            publisher: None,
        })
    }

    /// Authenticate and build the publish client.
    ///
    /// Must fully succeed before the host sends any event; a failure
    /// here (notably a malformed key file) aborts startup and no publish
    /// is ever attempted.
    pub async fn start(&mut self) -> Result<(), PubsubOutputError> {
        info!(
            project_id = %self.config.project_id,
            topic = %self.full_topic,
            "starting Pub/Sub output"
        );

        let authenticator = match &self.config.json_key_file {
            Some(path) => {
                debug!(path = %path.display(), "authorizing with service-account key file");
                auth::service_account_authenticator(path).await?
            }
            None => {
                debug!("authorizing with application default credentials");
                auth::default_authenticator().await?
            }
        };

        let transport = Arc::new(HttpTransport::new(
            authenticator,
            self.config.endpoint.clone(),
        ));
        self.start_with_transport(transport);
        Ok(())
    }

    /// Wire the adapter onto a caller-supplied transport, bypassing real
    /// credentials. Lets tests and emulator setups drive the full send
    /// path.
    pub fn start_with_transport(&mut self, transport: Arc<dyn PublishTransport>) {
        self.publisher = Some(PubsubPublisher::new(
            transport,
            self.full_topic.clone(),
            self.config.max_retries,
            self.config.retry_backoff,
        ));
        info!(topic = %self.full_topic, "Pub/Sub output ready");
    }

    /// Whether `start` has completed
    pub fn is_started(&self) -> bool {
        self.publisher.is_some()
    }

    /// Publish counters, when started
    pub fn publisher(&self) -> Option<&PubsubPublisher> {
        self.publisher.as_ref()
    }

    /// Handle one event: build the payload, publish, log the outcome.
    ///
    /// Publish failures are logged with the event's message content, the
    /// topic, the status, and the server's error message, then the event
    /// is dropped; they never propagate. Payload-construction failures
    /// propagate after being logged, since the event cannot be
    /// represented at all.
    pub async fn send(&self, event: &LogEvent) -> Result<(), PubsubOutputError> {
        let publisher = self.publisher.as_ref().ok_or(PubsubOutputError::NotStarted)?;

        let data = match encode_payload(event, &self.rules) {
            Ok(data) => data,
            Err(e) => {
                error!(topic = %self.full_topic, error = %e, "failed to build event payload");
                return Err(e);
            }
        };

        match publisher.publish(data).await {
            Ok(message_ids) => {
                info!(
                    topic = %self.full_topic,
                    ?message_ids,
                    "message published"
                );
            }
            Err(e) => {
                error!(
                    topic = %self.full_topic,
                    message = %message_field(event),
                    error = %e,
                    "error publishing message"
                );
            }
        }
        Ok(())
    }

    /// Tear down the publish client and log totals
    pub async fn stop(&mut self) {
        if let Some(publisher) = self.publisher.take() {
            info!(
                topic = %self.full_topic,
                published = publisher.messages_published(),
                failures = publisher.publish_failures(),
                "Pub/Sub output stopped"
            );
        }
    }
}

/// The event's `message` field content, for failure logs
fn message_field(event: &LogEvent) -> String {
    match event.get("message") {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}
