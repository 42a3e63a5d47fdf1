//! Pub/Sub output adapter for structured log events
//!
//! Publishes log events one at a time to a Google Cloud Pub/Sub topic:
//! - Builds a base64url JSON payload per configured field rules
//! - Authenticates once at startup (service-account key file or
//!   Application Default Credentials)
//! - Publishes over the REST API with bounded retry for token expiry
//!   and transport timeouts
//! - Logs every outcome; publish failures drop the event and never
//!   reach the host
//!
//! The host pipeline drives the adapter through `new` / `start` / `send`
//! / `stop` and guarantees single-concurrency: one event (including its
//! retries) is in flight at a time.

pub mod config;
pub mod error;
pub mod events;
pub mod output;
pub mod pubsub;

pub use config::PubsubConfig;
pub use error::PubsubOutputError;
pub use events::{encode_payload, FieldRules, LogEvent};
pub use output::PubsubOutput;
pub use pubsub::{
    HttpTransport, PublishRequest, PublishResponse, PublishTransport, PubsubMessage,
    PubsubPublisher, TransportError,
};
