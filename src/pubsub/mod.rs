//! Google Cloud Pub/Sub integration
//!
//! Authenticates a client once at startup and publishes event payloads
//! to a topic over the REST API.

pub mod auth;
mod publisher;
mod transport;

pub use publisher::PubsubPublisher;
pub use transport::{
    HttpTransport, PublishRequest, PublishResponse, PublishTransport, PubsubMessage,
    TransportError,
};
