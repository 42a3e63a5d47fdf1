//! Event payload construction
//!
//! Converts structured log events into base64url JSON payloads for
//! publishing.

mod filter;

pub use filter::{encode_payload, FieldRules, LogEvent};
