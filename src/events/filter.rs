//! Field filtering and payload encoding
//!
//! Pure functions with no network or client state, so the selection
//! rules are testable in isolation.

use crate::error::PubsubOutputError;
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine as _;
use serde_json::{Map, Value};

/// A structured log event: named fields with arbitrary JSON values.
///
/// The adapter reads events, never mutates the caller's copy. The map is
/// BTreeMap-backed, so serialization orders keys and equal mappings
/// always encode to byte-identical payloads.
pub type LogEvent = Map<String, Value>;

/// Active field-selection rules, derived once from the configuration.
///
/// Exactly one mode applies per event: single-field extraction when
/// `single` is set, list-based filtering otherwise. Exclusion runs
/// before inclusion, so a name in both lists never survives.
#[derive(Debug, Clone, Default)]
pub struct FieldRules {
    exclude: Vec<String>,
    include: Vec<String>,
    single: Option<String>,
}

impl FieldRules {
    pub fn new(exclude: Vec<String>, include: Vec<String>, single: Option<String>) -> Self {
        // An empty single-field name means unset
        let single = single.filter(|f| !f.trim().is_empty());
        Self {
            exclude,
            include,
            single,
        }
    }
}

/// Build the base64url message payload for one event.
///
/// In single-field mode a string value is sent verbatim and any other
/// value as its compact JSON text; a missing field is a per-event error.
pub fn encode_payload(event: &LogEvent, rules: &FieldRules) -> Result<String, PubsubOutputError> {
    if let Some(field) = &rules.single {
        let value = event
            .get(field)
            .ok_or_else(|| PubsubOutputError::MissingField {
                field: field.clone(),
            })?;
        let text = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        return Ok(URL_SAFE.encode(text));
    }

    let mut fields = event.clone();
    for name in &rules.exclude {
        fields.remove(name);
    }
    if !rules.include.is_empty() {
        fields.retain(|name, _| rules.include.iter().any(|keep| keep == name));
    }

    let json = serde_json::to_string(&fields).map_err(PubsubOutputError::Serialization)?;
    Ok(URL_SAFE.encode(json))
}
