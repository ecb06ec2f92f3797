//! Event model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Event payload: string keys, typed values.
pub type Payload = BTreeMap<String, PayloadValue>;

/// A payload value.
///
/// Serialized untagged, so payloads read and write as plain JSON objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PayloadValue {
    Bool(bool),
    Number(f64),
    String(String),
    Map(BTreeMap<String, PayloadValue>),
}

impl PayloadValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PayloadValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PayloadValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PayloadValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, PayloadValue>> {
        match self {
            PayloadValue::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Parse a command-line style value: `true`/`false`, numbers, otherwise a string.
    pub fn parse_loose(raw: &str) -> Self {
        match raw {
            "true" => PayloadValue::Bool(true),
            "false" => PayloadValue::Bool(false),
            _ => match raw.parse::<f64>() {
                Ok(n) if n.is_finite() => PayloadValue::Number(n),
                _ => PayloadValue::String(raw.to_string()),
            },
        }
    }
}

impl From<&str> for PayloadValue {
    fn from(value: &str) -> Self {
        PayloadValue::String(value.to_string())
    }
}

impl From<String> for PayloadValue {
    fn from(value: String) -> Self {
        PayloadValue::String(value)
    }
}

impl From<bool> for PayloadValue {
    fn from(value: bool) -> Self {
        PayloadValue::Bool(value)
    }
}

impl From<f64> for PayloadValue {
    fn from(value: f64) -> Self {
        PayloadValue::Number(value)
    }
}

impl From<i64> for PayloadValue {
    fn from(value: i64) -> Self {
        PayloadValue::Number(value as f64)
    }
}

impl From<u64> for PayloadValue {
    fn from(value: u64) -> Self {
        PayloadValue::Number(value as f64)
    }
}

impl From<Payload> for PayloadValue {
    fn from(value: Payload) -> Self {
        PayloadValue::Map(value)
    }
}

/// Build a payload from key/value pairs.
///
/// ```
/// use event_journal::payload_from;
///
/// let payload = payload_from([("product_name", "Oud Royale"), ("context", "product")]);
/// assert_eq!(payload.len(), 2);
/// ```
pub fn payload_from<I, K, V>(pairs: I) -> Payload
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<PayloadValue>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// A recorded event.
///
/// The wire names (`event`, `data`) follow the collector's JSON format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Unique id assigned at record time. Entries persisted without one get a
    /// fresh id when read back.
    #[serde(default = "new_event_id")]
    pub event_id: String,
    #[serde(rename = "event")]
    pub name: String,
    #[serde(rename = "data", default)]
    pub payload: Payload,
    pub timestamp: DateTime<Utc>,
    pub session_id: String,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_url: Option<String>,
}

pub(crate) fn new_event_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
