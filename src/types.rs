use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::EnrichmentError;

/// One comment as emitted by the upstream producer: a single NDJSON line.
///
/// Both fields are optional on the wire. A missing or `null` field is read
/// as an empty string; any other non-string value is malformed input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub text: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub created_at: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl RawRecord {
    pub fn new(text: impl Into<String>, created_at: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            created_at: created_at.into(),
        }
    }

    /// Parse one input line. The line must hold a JSON object; arrays and
    /// scalars are rejected even though serde would map an array onto the
    /// struct positionally.
    pub fn from_json_line(line: &[u8]) -> Result<Self, EnrichmentError> {
        let value: Value = serde_json::from_slice(line)?;
        if !value.is_object() {
            return Err(EnrichmentError::NotAnObject(json_type_name(&value)));
        }
        Ok(serde_json::from_value(value)?)
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A recognized entity span and its category label
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entity {
    pub text: String,
    pub label: String,
}

impl Entity {
    pub fn new(text: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            label: label.into(),
        }
    }
}

/// A comment after sentiment scoring and entity extraction.
///
/// `entities` keeps detection order and duplicates. `processing_timestamp`
/// is fixed when the record is analyzed so formatting stays deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    pub created_at: String,
    pub text: String,
    /// Sentiment polarity in [-1.0, 1.0]
    pub polarity: f64,
    /// Subjectivity in [0.0, 1.0]
    pub subjectivity: f64,
    pub entities: Vec<Entity>,
    /// `YYYY-MM-DDTHH:MM:SSZ`, wall-clock UTC at enrichment time
    pub processing_timestamp: String,
}

/// One CSV data line, without the trailing newline
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FormattedRow(String);

impl FormattedRow {
    pub(crate) fn new(line: String) -> Self {
        Self(line)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for FormattedRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
