use std::borrow::Cow;

use crate::types::{EnrichedRecord, Entity, FormattedRow};

/// Turn an enriched record into one CSV line in header column order.
///
/// `text` and the entity list are always quoted, with quotes doubled and
/// line breaks flattened to a single space. Scores are plain decimals.
/// Timestamps go out bare unless they contain a character that would
/// break the row.
pub fn format(record: &EnrichedRecord) -> FormattedRow {
    let entities = serialize_entities(&record.entities);

    let line = [
        bare(&record.created_at),
        Cow::Owned(quote(&record.text)),
        Cow::Owned(decimal(record.polarity)),
        Cow::Owned(decimal(record.subjectivity)),
        Cow::Owned(quote(&entities)),
        bare(&record.processing_timestamp),
    ]
    .join(",");

    FormattedRow::new(line)
}

/// `text (label)` segments joined with `", "`; empty for no entities
pub fn serialize_entities(entities: &[Entity]) -> String {
    entities
        .iter()
        .map(|e| format!("{} ({})", e.text, e.label))
        .collect::<Vec<_>>()
        .join(", ")
}

fn quote(field: &str) -> String {
    let flattened = field.replace("\r\n", " ").replace(['\n', '\r'], " ");
    format!("\"{}\"", flattened.replace('"', "\"\""))
}

fn bare(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(quote(field))
    } else {
        Cow::Borrowed(field)
    }
}

/// Shortest round-trip decimal, always with a fractional part.
/// `Display` for f64 never switches to exponent notation.
fn decimal(value: f64) -> String {
    if !value.is_finite() || value == 0.0 {
        return "0.0".to_string();
    }
    let mut s = value.to_string();
    if !s.contains('.') {
        s.push_str(".0");
    }
    s
}
