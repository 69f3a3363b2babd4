//! Raw slot payload extraction.
//!
//! The detector's storage schema drifted over time, so a slot's `events`
//! column may hold either of two shapes. Shape is detected structurally
//! from marker fields, never from a version tag:
//!
//! - flat: `[{"label": "...", "prob": 0.91}, ...]`
//! - nested: `[{"time": 0, "events": [{"label": "...", "score": 0.85}]}, ...]`
//!
//! Unrecognized shapes yield zero labels rather than an error; historical
//! rows may contain dead schema variants and one bad row must not abort a
//! 48-slot run.

use serde_json::Value;

/// Structural classification of one slot's raw payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
    /// Items carry a `label` plus a confidence-like field directly.
    Flat,
    /// Time-stamped buckets, each with a nested `events` list.
    Nested,
    /// Null or empty payload.
    Empty,
    /// Anything else.
    Unrecognized,
}

const CONFIDENCE_FIELDS: &[&str] = &["score", "prob", "confidence"];

fn has_confidence_field(item: &Value) -> bool {
    CONFIDENCE_FIELDS.iter().any(|f| item.get(f).is_some())
}

/// Classify a payload by inspecting its first item.
pub fn classify_shape(payload: &Value) -> PayloadShape {
    let items = match payload {
        Value::Null => return PayloadShape::Empty,
        Value::Array(items) => items,
        _ => return PayloadShape::Unrecognized,
    };
    let first = match items.first() {
        None => return PayloadShape::Empty,
        Some(first) => first,
    };
    if first.get("label").is_some() && has_confidence_field(first) {
        PayloadShape::Flat
    } else if first.get("time").is_some() && first.get("events").is_some() {
        PayloadShape::Nested
    } else {
        PayloadShape::Unrecognized
    }
}

/// Flatten a payload into its raw event labels.
///
/// Confidence scores and in-slot timestamps are ignored; only label
/// presence matters. Items without a string `label` are skipped.
pub fn extract_labels(payload: &Value) -> Vec<String> {
    match classify_shape(payload) {
        PayloadShape::Flat => payload
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(item_label)
            .collect(),
        PayloadShape::Nested => payload
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(|bucket| bucket.get("events").and_then(Value::as_array))
            .flatten()
            .filter_map(item_label)
            .collect(),
        PayloadShape::Empty | PayloadShape::Unrecognized => Vec::new(),
    }
}

fn item_label(item: &Value) -> Option<String> {
    item.get("label").and_then(Value::as_str).map(str::to_string)
}
