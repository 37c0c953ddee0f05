//! Stored snapshot codec.
//!
//! # Responsibility
//! - Encode a `Document` as `{"title": ..., "content": [...]}` JSON.
//! - Decode and shape-check snapshot payloads without normalizing them.
//!
//! # Invariants
//! - `content` present but not an array is reported separately from other
//!   faults so import can surface it as a user-actionable shape error.
//! - Missing `title` decodes as `""`; missing `content` as no blocks.

use crate::model::block::Block;
use crate::model::document::Document;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Serialize)]
struct SnapshotOut<'a> {
    title: &'a str,
    content: &'a [Block],
}

/// Snapshot decode failure classes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotDecodeError {
    /// Payload is not JSON (or not UTF-8 text).
    Syntax(String),
    /// Payload is JSON but not a snapshot object.
    Shape(String),
    /// `content` exists but is not an array.
    ContentNotArray { found: &'static str },
}

/// Compact JSON form written to the durable store.
pub fn encode_snapshot(document: &Document) -> serde_json::Result<String> {
    serde_json::to_string(&SnapshotOut {
        title: document.title.as_str(),
        content: document.blocks.as_slice(),
    })
}

/// Indented JSON form used for exported files.
pub fn encode_snapshot_pretty(document: &Document) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&SnapshotOut {
        title: document.title.as_str(),
        content: document.blocks.as_slice(),
    })
}

/// Parses and shape-checks a snapshot payload.
pub fn decode_snapshot(payload: &str) -> Result<Document, SnapshotDecodeError> {
    let value: Value = serde_json::from_str(payload)
        .map_err(|err| SnapshotDecodeError::Syntax(err.to_string()))?;

    let Value::Object(fields) = value else {
        return Err(SnapshotDecodeError::Shape(format!(
            "snapshot must be a JSON object, got {}",
            json_type_name(&value)
        )));
    };

    let title = match fields.get("title") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(title)) => title.clone(),
        Some(other) => {
            return Err(SnapshotDecodeError::Shape(format!(
                "`title` must be a string, got {}",
                json_type_name(other)
            )))
        }
    };

    let blocks = match fields.get("content") {
        None => Vec::new(),
        Some(Value::Array(items)) => decode_blocks(items)?,
        Some(other) => {
            return Err(SnapshotDecodeError::ContentNotArray {
                found: json_type_name(other),
            })
        }
    };

    Ok(Document::new(title, blocks))
}

fn decode_blocks(items: &[Value]) -> Result<Vec<Block>, SnapshotDecodeError> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            Block::deserialize(item).map_err(|err| {
                SnapshotDecodeError::Shape(format!("`content[{index}]` is not a valid block: {err}"))
            })
        })
        .collect()
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::{decode_snapshot, encode_snapshot, SnapshotDecodeError};
    use crate::model::block::Block;
    use crate::model::document::Document;

    #[test]
    fn decodes_missing_fields_as_empty() {
        let document = decode_snapshot("{}").expect("empty object is a valid snapshot");
        assert_eq!(document, Document::empty());
    }

    #[test]
    fn encodes_title_and_content_keys() {
        let document = Document::new("Draft", vec![Block::paragraph("hello")]);
        let encoded = encode_snapshot(&document).expect("encode");
        let value: serde_json::Value = serde_json::from_str(&encoded).expect("valid json");
        assert_eq!(value["title"], "Draft");
        assert_eq!(value["content"][0]["type"], "paragraph");
        assert_eq!(value["content"][0]["data"]["text"], "hello");
    }

    #[test]
    fn classifies_decode_failures() {
        assert!(matches!(
            decode_snapshot("not json"),
            Err(SnapshotDecodeError::Syntax(_))
        ));
        assert!(matches!(
            decode_snapshot("[1, 2]"),
            Err(SnapshotDecodeError::Shape(_))
        ));
        assert!(matches!(
            decode_snapshot(r#"{"title": 3}"#),
            Err(SnapshotDecodeError::Shape(_))
        ));
        assert_eq!(
            decode_snapshot(r#"{"content": null}"#),
            Err(SnapshotDecodeError::ContentNotArray { found: "null" })
        );
        assert!(matches!(
            decode_snapshot(r#"{"content": [{"data": {}}]}"#),
            Err(SnapshotDecodeError::Shape(message)) if message.contains("content[0]")
        ));
    }
}
