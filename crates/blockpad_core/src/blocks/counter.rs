//! Document character counter.
//!
//! # Responsibility
//! - Compute a type-aware visible-text length for a document.
//!
//! # Invariants
//! - Lengths are Unicode scalar counts, never byte counts.
//! - The total is the sum of per-block contributions, so block order does not
//!   affect the result.
//! - Kinds without an explicit rule contribute 0. New kinds must be added to
//!   `count_block` deliberately.
//! - Missing or mistyped fields contribute 0; counting never fails.

use crate::model::block::{Block, BlockKind};
use crate::model::document::Document;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::borrow::Cow;

static MARKUP_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<[^>]+>").expect("valid markup tag regex"));

/// Counts visible characters across all blocks of `document`.
pub fn count(document: &Document) -> usize {
    count_blocks(&document.blocks)
}

/// Counts visible characters across `blocks`.
pub fn count_blocks(blocks: &[Block]) -> usize {
    blocks.iter().map(count_block).sum()
}

/// Returns one block's contribution to the document count.
///
/// - `paragraph`/`header`/`quote`: `data.text` without markup.
/// - `list`: every item without markup; nested list items recurse.
/// - `code`: `data.code` as-is.
/// - `raw`: `data.html` without markup.
/// - anything else: 0.
pub fn count_block(block: &Block) -> usize {
    match block.kind {
        BlockKind::Paragraph | BlockKind::Header | BlockKind::Quote => {
            stripped_len(block.data_str("text"))
        }
        BlockKind::List => list_items_len(block.data.get("items")),
        BlockKind::Code => block
            .data_str("code")
            .map_or(0, |code| code.chars().count()),
        BlockKind::Raw => stripped_len(block.data_str("html")),
        _ => 0,
    }
}

/// Removes every `<...>` run from `text`.
pub fn strip_markup(text: &str) -> Cow<'_, str> {
    MARKUP_TAG_RE.replace_all(text, "")
}

fn stripped_len(text: Option<&str>) -> usize {
    text.map_or(0, |value| strip_markup(value).chars().count())
}

fn list_items_len(items: Option<&Value>) -> usize {
    let Some(Value::Array(items)) = items else {
        return 0;
    };
    items.iter().map(list_item_len).sum()
}

fn list_item_len(item: &Value) -> usize {
    match item {
        Value::String(text) => stripped_len(Some(text)),
        // Nested list tool shape: `{ "content": "...", "items": [...] }`.
        Value::Object(fields) => {
            stripped_len(fields.get("content").and_then(Value::as_str))
                + list_items_len(fields.get("items"))
        }
        _ => 0,
    }
}
