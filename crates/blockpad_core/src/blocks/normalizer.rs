//! Block model normalizer.
//!
//! # Responsibility
//! - Rewrite legacy `raw` blocks as `paragraph` blocks whose text is the raw
//!   markup.
//! - Pass every other kind through unchanged, including unknown kinds.
//!
//! # Invariants
//! - Output length equals input length and order is preserved (1:1).
//! - `normalize(normalize(x)) == normalize(x)`.
//! - The markup inside a raw block is re-tagged, never reinterpreted.

use crate::model::block::{Block, BlockKind};
use crate::model::document::Document;
use serde_json::Map;

/// Returns the canonical form of `blocks`.
pub fn normalize(blocks: &[Block]) -> Vec<Block> {
    blocks.iter().map(normalize_block).collect()
}

/// Owned variant of [`normalize`]; avoids cloning blocks that pass through.
pub fn normalize_owned(blocks: Vec<Block>) -> Vec<Block> {
    blocks
        .into_iter()
        .map(|block| match block.kind {
            BlockKind::Raw => raw_to_paragraph(&block),
            _ => block,
        })
        .collect()
}

/// Normalizes the blocks of `document`, keeping its title.
pub fn normalize_document(document: &Document) -> Document {
    Document::new(document.title.clone(), normalize(&document.blocks))
}

/// Returns the canonical form of one block.
pub fn normalize_block(block: &Block) -> Block {
    match block.kind {
        BlockKind::Raw => raw_to_paragraph(block),
        _ => block.clone(),
    }
}

/// Returns whether any block in `blocks` has a legacy shape.
pub fn needs_normalization(blocks: &[Block]) -> bool {
    legacy_block_count(blocks) > 0
}

/// Number of blocks that normalization would rewrite.
pub fn legacy_block_count(blocks: &[Block]) -> usize {
    blocks
        .iter()
        .filter(|block| block.kind == BlockKind::Raw)
        .count()
}

fn raw_to_paragraph(block: &Block) -> Block {
    let html = block.data_str("html").unwrap_or_default();
    let mut paragraph = Block::paragraph(html);
    // Only the editor id carries over; raw-tool tunes do not apply to paragraphs.
    if let Some(id) = block.extra.get("id") {
        let mut extra = Map::new();
        extra.insert("id".to_string(), id.clone());
        paragraph.extra = extra;
    }
    paragraph
}
