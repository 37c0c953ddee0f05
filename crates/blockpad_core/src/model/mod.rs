//! Document model shared by the normalizer, counter, gateway and session.
//!
//! # Responsibility
//! - Define the canonical block/document shapes exchanged with the editor.
//! - Keep unknown block kinds and unknown block fields intact.
//!
//! # Invariants
//! - Block order inside a document is reading order.
//! - A block's `data` schema is determined solely by its kind.

pub mod block;
pub mod document;
pub mod theme;
