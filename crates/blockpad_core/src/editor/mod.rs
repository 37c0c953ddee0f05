//! External editor capability port.
//!
//! # Responsibility
//! - Describe the three operations the core needs from the block editor.
//! - Provide `BufferedEditor`, a host-driven adapter for FFI/CLI hosts.
//!
//! # Invariants
//! - The core never reaches into editor internals beyond this trait.

use crate::model::block::Block;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

mod buffered;

pub use buffered::BufferedEditor;

/// Editor state snapshot, shaped like the editor's `save()` output.
///
/// Extra output fields (`time`, `version`) are ignored on input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorOutput {
    #[serde(default)]
    pub blocks: Vec<Block>,
}

impl EditorOutput {
    /// Serializes as `{"blocks": [...]}` for hosts that render from JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Editor-side failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorError {
    /// Editor has not signalled readiness yet.
    NotReady,
    /// `save()` rejected.
    SaveRejected(String),
    /// `render()` rejected, e.g. an unregistered block kind.
    RenderRejected(String),
}

impl Display for EditorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotReady => write!(f, "editor is not ready"),
            Self::SaveRejected(details) => write!(f, "editor save rejected: {details}"),
            Self::RenderRejected(details) => write!(f, "editor render rejected: {details}"),
        }
    }
}

impl Error for EditorError {}

/// Capabilities the session needs from the external block editor.
pub trait EditorPort {
    /// One-shot readiness signal; stays `true` once set.
    fn is_ready(&self) -> bool;
    /// Snapshots the currently displayed content.
    fn save(&mut self) -> Result<EditorOutput, EditorError>;
    /// Replaces the displayed content with `blocks`.
    fn render(&mut self, blocks: &[Block]) -> Result<(), EditorError>;
}
