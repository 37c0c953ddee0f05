//! Block model.
//!
//! # Responsibility
//! - Map editor block records (`{"type": ..., "data": {...}}`) to Rust types.
//! - Provide typed access to well-known `data` fields.
//!
//! # Invariants
//! - Unknown kinds deserialize to `BlockKind::Other` and serialize back to the
//!   same string.
//! - Top-level fields other than `type`/`data` (e.g. `id`, `tunes`) are kept in
//!   `extra` and written back unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::{Display, Formatter};

/// Block kind tag, serialized as the editor's `type` string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BlockKind {
    Paragraph,
    Header,
    Quote,
    List,
    Code,
    /// Legacy free-form markup block. Migrated to `Paragraph` on load.
    Raw,
    Delimiter,
    Table,
    Image,
    Embed,
    Warning,
    LinkTool,
    InlineCode,
    /// Any kind this crate does not know about. Preserved opaquely.
    Other(String),
}

const KNOWN_KINDS: &[BlockKind] = &[
    BlockKind::Paragraph,
    BlockKind::Header,
    BlockKind::Quote,
    BlockKind::List,
    BlockKind::Code,
    BlockKind::Raw,
    BlockKind::Delimiter,
    BlockKind::Table,
    BlockKind::Image,
    BlockKind::Embed,
    BlockKind::Warning,
    BlockKind::LinkTool,
    BlockKind::InlineCode,
];

impl BlockKind {
    /// Parses an editor `type` string. Never fails.
    pub fn parse(value: &str) -> Self {
        match value {
            "paragraph" => Self::Paragraph,
            "header" => Self::Header,
            "quote" => Self::Quote,
            "list" => Self::List,
            "code" => Self::Code,
            "raw" => Self::Raw,
            "delimiter" => Self::Delimiter,
            "table" => Self::Table,
            "image" => Self::Image,
            "embed" => Self::Embed,
            "warning" => Self::Warning,
            "linkTool" => Self::LinkTool,
            "inlineCode" => Self::InlineCode,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Paragraph => "paragraph",
            Self::Header => "header",
            Self::Quote => "quote",
            Self::List => "list",
            Self::Code => "code",
            Self::Raw => "raw",
            Self::Delimiter => "delimiter",
            Self::Table => "table",
            Self::Image => "image",
            Self::Embed => "embed",
            Self::Warning => "warning",
            Self::LinkTool => "linkTool",
            Self::InlineCode => "inlineCode",
            Self::Other(value) => value.as_str(),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }

    /// Kinds the stock editor tool set registers.
    pub fn known_kinds() -> &'static [BlockKind] {
        KNOWN_KINDS
    }
}

impl From<String> for BlockKind {
    fn from(value: String) -> Self {
        Self::parse(value.as_str())
    }
}

impl From<BlockKind> for String {
    fn from(value: BlockKind) -> Self {
        match value {
            BlockKind::Other(value) => value,
            known => known.as_str().to_string(),
        }
    }
}

impl Display for BlockKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One content unit of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Serialized as `type` to match the editor's output schema.
    #[serde(rename = "type")]
    pub kind: BlockKind,
    /// Kind-specific payload. Absent `data` reads as an empty mapping.
    #[serde(default)]
    pub data: Map<String, Value>,
    /// Remaining top-level fields (`id`, `tunes`, ...), kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Block {
    pub fn new(kind: BlockKind, data: Map<String, Value>) -> Self {
        Self {
            kind,
            data,
            extra: Map::new(),
        }
    }

    /// Builds a `paragraph` block with the given text.
    pub fn paragraph(text: impl Into<String>) -> Self {
        let mut data = Map::new();
        data.insert("text".to_string(), Value::String(text.into()));
        Self::new(BlockKind::Paragraph, data)
    }

    /// Returns a string field from `data`, or `None` when absent or not a string.
    pub fn data_str(&self, field: &str) -> Option<&str> {
        self.data.get(field).and_then(Value::as_str)
    }

    /// Returns the editor-assigned block id, if any.
    pub fn id(&self) -> Option<&str> {
        self.extra.get("id").and_then(Value::as_str)
    }
}
