//! Export file naming and payload.

use chrono::NaiveDateTime;

pub const EXPORT_MIME_TYPE: &str = "application/json";

/// A serialized document ready for client-side download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    /// `<prefix>-YYYYMMDD-HHMMSS.json`
    pub file_name: String,
    /// Pretty-printed UTF-8 JSON.
    pub bytes: Vec<u8>,
}

impl ExportFile {
    pub fn mime_type(&self) -> &'static str {
        EXPORT_MIME_TYPE
    }

    pub fn as_text(&self) -> Option<&str> {
        std::str::from_utf8(&self.bytes).ok()
    }
}

/// Builds `<prefix>-YYYYMMDD-HHMMSS.json` for the given wall-clock time.
pub fn export_file_name(prefix: &str, at: NaiveDateTime) -> String {
    format!("{prefix}-{}.json", at.format("%Y%m%d-%H%M%S"))
}
