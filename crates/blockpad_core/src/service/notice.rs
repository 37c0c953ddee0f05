//! User-visible, non-blocking notifications raised by the session.

/// Severity shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    /// Work continues with a fallback (e.g. empty document on startup).
    Warning,
    /// The requested action did not complete.
    Error,
}

impl NoticeLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// One queued notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    /// Stable machine-readable code, e.g. `import_shape_error`.
    pub code: &'static str,
    /// Human-readable message for display.
    pub message: String,
}

impl Notice {
    pub fn warning(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            code,
            message: message.into(),
        }
    }

    pub fn error(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            code,
            message: message.into(),
        }
    }
}
