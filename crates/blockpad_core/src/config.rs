//! Core configuration.
//!
//! # Responsibility
//! - Describe logging and session tunables with sane defaults.
//! - Parse host-provided JSON configuration.
//!
//! # Invariants
//! - Every field has a default; an empty JSON object is a valid config.
//! - `validate()` runs before a config is handed to logging or a session.

use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

const DEFAULT_RECOUNT_INTERVAL_MS: u64 = 500;
const DEFAULT_EXPORT_FILE_PREFIX: &str = "editor-export";
const DEFAULT_MAX_LOG_FILE_BYTES: u64 = 10 * 1024 * 1024;
const DEFAULT_MAX_LOG_FILES: usize = 5;

/// Configuration validation/parse failure.
#[derive(Debug)]
pub enum ConfigError {
    Parse(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "invalid config JSON: {err}"),
            Self::Invalid(details) => write!(f, "invalid config: {details}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

/// Top-level configuration for hosts embedding the core.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub logging: LoggingConfig,
    pub session: SessionConfig,
}

impl CoreConfig {
    /// Parses and validates a JSON config document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.logging.validate()?;
        self.session.validate()
    }
}

/// File logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `trace|debug|info|warn|error`.
    pub level: String,
    /// Absolute directory for rolling log files. `None` disables file logging.
    pub log_dir: Option<String>,
    pub max_file_bytes: u64,
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: crate::logging::default_log_level().to_string(),
            log_dir: None,
            max_file_bytes: DEFAULT_MAX_LOG_FILE_BYTES,
            max_files: DEFAULT_MAX_LOG_FILES,
        }
    }
}

impl LoggingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_file_bytes == 0 {
            return Err(ConfigError::Invalid(
                "logging.max_file_bytes must be > 0".to_string(),
            ));
        }
        if self.max_files == 0 {
            return Err(ConfigError::Invalid(
                "logging.max_files must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Document session settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Period of the character recount tick.
    pub recount_interval_ms: u64,
    /// File name prefix for exports (`<prefix>-YYYYMMDD-HHMMSS.json`).
    pub export_file_prefix: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            recount_interval_ms: DEFAULT_RECOUNT_INTERVAL_MS,
            export_file_prefix: DEFAULT_EXPORT_FILE_PREFIX.to_string(),
        }
    }
}

impl SessionConfig {
    pub fn recount_interval(&self) -> Duration {
        Duration::from_millis(self.recount_interval_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.recount_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "session.recount_interval_ms must be > 0".to_string(),
            ));
        }
        let prefix = self.export_file_prefix.trim();
        if prefix.is_empty() {
            return Err(ConfigError::Invalid(
                "session.export_file_prefix cannot be empty".to_string(),
            ));
        }
        if prefix.contains(['/', '\\']) {
            return Err(ConfigError::Invalid(format!(
                "session.export_file_prefix must not contain path separators, got `{prefix}`"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig};
    use std::time::Duration;

    #[test]
    fn empty_object_yields_defaults() {
        let config = CoreConfig::from_json_str("{}").expect("defaults are valid");
        assert_eq!(config, CoreConfig::default());
        assert_eq!(config.session.recount_interval(), Duration::from_millis(500));
        assert_eq!(config.session.export_file_prefix, "editor-export");
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = CoreConfig::from_json_str(r#"{"session": {"recount_interval_ms": 1000}}"#)
            .expect("valid config");
        assert_eq!(config.session.recount_interval_ms, 1000);
        assert_eq!(config.session.export_file_prefix, "editor-export");
        assert_eq!(config.logging.max_files, 5);
    }

    #[test]
    fn rejects_zero_interval_and_path_prefix() {
        let err = CoreConfig::from_json_str(r#"{"session": {"recount_interval_ms": 0}}"#)
            .expect_err("zero interval");
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = CoreConfig::from_json_str(r#"{"session": {"export_file_prefix": "../x"}}"#)
            .expect_err("path separator");
        assert!(err.to_string().contains("path separators"));
    }
}
