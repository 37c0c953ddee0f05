//! Core domain logic for blockpad.
//! This crate owns document persistence, legacy block migration and
//! character counting for a block-based rich-text editor.

pub mod blocks;
pub mod config;
pub mod db;
pub mod editor;
pub mod gateway;
pub mod logging;
pub mod media;
pub mod model;
pub mod service;
pub mod store;

pub use blocks::counter::{count, count_block, count_blocks, strip_markup};
pub use blocks::normalizer::{
    legacy_block_count, needs_normalization, normalize, normalize_block, normalize_document,
    normalize_owned,
};
pub use config::{ConfigError, CoreConfig, LoggingConfig, SessionConfig};
pub use editor::{BufferedEditor, EditorError, EditorOutput, EditorPort};
pub use gateway::{ExportFile, GatewayError, GatewayResult, PersistenceGateway};
pub use logging::{default_log_level, init_logging, init_logging_with, logging_status};
pub use media::{to_data_url, MediaError};
pub use model::block::{Block, BlockKind};
pub use model::document::Document;
pub use model::theme::Theme;
pub use service::notice::{Notice, NoticeLevel};
pub use service::session::{
    Session, SessionError, SessionResult, SessionState, TickOutcome, TickSkip,
};
pub use store::{KvStore, MemoryKvStore, SqliteKvStore, StoreError, StoreResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
