//! Durable string-valued key-value store.
//!
//! # Responsibility
//! - Define the store contract used by the persistence gateway.
//! - Provide SQLite-backed and in-memory implementations.
//!
//! # Invariants
//! - Values are stored and returned verbatim; the store never parses them.
//! - A rejected write leaves the previous value for that key intact.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod memory;
mod sqlite;

pub use memory::MemoryKvStore;
pub use sqlite::SqliteKvStore;

/// Key holding the serialized document snapshot.
pub const EDITOR_DATA_KEY: &str = "editorData";
/// Key holding the data URL of the most recently uploaded image.
pub const UPLOADED_IMAGE_KEY: &str = "uploadedImage";
/// Key holding the theme preference (`light` | `dark`).
pub const THEME_KEY: &str = "theme";

pub type StoreResult<T> = Result<T, StoreError>;

/// Key-value store failure.
#[derive(Debug)]
pub enum StoreError {
    /// Write would exceed the store's byte quota.
    QuotaExceeded {
        key: String,
        required_bytes: usize,
        quota_bytes: usize,
    },
    Db(DbError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::QuotaExceeded {
                key,
                required_bytes,
                quota_bytes,
            } => write!(
                f,
                "store quota exceeded writing `{key}`: {required_bytes} bytes needed, quota is {quota_bytes}"
            ),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::QuotaExceeded { .. } => None,
            Self::Db(err) => Some(err),
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// String-valued key-value store contract.
pub trait KvStore {
    /// Returns the value for `key`, or `None` when never written.
    fn get(&self, key: &str) -> StoreResult<Option<String>>;
    /// Inserts or replaces the value for `key`.
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;
    /// Removes `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> StoreResult<()>;
}
