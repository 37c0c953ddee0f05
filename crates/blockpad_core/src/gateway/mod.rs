//! Persistence gateway between documents and durable storage.
//!
//! # Responsibility
//! - Save/load the document snapshot under `editorData`.
//! - Produce export files and validate imported ones.
//! - Own the auxiliary `uploadedImage` and `theme` keys.
//!
//! # Invariants
//! - The gateway is a pure I/O boundary: it never normalizes blocks.
//! - Malformed payloads are rejected here and never reach the normalizer.
//! - Only metadata (sizes, counts, keys) is logged, never document text.

use crate::model::document::Document;
use crate::model::theme::Theme;
use crate::store::{KvStore, StoreError, EDITOR_DATA_KEY, THEME_KEY, UPLOADED_IMAGE_KEY};
use chrono::{Local, NaiveDateTime};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

mod export;
mod snapshot;

pub use export::{export_file_name, ExportFile, EXPORT_MIME_TYPE};
pub use snapshot::{decode_snapshot, encode_snapshot, encode_snapshot_pretty, SnapshotDecodeError};

/// Default export file name prefix.
pub const DEFAULT_EXPORT_PREFIX: &str = "editor-export";

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Gateway failure taxonomy.
#[derive(Debug)]
pub enum GatewayError {
    /// The store rejected a read or write for `key`.
    StorageFailure {
        key: &'static str,
        source: StoreError,
    },
    /// Payload is unparseable or has the wrong top-level shape.
    CorruptSnapshot(String),
    /// Imported payload parsed, but its `content` is not an array.
    ImportShapeError(String),
    /// Document could not be serialized.
    Encode(serde_json::Error),
}

impl Display for GatewayError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StorageFailure { key, source } => {
                write!(f, "storage failure on `{key}`: {source}")
            }
            Self::CorruptSnapshot(details) => write!(f, "corrupt snapshot: {details}"),
            Self::ImportShapeError(details) => write!(f, "import shape error: {details}"),
            Self::Encode(err) => write!(f, "snapshot encode failed: {err}"),
        }
    }
}

impl Error for GatewayError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::StorageFailure { source, .. } => Some(source),
            Self::Encode(err) => Some(err),
            Self::CorruptSnapshot(_) | Self::ImportShapeError(_) => None,
        }
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(value: serde_json::Error) -> Self {
        Self::Encode(value)
    }
}

/// Document persistence over any [`KvStore`].
pub struct PersistenceGateway<S: KvStore> {
    store: S,
    export_prefix: String,
}

impl<S: KvStore> PersistenceGateway<S> {
    pub fn new(store: S) -> Self {
        Self::with_export_prefix(store, DEFAULT_EXPORT_PREFIX)
    }

    pub fn with_export_prefix(store: S, export_prefix: impl Into<String>) -> Self {
        Self {
            store,
            export_prefix: export_prefix.into(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Writes `document` as the current snapshot.
    ///
    /// # Errors
    /// - `StorageFailure` when the store rejects the write (e.g. quota).
    pub fn save(&self, document: &Document) -> GatewayResult<()> {
        let started_at = Instant::now();
        let payload = encode_snapshot(document)?;

        match self.store.set(EDITOR_DATA_KEY, payload.as_str()) {
            Ok(()) => {
                info!(
                    "event=snapshot_save module=gateway status=ok blocks={} bytes={} duration_ms={}",
                    document.block_count(),
                    payload.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(())
            }
            Err(source) => {
                error!(
                    "event=snapshot_save module=gateway status=error bytes={} error_code=storage_failure error={}",
                    payload.len(),
                    source
                );
                Err(GatewayError::StorageFailure {
                    key: EDITOR_DATA_KEY,
                    source,
                })
            }
        }
    }

    /// Reads the current snapshot.
    ///
    /// Returns `Ok(None)` when nothing was ever saved.
    ///
    /// # Errors
    /// - `CorruptSnapshot` when the payload is not a well-shaped snapshot.
    /// - `StorageFailure` when the store cannot be read.
    pub fn load(&self) -> GatewayResult<Option<Document>> {
        let payload = self
            .store
            .get(EDITOR_DATA_KEY)
            .map_err(|source| GatewayError::StorageFailure {
                key: EDITOR_DATA_KEY,
                source,
            })?;

        let Some(payload) = payload else {
            info!("event=snapshot_load module=gateway status=ok found=false");
            return Ok(None);
        };

        match decode_snapshot(payload.as_str()) {
            Ok(document) => {
                info!(
                    "event=snapshot_load module=gateway status=ok found=true blocks={} bytes={}",
                    document.block_count(),
                    payload.len()
                );
                Ok(Some(document))
            }
            Err(err) => {
                let details = describe_decode_error(&err);
                warn!(
                    "event=snapshot_load module=gateway status=error bytes={} error_code=corrupt_snapshot",
                    payload.len()
                );
                Err(GatewayError::CorruptSnapshot(details))
            }
        }
    }

    /// Serializes `document` into a downloadable file stamped with local time.
    pub fn export_to_file(&self, document: &Document) -> GatewayResult<ExportFile> {
        self.export_to_file_at(document, Local::now().naive_local())
    }

    /// Same as [`export_to_file`](Self::export_to_file) with an explicit clock.
    pub fn export_to_file_at(
        &self,
        document: &Document,
        at: NaiveDateTime,
    ) -> GatewayResult<ExportFile> {
        let payload = encode_snapshot_pretty(document)?;
        let file = ExportFile {
            file_name: export_file_name(self.export_prefix.as_str(), at),
            bytes: payload.into_bytes(),
        };
        info!(
            "event=snapshot_export module=gateway status=ok blocks={} bytes={}",
            document.block_count(),
            file.bytes.len()
        );
        Ok(file)
    }

    /// Parses a user-selected export file.
    ///
    /// # Errors
    /// - `ImportShapeError` when `content` exists but is not an array.
    /// - `CorruptSnapshot` for every other malformed payload.
    pub fn import_from_file(&self, bytes: &[u8]) -> GatewayResult<Document> {
        let text = std::str::from_utf8(bytes).map_err(|err| {
            warn!(
                "event=snapshot_import module=gateway status=error bytes={} error_code=corrupt_snapshot",
                bytes.len()
            );
            GatewayError::CorruptSnapshot(format!("file is not UTF-8 text: {err}"))
        })?;

        match decode_snapshot(text) {
            Ok(document) => {
                info!(
                    "event=snapshot_import module=gateway status=ok blocks={} bytes={}",
                    document.block_count(),
                    bytes.len()
                );
                Ok(document)
            }
            Err(SnapshotDecodeError::ContentNotArray { found }) => {
                warn!(
                    "event=snapshot_import module=gateway status=error bytes={} error_code=import_shape_error found={}",
                    bytes.len(),
                    found
                );
                Err(GatewayError::ImportShapeError(format!(
                    "`content` must be an array, got {found}"
                )))
            }
            Err(err) => {
                warn!(
                    "event=snapshot_import module=gateway status=error bytes={} error_code=corrupt_snapshot",
                    bytes.len()
                );
                Err(GatewayError::CorruptSnapshot(describe_decode_error(&err)))
            }
        }
    }

    /// Caches the most recently uploaded image as a data URL.
    pub fn cache_uploaded_image(&self, data_url: &str) -> GatewayResult<()> {
        self.store
            .set(UPLOADED_IMAGE_KEY, data_url)
            .map_err(|source| GatewayError::StorageFailure {
                key: UPLOADED_IMAGE_KEY,
                source,
            })
    }

    /// Returns the cached image data URL, if any.
    pub fn uploaded_image(&self) -> GatewayResult<Option<String>> {
        self.store
            .get(UPLOADED_IMAGE_KEY)
            .map_err(|source| GatewayError::StorageFailure {
                key: UPLOADED_IMAGE_KEY,
                source,
            })
    }

    pub fn save_theme(&self, theme: Theme) -> GatewayResult<()> {
        self.store
            .set(THEME_KEY, theme.as_str())
            .map_err(|source| GatewayError::StorageFailure {
                key: THEME_KEY,
                source,
            })
    }

    /// Returns the stored theme; absent or unknown values read as `Light`.
    pub fn load_theme(&self) -> GatewayResult<Theme> {
        let stored = self
            .store
            .get(THEME_KEY)
            .map_err(|source| GatewayError::StorageFailure {
                key: THEME_KEY,
                source,
            })?;
        Ok(stored
            .as_deref()
            .and_then(Theme::parse)
            .unwrap_or_default())
    }
}

fn describe_decode_error(err: &SnapshotDecodeError) -> String {
    match err {
        SnapshotDecodeError::Syntax(details) => format!("not valid JSON: {details}"),
        SnapshotDecodeError::Shape(details) => details.clone(),
        SnapshotDecodeError::ContentNotArray { found } => {
            format!("`content` must be an array, got {found}")
        }
    }
}
