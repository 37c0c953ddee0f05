//! Document session controller.
//!
//! # Responsibility
//! - Own the single in-memory `Document` for one editor session.
//! - Drive restore, save, export, import and recount against the editor port
//!   and the persistence gateway.
//! - Turn every failure into a queued user-visible [`Notice`].
//!
//! # Invariants
//! - Lifecycle is `Uninitialized -> Restoring -> Ready`; `Session::start`
//!   returns only in `Ready`, and no failure leaves it.
//! - Blocks are normalized exactly once per entry point: on restore, on
//!   import, and on every editor snapshot.
//! - User actions re-snapshot the editor; they never persist a cached copy.
//! - Restored content is rendered only after the editor reports readiness,
//!   and stays pending until a render succeeds. While it is pending, save and
//!   export refuse instead of persisting the editor's stale content.
//! - A failed import render leaves title and document untouched.
//! - The current document is replaced wholesale, never patched in place.

use crate::blocks::counter::{count, count_blocks};
use crate::blocks::normalizer::{legacy_block_count, normalize_owned};
use crate::config::SessionConfig;
use crate::editor::{EditorError, EditorPort};
use crate::gateway::{ExportFile, GatewayError, PersistenceGateway};
use crate::media::{to_data_url, MediaError};
use crate::model::block::Block;
use crate::model::document::Document;
use crate::model::theme::Theme;
use crate::service::notice::Notice;
use crate::store::KvStore;
use log::{debug, error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type SessionResult<T> = Result<T, SessionError>;

/// Session lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Restoring,
    Ready,
}

impl SessionState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Restoring => "restoring",
            Self::Ready => "ready",
        }
    }
}

/// Why a recount tick did not publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickSkip {
    /// Editor has not signalled readiness.
    EditorNotReady,
    /// Editor rejected the snapshot request.
    EditorRejected,
}

/// Result of one recount tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Published(usize),
    Skipped(TickSkip),
}

/// Failures surfaced by session actions.
///
/// Every variant is recoverable; the session stays `Ready`.
#[derive(Debug)]
pub enum SessionError {
    /// The store rejected a write (or a read during restore).
    StorageFailure(GatewayError),
    /// Payload unparseable or wrong top-level shape.
    CorruptSnapshot(String),
    /// Imported `content` is not an array.
    ImportShapeError(String),
    /// Editor refused to display a document.
    RenderFailure(EditorError),
    /// Editor not ready, or refused to produce a snapshot.
    EditorUnavailable(EditorError),
    /// Uploaded image could not be encoded.
    InvalidImage(MediaError),
}

impl SessionError {
    /// Stable machine-readable code used in notices and host envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::StorageFailure(_) => "storage_failure",
            Self::CorruptSnapshot(_) => "corrupt_snapshot",
            Self::ImportShapeError(_) => "import_shape_error",
            Self::RenderFailure(_) => "render_failure",
            Self::EditorUnavailable(_) => "editor_unavailable",
            Self::InvalidImage(_) => "invalid_image",
        }
    }

    /// Message suitable for direct display.
    pub fn user_message(&self) -> String {
        match self {
            Self::StorageFailure(_) => {
                "Saving failed: storage rejected the write (it may be full).".to_string()
            }
            Self::CorruptSnapshot(details) => {
                format!("The selected file is not a valid document export: {details}")
            }
            Self::ImportShapeError(_) => {
                "The selected file has the wrong format: `content` is not an array.".to_string()
            }
            Self::RenderFailure(err) => {
                format!("The editor could not display the document: {err}")
            }
            Self::EditorUnavailable(EditorError::NotReady) => {
                "The editor is still loading; try again in a moment.".to_string()
            }
            Self::EditorUnavailable(err) => format!("Could not read the editor content: {err}"),
            Self::InvalidImage(err) => format!("Image upload failed: {err}"),
        }
    }
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StorageFailure(err) => write!(f, "{err}"),
            Self::CorruptSnapshot(details) => write!(f, "corrupt snapshot: {details}"),
            Self::ImportShapeError(details) => write!(f, "import shape error: {details}"),
            Self::RenderFailure(err) => write!(f, "render failure: {err}"),
            Self::EditorUnavailable(err) => write!(f, "editor unavailable: {err}"),
            Self::InvalidImage(err) => write!(f, "invalid image: {err}"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::StorageFailure(err) => Some(err),
            Self::RenderFailure(err) | Self::EditorUnavailable(err) => Some(err),
            Self::InvalidImage(err) => Some(err),
            Self::CorruptSnapshot(_) | Self::ImportShapeError(_) => None,
        }
    }
}

impl From<GatewayError> for SessionError {
    fn from(value: GatewayError) -> Self {
        match value {
            GatewayError::CorruptSnapshot(details) => Self::CorruptSnapshot(details),
            GatewayError::ImportShapeError(details) => Self::ImportShapeError(details),
            other => Self::StorageFailure(other),
        }
    }
}

/// One editor session over one document.
pub struct Session<E: EditorPort, S: KvStore> {
    id: Uuid,
    state: SessionState,
    config: SessionConfig,
    editor: E,
    gateway: PersistenceGateway<S>,
    /// Live title field; copied into the document on every snapshot.
    title: String,
    document: Document,
    pending_render: Option<Vec<Block>>,
    char_count: usize,
    theme: Theme,
    notices: Vec<Notice>,
}

impl<E: EditorPort, S: KvStore> Session<E, S> {
    /// Creates a session and restores the last saved document.
    ///
    /// Never fails: an absent snapshot yields an empty document, and a corrupt
    /// or unreadable one yields an empty document plus a warning notice.
    pub fn start(editor: E, store: S, config: SessionConfig) -> Self {
        let gateway =
            PersistenceGateway::with_export_prefix(store, config.export_file_prefix.trim());
        let mut session = Self {
            id: Uuid::new_v4(),
            state: SessionState::Uninitialized,
            config,
            editor,
            gateway,
            title: String::new(),
            document: Document::empty(),
            pending_render: None,
            char_count: 0,
            theme: Theme::default(),
            notices: Vec::new(),
        };
        session.restore();
        session
    }

    fn restore(&mut self) {
        self.transition(SessionState::Restoring);

        let document = match self.gateway.load() {
            Ok(Some(stored)) => {
                let migrated = legacy_block_count(&stored.blocks);
                let document = Document::new(stored.title, normalize_owned(stored.blocks));
                info!(
                    "event=session_restore module=session status=ok session_id={} blocks={} migrated_raw={}",
                    self.id,
                    document.block_count(),
                    migrated
                );
                document
            }
            Ok(None) => {
                info!(
                    "event=session_restore module=session status=ok session_id={} blocks=0 found=false",
                    self.id
                );
                Document::empty()
            }
            Err(err) => {
                let session_err = SessionError::from(err);
                warn!(
                    "event=session_restore module=session status=error session_id={} error_code={} error={}",
                    self.id,
                    session_err.code(),
                    session_err
                );
                self.notices.push(Notice::warning(
                    session_err.code(),
                    "The saved document could not be restored; starting with an empty document.",
                ));
                Document::empty()
            }
        };

        self.theme = match self.gateway.load_theme() {
            Ok(theme) => theme,
            Err(err) => {
                warn!(
                    "event=theme_load module=session status=error session_id={} error={}",
                    self.id, err
                );
                Theme::default()
            }
        };

        self.title = document.title.clone();
        self.char_count = count(&document);
        if !document.blocks.is_empty() {
            self.pending_render = Some(document.blocks.clone());
        }
        self.document = document;
        self.transition(SessionState::Ready);

        if let Err(err) = self.flush_pending_render() {
            debug!(
                "event=session_restore module=session status=render_deferred session_id={} error_code={}",
                self.id,
                err.code()
            );
        }
    }

    /// Signals that the editor finished initializing; flushes a deferred render.
    pub fn editor_ready(&mut self) -> SessionResult<()> {
        self.flush_pending_render()
    }

    /// Updates the live title field.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Snapshots the editor and writes it to the durable store.
    ///
    /// # Errors
    /// - `EditorUnavailable` when the editor cannot be snapshotted.
    /// - `RenderFailure` when restored content still cannot be displayed; the
    ///   stored snapshot is left untouched.
    /// - `StorageFailure` when the store rejects the write; the in-memory
    ///   document still reflects the snapshot.
    pub fn save(&mut self) -> SessionResult<()> {
        let document = self.snapshot("save")?;
        self.adopt(document);

        match self.gateway.save(&self.document) {
            Ok(()) => {
                info!(
                    "event=session_save module=session status=ok session_id={} blocks={} chars={}",
                    self.id,
                    self.document.block_count(),
                    self.char_count
                );
                Ok(())
            }
            Err(err) => self.fail("save", err.into()),
        }
    }

    /// Snapshots the editor and serializes it for download.
    pub fn export(&mut self) -> SessionResult<ExportFile> {
        let document = self.snapshot("export")?;
        self.adopt(document);

        match self.gateway.export_to_file(&self.document) {
            Ok(file) => {
                info!(
                    "event=session_export module=session status=ok session_id={} blocks={} bytes={}",
                    self.id,
                    self.document.block_count(),
                    file.bytes.len()
                );
                Ok(file)
            }
            Err(err) => self.fail("export", err.into()),
        }
    }

    /// Replaces the current document with an imported export file.
    ///
    /// On failure, including a rejected render, the previous document and
    /// title are left untouched.
    pub fn import(&mut self, bytes: &[u8]) -> SessionResult<&Document> {
        let imported = match self.gateway.import_from_file(bytes) {
            Ok(document) => document,
            Err(err) => return self.fail("import", err.into()),
        };

        let migrated = legacy_block_count(&imported.blocks);
        let document = Document::new(imported.title, normalize_owned(imported.blocks));

        if self.editor.is_ready() {
            if let Err(err) = self.editor.render(&document.blocks) {
                return self.fail("import", SessionError::RenderFailure(err));
            }
            self.pending_render = None;
        } else {
            self.pending_render = Some(document.blocks.clone());
        }

        self.title = document.title.clone();
        self.adopt(document);
        info!(
            "event=session_import module=session status=ok session_id={} blocks={} migrated_raw={}",
            self.id,
            self.document.block_count(),
            migrated
        );
        Ok(&self.document)
    }

    /// Recomputes and publishes the character count of the editor content.
    ///
    /// Skips without error when the editor is not ready or rejects the
    /// snapshot; the next tick simply tries again.
    pub fn recount_tick(&mut self) -> TickOutcome {
        if !self.editor.is_ready() {
            debug!(
                "event=recount module=session status=skipped session_id={} reason=editor_not_ready",
                self.id
            );
            return TickOutcome::Skipped(TickSkip::EditorNotReady);
        }
        if let Err(err) = self.render_pending() {
            debug!(
                "event=recount module=session status=skipped session_id={} reason=render_pending error={}",
                self.id, err
            );
            return TickOutcome::Skipped(TickSkip::EditorRejected);
        }

        match self.editor.save() {
            Ok(output) => {
                let blocks = normalize_owned(output.blocks);
                self.char_count = count_blocks(&blocks);
                debug!(
                    "event=recount module=session status=ok session_id={} chars={}",
                    self.id, self.char_count
                );
                TickOutcome::Published(self.char_count)
            }
            Err(err) => {
                warn!(
                    "event=recount module=session status=error session_id={} error={}",
                    self.id, err
                );
                TickOutcome::Skipped(TickSkip::EditorRejected)
            }
        }
    }

    /// Applies and persists the theme toggle.
    ///
    /// The in-memory theme changes even when persisting fails.
    pub fn set_theme(&mut self, theme: Theme) -> SessionResult<()> {
        self.theme = theme;
        match self.gateway.save_theme(theme) {
            Ok(()) => Ok(()),
            Err(err) => self.fail("theme", err.into()),
        }
    }

    /// Encodes an uploaded image as a data URL for the image block.
    ///
    /// The URL is also cached under `uploadedImage`; a cache failure is logged
    /// but does not fail the upload.
    pub fn upload_image(&mut self, mime: &str, bytes: &[u8]) -> SessionResult<String> {
        let data_url = match to_data_url(mime, bytes) {
            Ok(url) => url,
            Err(err) => return self.fail("upload_image", SessionError::InvalidImage(err)),
        };

        if let Err(err) = self.gateway.cache_uploaded_image(data_url.as_str()) {
            warn!(
                "event=image_cache module=session status=error session_id={} bytes={} error={}",
                self.id,
                data_url.len(),
                err
            );
        }
        Ok(data_url)
    }

    /// Image-by-URL uploads need no processing.
    pub fn upload_image_url(&self, url: &str) -> String {
        url.trim().to_string()
    }

    /// Drains queued notices, oldest first.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Last restored, imported or snapshotted document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Last published character count.
    pub fn char_count(&self) -> usize {
        self.char_count
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn has_pending_render(&self) -> bool {
        self.pending_render.is_some()
    }

    pub fn editor(&self) -> &E {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut E {
        &mut self.editor
    }

    pub fn gateway(&self) -> &PersistenceGateway<S> {
        &self.gateway
    }

    fn snapshot(&mut self, action: &'static str) -> SessionResult<Document> {
        if !self.editor.is_ready() {
            return self.fail(action, SessionError::EditorUnavailable(EditorError::NotReady));
        }
        // Restored content must reach the editor before we read it back.
        self.flush_pending_render()?;

        match self.editor.save() {
            Ok(output) => Ok(Document::new(
                self.title.clone(),
                normalize_owned(output.blocks),
            )),
            Err(err) => self.fail(action, SessionError::EditorUnavailable(err)),
        }
    }

    fn adopt(&mut self, document: Document) {
        self.char_count = count(&document);
        self.document = document;
    }

    fn flush_pending_render(&mut self) -> SessionResult<()> {
        match self.render_pending() {
            Ok(()) => Ok(()),
            Err(err) => self.fail("render", SessionError::RenderFailure(err)),
        }
    }

    /// Renders pending blocks; on rejection they stay pending for the next try.
    fn render_pending(&mut self) -> Result<(), EditorError> {
        if !self.editor.is_ready() {
            return Ok(());
        }
        let Some(blocks) = self.pending_render.take() else {
            return Ok(());
        };

        match self.editor.render(&blocks) {
            Ok(()) => {
                info!(
                    "event=editor_render module=session status=ok session_id={} blocks={}",
                    self.id,
                    blocks.len()
                );
                Ok(())
            }
            Err(err) => {
                self.pending_render = Some(blocks);
                Err(err)
            }
        }
    }

    fn fail<T>(&mut self, action: &'static str, err: SessionError) -> SessionResult<T> {
        error!(
            "event=session_{} module=session status=error session_id={} error_code={} error={}",
            action,
            self.id,
            err.code(),
            err
        );
        self.notices.push(Notice::error(err.code(), err.user_message()));
        Err(err)
    }

    fn transition(&mut self, next: SessionState) {
        debug!(
            "event=session_state module=session status=ok session_id={} from={} to={}",
            self.id,
            self.state.as_str(),
            next.as_str()
        );
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::{Session, SessionError, SessionState, TickOutcome, TickSkip};
    use crate::config::SessionConfig;
    use crate::editor::BufferedEditor;
    use crate::model::block::Block;
    use crate::service::notice::NoticeLevel;
    use crate::store::{KvStore, MemoryKvStore, EDITOR_DATA_KEY};

    fn ready_editor() -> BufferedEditor {
        let mut editor = BufferedEditor::new();
        editor.mark_ready();
        editor
    }

    #[test]
    fn empty_store_starts_ready_with_empty_document() {
        let mut session = Session::start(ready_editor(), MemoryKvStore::new(), SessionConfig::default());
        assert_eq!(session.state(), SessionState::Ready);
        assert!(session.document().is_empty());
        assert!(session.take_notices().is_empty());
        assert!(!session.has_pending_render());
    }

    #[test]
    fn restore_waits_for_editor_readiness() {
        let store = MemoryKvStore::new();
        store
            .set(
                EDITOR_DATA_KEY,
                r#"{"title":"T","content":[{"type":"raw","data":{"html":"<b>x</b>"}}]}"#,
            )
            .expect("seed");

        let mut session = Session::start(BufferedEditor::new(), store, SessionConfig::default());
        assert!(session.has_pending_render());
        assert_eq!(
            session.recount_tick(),
            TickOutcome::Skipped(TickSkip::EditorNotReady)
        );

        session.editor_mut().mark_ready();
        session.editor_ready().expect("render should succeed");
        let rendered = session.editor_mut().take_render().expect("render queued");
        assert_eq!(rendered, vec![Block::paragraph("<b>x</b>")]);
        assert_eq!(session.recount_tick(), TickOutcome::Published(1));
    }

    #[test]
    fn save_before_ready_is_an_editor_error_notice() {
        let mut session =
            Session::start(BufferedEditor::new(), MemoryKvStore::new(), SessionConfig::default());
        let err = session.save().expect_err("editor is not ready");
        assert!(matches!(err, SessionError::EditorUnavailable(_)));

        let notices = session.take_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Error);
        assert_eq!(notices[0].code, "editor_unavailable");
        assert_eq!(session.state(), SessionState::Ready);
    }
}
