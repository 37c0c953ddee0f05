//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose the document session (save/export/import/recount/theme/image)
//!   to the host UI via FRB.
//! - Bridge the host's editor widget through `BufferedEditor`.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - One process-wide session; user actions wait for it, recount ticks are
//!   dropped while it is busy.
//! - Return values are UTF-8 strings / envelopes with stable meaning.

use blockpad_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    init_logging_with, Block, BufferedEditor, CoreConfig, EditorOutput, Notice, Session,
    SessionError, SqliteKvStore, Theme, TickOutcome, TickSkip,
};
use log::warn;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError, TryLockError};

const SESSION_DB_FILE_NAME: &str = "blockpad_session.sqlite3";
static SESSION_DB_PATH: OnceLock<PathBuf> = OnceLock::new();

type HostSession = Session<BufferedEditor, SqliteKvStore>;

static SESSION: Mutex<Option<HostSession>> = Mutex::new(None);
/// Count reported by ticks that find the session busy.
static LAST_CHAR_COUNT: AtomicU64 = AtomicU64::new(0);

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Generic action envelope for session calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionActionResponse {
    /// Whether the action completed.
    pub ok: bool,
    /// Stable error code (`storage_failure`, `import_shape_error`, ...).
    pub error_code: Option<String>,
    /// Current title after the action.
    pub title: Option<String>,
    /// Human-readable message for diagnostics/UI.
    pub message: String,
}

impl SessionActionResponse {
    fn success(message: impl Into<String>, title: Option<String>) -> Self {
        Self {
            ok: true,
            error_code: None,
            title,
            message: message.into(),
        }
    }

    fn failure(error_code: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            error_code: error_code.map(str::to_string),
            title: None,
            message: message.into(),
        }
    }

    fn from_session_error(err: &SessionError) -> Self {
        Self::failure(Some(err.code()), err.user_message())
    }
}

/// Envelope for `session_open`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOpenResponse {
    pub ok: bool,
    /// Stable error code (`invalid_config`, `logging_failed`, `storage_failure`).
    pub error_code: Option<String>,
    /// Restored title on success.
    pub title: Option<String>,
    /// Period the host should call `session_tick` with, on success.
    pub recount_interval_ms: Option<u64>,
    pub message: String,
}

impl SessionOpenResponse {
    fn failure(error_code: &str, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            error_code: Some(error_code.to_string()),
            title: None,
            recount_interval_ms: None,
            message: message.into(),
        }
    }
}

/// Export envelope carrying the file to download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionExportResponse {
    pub ok: bool,
    /// `editor-export-YYYYMMDD-HHMMSS.json` on success.
    pub file_name: Option<String>,
    /// Pretty-printed JSON contents on success.
    pub contents: Option<String>,
    pub message: String,
}

/// Recount tick envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTickResponse {
    /// Whether a new count was published.
    pub published: bool,
    /// Latest published count (previous value when skipped).
    pub char_count: u64,
    /// `published|editor_not_ready|busy|editor_rejected|no_session`.
    pub status: String,
}

/// One user-visible notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionNotice {
    /// `warning|error`.
    pub level: String,
    pub code: String,
    pub message: String,
}

/// Opens (or reopens) the process-wide session and restores the saved document.
///
/// `config_json` may be empty to use defaults. When `logging.log_dir` is set,
/// file logging is initialized from the `logging` section first.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics. A corrupt snapshot still opens (see notices).
#[flutter_rust_bridge::frb(sync)]
pub fn session_open(config_json: String) -> SessionOpenResponse {
    let config = if config_json.trim().is_empty() {
        CoreConfig::default()
    } else {
        match CoreConfig::from_json_str(config_json.as_str()) {
            Ok(config) => config,
            Err(err) => {
                return SessionOpenResponse::failure(
                    "invalid_config",
                    format!("session_open failed: {err}"),
                )
            }
        }
    };

    if config.logging.log_dir.is_some() {
        if let Err(err) = init_logging_with(&config.logging) {
            return SessionOpenResponse::failure(
                "logging_failed",
                format!("session_open failed: {err}"),
            );
        }
    }

    let db_path = resolve_session_db_path();
    let store = match SqliteKvStore::open(&db_path) {
        Ok(store) => store,
        Err(err) => {
            return SessionOpenResponse::failure(
                "storage_failure",
                format!("session_open failed: {err}"),
            )
        }
    };

    let recount_interval_ms = config.session.recount_interval_ms;
    let session = Session::start(BufferedEditor::with_stock_tools(), store, config.session);
    let title = session.title().to_string();
    let message = format!("Session opened with {} block(s).", session.document().block_count());
    remember_count(&session);
    *lock_session() = Some(session);
    SessionOpenResponse {
        ok: true,
        error_code: None,
        title: Some(title),
        recount_interval_ms: Some(recount_interval_ms),
        message,
    }
}

/// Updates the live title input value.
#[flutter_rust_bridge::frb(sync)]
pub fn session_set_title(title: String) -> SessionActionResponse {
    with_session(|session| {
        session.set_title(title);
        SessionActionResponse::success("Title updated.", Some(session.title().to_string()))
    })
}

/// Signals the editor widget is ready; flushes any deferred restore render.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_mark_ready() -> SessionActionResponse {
    with_session(|session| {
        session.editor_mut().mark_ready();
        match session.editor_ready() {
            Ok(()) => SessionActionResponse::success("Editor ready.", None),
            Err(err) => SessionActionResponse::from_session_error(&err),
        }
    })
}

/// Pushes the editor widget's latest `save()` output (`{"blocks": [...]}`).
#[flutter_rust_bridge::frb(sync)]
pub fn editor_push_state(output_json: String) -> SessionActionResponse {
    with_session(
        |session| match session.editor_mut().push_state_json(output_json.as_str()) {
            Ok(()) => SessionActionResponse::success("Editor state updated.", None),
            Err(err) => SessionActionResponse::failure(
                Some("invalid_editor_output"),
                format!("editor_push_state failed: {err}"),
            ),
        },
    )
}

/// Returns the pending render request as `{"blocks": [...]}` JSON, if any.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_take_render() -> Option<String> {
    let mut guard = lock_session();
    let blocks = guard.as_mut()?.editor_mut().take_render()?;
    match render_json(blocks) {
        Ok(json) => Some(json),
        Err(err) => {
            warn!("event=editor_take_render module=ffi status=error error={err}");
            None
        }
    }
}

/// Save button: snapshots the editor and writes it to storage.
///
/// # FFI contract
/// - Async on the host side; waits for any in-flight session call.
pub fn session_save() -> SessionActionResponse {
    with_session(|session| match session.save() {
        Ok(()) => SessionActionResponse::success("Saved.", Some(session.title().to_string())),
        Err(err) => SessionActionResponse::from_session_error(&err),
    })
}

/// Export button: snapshots the editor and returns the download payload.
pub fn session_export() -> SessionExportResponse {
    let mut guard = lock_session();
    let Some(session) = guard.as_mut() else {
        return SessionExportResponse {
            ok: false,
            file_name: None,
            contents: None,
            message: "session is not open".to_string(),
        };
    };

    match session.export() {
        Ok(file) => {
            let contents = String::from_utf8_lossy(&file.bytes).into_owned();
            SessionExportResponse {
                ok: true,
                message: format!("Exported {}.", file.file_name),
                file_name: Some(file.file_name),
                contents: Some(contents),
            }
        }
        Err(err) => SessionExportResponse {
            ok: false,
            file_name: None,
            contents: None,
            message: err.user_message(),
        },
    }
}

/// File input change: imports an export file's bytes.
pub fn session_import(contents: Vec<u8>) -> SessionActionResponse {
    with_session(|session| match session.import(&contents) {
        Ok(document) => SessionActionResponse::success(
            format!("Imported {} block(s).", document.block_count()),
            Some(document.title.clone()),
        ),
        Err(err) => SessionActionResponse::from_session_error(&err),
    })
}

/// Periodic recount tick. Dropped (not queued) while the session is busy.
#[flutter_rust_bridge::frb(sync)]
pub fn session_tick() -> SessionTickResponse {
    let mut guard = match SESSION.try_lock() {
        Ok(guard) => guard,
        Err(TryLockError::WouldBlock) => {
            return tick_response(None, "busy", LAST_CHAR_COUNT.load(Ordering::Relaxed))
        }
        Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
    };
    let Some(session) = guard.as_mut() else {
        return tick_response(None, "no_session", 0);
    };

    let outcome = session.recount_tick();
    let status = match outcome {
        TickOutcome::Published(_) => "published",
        TickOutcome::Skipped(TickSkip::EditorNotReady) => "editor_not_ready",
        TickOutcome::Skipped(TickSkip::EditorRejected) => "editor_rejected",
    };
    remember_count(session);
    tick_response(Some(outcome), status, session.char_count() as u64)
}

/// Theme toggle change.
#[flutter_rust_bridge::frb(sync)]
pub fn session_set_theme(dark: bool) -> SessionActionResponse {
    let theme = if dark { Theme::Dark } else { Theme::Light };
    with_session(|session| match session.set_theme(theme) {
        Ok(()) => SessionActionResponse::success(theme.as_str(), None),
        Err(err) => SessionActionResponse::from_session_error(&err),
    })
}

/// Returns whether the persisted theme is dark.
#[flutter_rust_bridge::frb(sync)]
pub fn session_is_dark_theme() -> bool {
    lock_session()
        .as_ref()
        .is_some_and(|session| session.theme().is_dark())
}

/// Image tool upload-by-file: returns the data URL in `message` on success.
pub fn session_upload_image(mime: String, bytes: Vec<u8>) -> SessionActionResponse {
    with_session(|session| match session.upload_image(mime.as_str(), &bytes) {
        Ok(url) => SessionActionResponse::success(url, None),
        Err(err) => SessionActionResponse::from_session_error(&err),
    })
}

/// Drains queued user-visible notices.
#[flutter_rust_bridge::frb(sync)]
pub fn session_take_notices() -> Vec<SessionNotice> {
    lock_session()
        .as_mut()
        .map(|session| session.take_notices())
        .unwrap_or_default()
        .into_iter()
        .map(to_session_notice)
        .collect()
}

fn tick_response(outcome: Option<TickOutcome>, status: &str, char_count: u64) -> SessionTickResponse {
    SessionTickResponse {
        published: matches!(outcome, Some(TickOutcome::Published(_))),
        char_count,
        status: status.to_string(),
    }
}

fn to_session_notice(notice: Notice) -> SessionNotice {
    SessionNotice {
        level: notice.level.as_str().to_string(),
        code: notice.code.to_string(),
        message: notice.message,
    }
}

fn render_json(blocks: Vec<Block>) -> Result<String, String> {
    EditorOutput { blocks }
        .to_json()
        .map_err(|err| err.to_string())
}

fn lock_session() -> MutexGuard<'static, Option<HostSession>> {
    SESSION.lock().unwrap_or_else(PoisonError::into_inner)
}

fn with_session(f: impl FnOnce(&mut HostSession) -> SessionActionResponse) -> SessionActionResponse {
    let mut guard = lock_session();
    match guard.as_mut() {
        Some(session) => {
            let response = f(session);
            remember_count(session);
            response
        }
        None => SessionActionResponse::failure(Some("no_session"), "session is not open"),
    }
}

fn remember_count(session: &HostSession) {
    LAST_CHAR_COUNT.store(session.char_count() as u64, Ordering::Relaxed);
}

fn resolve_session_db_path() -> PathBuf {
    SESSION_DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var("BLOCKPAD_DB_PATH") {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(SESSION_DB_FILE_NAME)
        })
        .clone()
}
