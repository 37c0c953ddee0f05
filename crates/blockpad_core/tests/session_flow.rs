use blockpad_core::store::{EDITOR_DATA_KEY, THEME_KEY, UPLOADED_IMAGE_KEY};
use blockpad_core::{
    Block, BlockKind, BufferedEditor, EditorError, EditorOutput, EditorPort, KvStore,
    MemoryKvStore, NoticeLevel, Session, SessionConfig, SessionError, SessionState, SqliteKvStore,
    Theme, TickOutcome, TickSkip,
};
use serde_json::json;

fn ready_editor() -> BufferedEditor {
    let mut editor = BufferedEditor::new();
    editor.mark_ready();
    editor
}

fn editor_output(value: serde_json::Value) -> EditorOutput {
    serde_json::from_value(value).unwrap()
}

/// Editor whose `save()` always fails, to exercise snapshot errors.
struct BrokenEditor;

impl EditorPort for BrokenEditor {
    fn is_ready(&self) -> bool {
        true
    }

    fn save(&mut self) -> Result<EditorOutput, EditorError> {
        Err(EditorError::SaveRejected("holder element missing".to_string()))
    }

    fn render(&mut self, _blocks: &[Block]) -> Result<(), EditorError> {
        Ok(())
    }
}

#[test]
fn corrupt_snapshot_on_startup_warns_and_starts_empty() {
    let store = MemoryKvStore::new();
    store.set(EDITOR_DATA_KEY, "]]garbage[[").unwrap();

    let mut session = Session::start(ready_editor(), store, SessionConfig::default());

    assert_eq!(session.state(), SessionState::Ready);
    assert!(session.document().is_empty());
    let notices = session.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Warning);
    assert_eq!(notices[0].code, "corrupt_snapshot");

    // The corrupt payload is left in place, not retried or overwritten.
    assert_eq!(
        session.gateway().store().get(EDITOR_DATA_KEY).unwrap().as_deref(),
        Some("]]garbage[[")
    );
}

#[test]
fn startup_restores_and_normalizes_legacy_blocks() {
    let store = MemoryKvStore::new();
    store
        .set(
            EDITOR_DATA_KEY,
            &json!({
                "title": "Legacy",
                "content": [
                    {"id": "r", "type": "raw", "data": {"html": "<i>xy</i>z"}},
                    {"id": "q", "type": "quote", "data": {"text": "hi", "caption": ""}}
                ]
            })
            .to_string(),
        )
        .unwrap();

    let mut session = Session::start(ready_editor(), store, SessionConfig::default());

    assert_eq!(session.title(), "Legacy");
    assert_eq!(session.char_count(), 5);
    let rendered = session.editor_mut().take_render().expect("restored content rendered");
    assert_eq!(rendered.len(), 2);
    assert_eq!(rendered[0].kind, BlockKind::Paragraph);
    assert_eq!(rendered[0].id(), Some("r"));
    assert_eq!(rendered[0].data_str("text"), Some("<i>xy</i>z"));
}

#[test]
fn save_snapshots_current_editor_state_with_title() {
    let mut session = Session::start(ready_editor(), MemoryKvStore::new(), SessionConfig::default());
    session.set_title("Draft");
    session
        .editor_mut()
        .push_state(editor_output(json!({"blocks": [{"type": "paragraph", "data": {"text": "hello"}}]})));

    session.save().unwrap();

    let stored = session.gateway().load().unwrap().unwrap();
    assert_eq!(stored.title, "Draft");
    assert_eq!(stored.blocks, vec![Block::paragraph("hello")]);
    assert_eq!(session.char_count(), 5);

    // A later edit must be picked up by the next save, not the cached copy.
    session
        .editor_mut()
        .push_state(editor_output(json!({"blocks": [{"type": "paragraph", "data": {"text": "bye"}}]})));
    session.save().unwrap();
    let stored = session.gateway().load().unwrap().unwrap();
    assert_eq!(stored.blocks, vec![Block::paragraph("bye")]);
}

#[test]
fn save_normalizes_raw_blocks_coming_from_the_editor() {
    let mut session = Session::start(ready_editor(), MemoryKvStore::new(), SessionConfig::default());
    session
        .editor_mut()
        .push_state(editor_output(json!({"blocks": [{"type": "raw", "data": {"html": "<b>a</b>"}}]})));

    session.save().unwrap();

    let stored = session.gateway().load().unwrap().unwrap();
    assert_eq!(stored.blocks, vec![Block::paragraph("<b>a</b>")]);
}

#[test]
fn storage_failure_is_reported_and_session_stays_ready() {
    let mut session = Session::start(
        ready_editor(),
        MemoryKvStore::with_quota(16),
        SessionConfig::default(),
    );
    session.set_title("A title that does not fit");
    session
        .editor_mut()
        .push_state(editor_output(json!({"blocks": [{"type": "paragraph", "data": {"text": "x"}}]})));

    let err = session.save().unwrap_err();
    assert!(matches!(err, SessionError::StorageFailure(_)));
    assert_eq!(err.code(), "storage_failure");
    assert_eq!(session.state(), SessionState::Ready);

    let notices = session.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Error);
    assert_eq!(notices[0].code, "storage_failure");
    assert_eq!(session.recount_tick(), TickOutcome::Published(1));
}

#[test]
fn failed_imports_leave_prior_document_untouched() {
    let mut session = Session::start(ready_editor(), MemoryKvStore::new(), SessionConfig::default());
    session
        .import(br#"{"title":"Kept","content":[{"type":"paragraph","data":{"text":"keep"}}]}"#)
        .unwrap();
    let before = session.document().clone();
    session.editor_mut().take_render();

    let shape_err = session
        .import(br#"{"title":"T","content":"not-an-array"}"#)
        .unwrap_err();
    assert!(matches!(shape_err, SessionError::ImportShapeError(_)));

    let parse_err = session.import(b"not valid json at all").unwrap_err();
    assert!(matches!(parse_err, SessionError::CorruptSnapshot(_)));

    assert_eq!(session.document(), &before);
    assert_eq!(session.title(), "Kept");
    assert!(session.editor_mut().take_render().is_none());

    let codes: Vec<_> = session.take_notices().iter().map(|notice| notice.code).collect();
    assert_eq!(codes, vec!["import_shape_error", "corrupt_snapshot"]);
}

#[test]
fn import_normalizes_replaces_and_renders() {
    let mut session = Session::start(ready_editor(), MemoryKvStore::new(), SessionConfig::default());
    let payload = json!({
        "title": "Imported",
        "content": [
            {"type": "list", "data": {"items": ["<b>ab</b>", "c"]}},
            {"type": "raw", "data": {"html": "<i>xy</i>z"}}
        ]
    })
    .to_string();

    let document = session.import(payload.as_bytes()).unwrap();
    assert_eq!(document.title, "Imported");
    assert_eq!(document.blocks[1], Block::paragraph("<i>xy</i>z"));
    assert_eq!(session.char_count(), 6);
    assert_eq!(session.title(), "Imported");

    let rendered = session.editor_mut().take_render().unwrap();
    assert_eq!(rendered.len(), 2);
    assert_eq!(session.recount_tick(), TickOutcome::Published(6));
}

#[test]
fn import_with_unregistered_kind_is_render_failure() {
    let mut editor = BufferedEditor::with_stock_tools();
    editor.mark_ready();
    let mut session = Session::start(editor, MemoryKvStore::new(), SessionConfig::default());

    let err = session
        .import(br#"{"title":"T","content":[{"type":"poll","data":{}}]}"#)
        .unwrap_err();
    assert!(matches!(err, SessionError::RenderFailure(_)));
    assert_eq!(session.state(), SessionState::Ready);
    assert_eq!(session.take_notices()[0].code, "render_failure");
}

#[test]
fn rejected_restore_render_keeps_stored_snapshot_on_save() {
    let saved = r#"{"title":"Saved","content":[{"type":"paragraph","data":{"text":"important"}},{"type":"checklist","data":{"items":[{"text":"a","checked":true}]}}]}"#;
    let store = MemoryKvStore::new();
    store.set(EDITOR_DATA_KEY, saved).unwrap();
    let mut editor = BufferedEditor::with_stock_tools();
    editor.mark_ready();

    let mut session = Session::start(editor, store, SessionConfig::default());
    assert_eq!(session.take_notices()[0].code, "render_failure");
    assert!(session.has_pending_render());
    assert_eq!(session.document().block_count(), 2);

    let err = session.save().unwrap_err();
    assert!(matches!(err, SessionError::RenderFailure(_)));
    assert!(session.export().is_err());
    assert_eq!(
        session.recount_tick(),
        TickOutcome::Skipped(TickSkip::EditorRejected)
    );

    assert_eq!(
        session.gateway().store().get(EDITOR_DATA_KEY).unwrap().as_deref(),
        Some(saved)
    );
    assert!(session.has_pending_render());
    assert_eq!(session.document().blocks[1].kind.as_str(), "checklist");
}

#[test]
fn rejected_import_render_keeps_title_and_document() {
    let mut editor = BufferedEditor::with_stock_tools();
    editor.mark_ready();
    let mut session = Session::start(editor, MemoryKvStore::new(), SessionConfig::default());
    session.set_title("Mine");
    session
        .editor_mut()
        .push_state(editor_output(json!({"blocks": [{"type": "paragraph", "data": {"text": "keep me"}}]})));
    session.save().unwrap();

    let err = session
        .import(br#"{"title":"Other","content":[{"type":"poll","data":{}}]}"#)
        .unwrap_err();
    assert!(matches!(err, SessionError::RenderFailure(_)));
    assert_eq!(session.title(), "Mine");
    assert_eq!(session.document().blocks, vec![Block::paragraph("keep me")]);
    assert!(!session.has_pending_render());

    session.save().unwrap();
    let stored = session.gateway().load().unwrap().unwrap();
    assert_eq!(stored.title, "Mine");
    assert_eq!(stored.blocks, vec![Block::paragraph("keep me")]);
}

#[test]
fn export_snapshots_editor_and_names_file() {
    let config = SessionConfig {
        export_file_prefix: "notes".to_string(),
        ..SessionConfig::default()
    };
    let mut session = Session::start(ready_editor(), MemoryKvStore::new(), config);
    session.set_title("Exported");
    session
        .editor_mut()
        .push_state(editor_output(json!({"blocks": [{"type": "code", "data": {"code": "<x>"}}]})));

    let file = session.export().unwrap();
    assert!(file.file_name.starts_with("notes-"));
    let value: serde_json::Value = serde_json::from_slice(&file.bytes).unwrap();
    assert_eq!(value["title"], "Exported");
    assert_eq!(value["content"][0]["data"]["code"], "<x>");
    assert_eq!(session.char_count(), 3);
}

#[test]
fn editor_snapshot_rejection_is_editor_unavailable() {
    let mut session = Session::start(BrokenEditor, MemoryKvStore::new(), SessionConfig::default());

    assert!(matches!(
        session.export().unwrap_err(),
        SessionError::EditorUnavailable(EditorError::SaveRejected(_))
    ));
    assert_eq!(
        session.recount_tick(),
        TickOutcome::Skipped(TickSkip::EditorRejected)
    );
    assert_eq!(session.take_notices().len(), 1);
}

#[test]
fn theme_toggle_persists_across_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.db");

    {
        let store = SqliteKvStore::open(&path).unwrap();
        let mut session = Session::start(ready_editor(), store, SessionConfig::default());
        assert_eq!(session.theme(), Theme::Light);
        session.set_theme(Theme::Dark).unwrap();
    }

    let store = SqliteKvStore::open(&path).unwrap();
    assert_eq!(store.get(THEME_KEY).unwrap().as_deref(), Some("dark"));
    let session = Session::start(ready_editor(), store, SessionConfig::default());
    assert_eq!(session.theme(), Theme::Dark);
}

#[test]
fn saved_document_is_restored_by_next_session() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("restore.db");

    {
        let store = SqliteKvStore::open(&path).unwrap();
        let mut session = Session::start(ready_editor(), store, SessionConfig::default());
        session.set_title("Persisted");
        session.editor_mut().push_state(editor_output(
            json!({"blocks": [{"type": "header", "data": {"text": "Top", "level": 1}}]}),
        ));
        session.save().unwrap();
    }

    let store = SqliteKvStore::open(&path).unwrap();
    let mut session = Session::start(BufferedEditor::new(), store, SessionConfig::default());
    assert_eq!(session.title(), "Persisted");
    assert!(session.has_pending_render());

    session.editor_mut().mark_ready();
    assert_eq!(session.recount_tick(), TickOutcome::Published(3));
    assert!(!session.has_pending_render());
}

#[test]
fn image_upload_returns_data_url_and_caches_it() {
    let mut session = Session::start(ready_editor(), MemoryKvStore::new(), SessionConfig::default());

    let url = session.upload_image("image/png", b"\x89PNG").unwrap();
    assert!(url.starts_with("data:image/png;base64,"));
    assert_eq!(
        session.gateway().store().get(UPLOADED_IMAGE_KEY).unwrap(),
        Some(url)
    );

    let err = session.upload_image("application/pdf", b"%PDF").unwrap_err();
    assert_eq!(err.code(), "invalid_image");
    assert_eq!(
        session.upload_image_url(" https://example.com/a.png "),
        "https://example.com/a.png"
    );
}
