//! Host-driven editor adapter.
//!
//! The host pushes the editor's latest `save()` output with [`push_state`] and
//! drains render requests with [`take_render`]. Render requests containing a
//! kind the host has not registered are rejected the way the editor would.
//!
//! [`push_state`]: BufferedEditor::push_state
//! [`take_render`]: BufferedEditor::take_render

use super::{EditorError, EditorOutput, EditorPort};
use crate::model::block::{Block, BlockKind};
use std::collections::BTreeSet;

#[derive(Debug, Default)]
pub struct BufferedEditor {
    ready: bool,
    current: Vec<Block>,
    pending_render: Option<Vec<Block>>,
    /// `None` accepts every kind.
    registered_kinds: Option<BTreeSet<String>>,
}

impl BufferedEditor {
    /// Adapter accepting every block kind.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adapter accepting only `kinds` (by `type` string) on render.
    pub fn with_registered_kinds<'a>(kinds: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            registered_kinds: Some(kinds.into_iter().map(str::to_string).collect()),
            ..Self::default()
        }
    }

    /// Adapter registering the stock tool set (`BlockKind::known_kinds`).
    pub fn with_stock_tools() -> Self {
        Self::with_registered_kinds(BlockKind::known_kinds().iter().map(BlockKind::as_str))
    }

    pub fn mark_ready(&mut self) {
        self.ready = true;
    }

    /// Records the editor's latest content.
    pub fn push_state(&mut self, output: EditorOutput) {
        self.current = output.blocks;
    }

    /// Parses and records editor `save()` output JSON.
    pub fn push_state_json(&mut self, json: &str) -> Result<(), serde_json::Error> {
        let output: EditorOutput = serde_json::from_str(json)?;
        self.push_state(output);
        Ok(())
    }

    /// Returns and clears the most recent render request.
    pub fn take_render(&mut self) -> Option<Vec<Block>> {
        self.pending_render.take()
    }

    pub fn current_blocks(&self) -> &[Block] {
        &self.current
    }
}

impl EditorPort for BufferedEditor {
    fn is_ready(&self) -> bool {
        self.ready
    }

    fn save(&mut self) -> Result<EditorOutput, EditorError> {
        if !self.ready {
            return Err(EditorError::NotReady);
        }
        Ok(EditorOutput {
            blocks: self.current.clone(),
        })
    }

    fn render(&mut self, blocks: &[Block]) -> Result<(), EditorError> {
        if !self.ready {
            return Err(EditorError::NotReady);
        }
        if let Some(registered) = &self.registered_kinds {
            if let Some(block) = blocks
                .iter()
                .find(|block| !registered.contains(block.kind.as_str()))
            {
                return Err(EditorError::RenderRejected(format!(
                    "no tool registered for block type `{}`",
                    block.kind
                )));
            }
        }

        self.current = blocks.to_vec();
        self.pending_render = Some(blocks.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::BufferedEditor;
    use crate::editor::{EditorError, EditorPort};
    use crate::model::block::Block;

    #[test]
    fn save_before_ready_is_rejected() {
        let mut editor = BufferedEditor::new();
        assert_eq!(editor.save(), Err(EditorError::NotReady));
    }

    #[test]
    fn render_updates_current_and_queues_for_host() {
        let mut editor = BufferedEditor::new();
        editor.mark_ready();
        editor
            .render(&[Block::paragraph("hi")])
            .expect("render should succeed");

        assert_eq!(editor.current_blocks().len(), 1);
        assert_eq!(editor.take_render().map(|blocks| blocks.len()), Some(1));
        assert!(editor.take_render().is_none());
    }

    #[test]
    fn stock_tools_reject_unknown_kind() {
        let mut editor = BufferedEditor::with_stock_tools();
        editor.mark_ready();
        editor
            .push_state_json(r#"{"time": 1, "blocks": [{"type": "callout", "data": {}}], "version": "2.30"}"#)
            .expect("valid editor output");
        let blocks = editor.save().expect("save").blocks;

        let err = editor.render(&blocks).expect_err("callout is not registered");
        assert!(matches!(err, EditorError::RenderRejected(_)));
    }
}
