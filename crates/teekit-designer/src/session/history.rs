//! Undo/redo functionality

use teekit_core::{Error, Result};

use super::EditorSession;
use crate::history::HistoryStep;

impl EditorSession {
    /// Invert the most recent command
    pub fn undo(&mut self) -> Result<HistoryStep> {
        let open = self.document.as_mut().ok_or(Error::NoDocument)?;
        if open.history.can_undo() && self.interaction.is_dragging() {
            self.interaction.cancel_drag();
        }
        let step = open.slot.update(|doc| open.history.undo(doc))?;
        if step.changed() {
            self.after_change();
        }
        Ok(step)
    }

    /// Re-apply the most recently undone command
    pub fn redo(&mut self) -> Result<HistoryStep> {
        let open = self.document.as_mut().ok_or(Error::NoDocument)?;
        let step = open.slot.update(|doc| open.history.redo(doc))?;
        if step.changed() {
            self.after_change();
        }
        Ok(step)
    }

    pub fn can_undo(&self) -> bool {
        self.open_document()
            .map(|open| open.history.can_undo())
            .unwrap_or(false)
    }

    pub fn can_redo(&self) -> bool {
        self.open_document()
            .map(|open| open.history.can_redo())
            .unwrap_or(false)
    }

    /// Name of the command `undo` would invert
    pub fn undo_name(&self) -> Option<String> {
        self.open_document()
            .ok()
            .and_then(|open| open.history.undo_name().map(str::to_string))
    }

    pub fn redo_name(&self) -> Option<String> {
        self.open_document()
            .ok()
            .and_then(|open| open.history.redo_name().map(str::to_string))
    }
}
