//! Undo/redo stacks for document commands.

use teekit_core::Result;

use crate::commands::DesignerCommand;
use crate::document::Document;
use crate::model::ElementId;

/// Default number of undo steps kept
pub const DEFAULT_MAX_DEPTH: usize = 500;

/// Outcome of an undo or redo request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryStep {
    /// The named command was inverted
    Undone(String),
    /// The named command was re-applied
    Redone(String),
    NothingToUndo,
    NothingToRedo,
}

impl HistoryStep {
    /// Whether the document changed
    pub fn changed(&self) -> bool {
        matches!(self, HistoryStep::Undone(_) | HistoryStep::Redone(_))
    }
}

/// Linear command history for one document
#[derive(Debug, Clone)]
pub struct History {
    undo_stack: Vec<DesignerCommand>,
    redo_stack: Vec<DesignerCommand>,
    max_depth: Option<usize>,
}

impl History {
    pub fn new() -> Self {
        Self::with_max_depth(Some(DEFAULT_MAX_DEPTH))
    }

    /// `None` keeps every command
    pub fn with_max_depth(max_depth: Option<usize>) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_depth: max_depth.map(|d| d.max(1)),
        }
    }

    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    /// Apply a command and record it. Clears the redo stack.
    pub fn execute(&mut self, mut command: DesignerCommand, doc: &mut Document) -> Result<()> {
        command.apply(doc)?;
        doc.touch();
        tracing::debug!("Executed '{}'", command.name());

        self.undo_stack.push(command);
        self.redo_stack.clear();

        if let Some(max_depth) = self.max_depth {
            // Evict only from the bottom so the remaining chain stays invertible
            while self.undo_stack.len() > max_depth {
                let evicted = self.undo_stack.remove(0);
                tracing::trace!("Evicted '{}' from history", evicted.name());
            }
        }
        Ok(())
    }

    pub fn undo(&mut self, doc: &mut Document) -> Result<HistoryStep> {
        let Some(mut command) = self.undo_stack.pop() else {
            return Ok(HistoryStep::NothingToUndo);
        };
        if let Err(err) = command.invert(doc) {
            tracing::warn!("Undo of '{}' failed: {}", command.name(), err);
            self.undo_stack.push(command);
            return Err(err);
        }
        doc.touch();
        let name = command.name().to_string();
        tracing::debug!("Undid '{}'", name);
        self.redo_stack.push(command);
        Ok(HistoryStep::Undone(name))
    }

    pub fn redo(&mut self, doc: &mut Document) -> Result<HistoryStep> {
        let Some(mut command) = self.redo_stack.pop() else {
            return Ok(HistoryStep::NothingToRedo);
        };
        if let Err(err) = command.apply(doc) {
            tracing::warn!("Redo of '{}' failed: {}", command.name(), err);
            self.redo_stack.push(command);
            return Err(err);
        }
        doc.touch();
        let name = command.name().to_string();
        tracing::debug!("Redid '{}'", name);
        self.undo_stack.push(command);
        Ok(HistoryStep::Redone(name))
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    /// Name of the command the next undo would invert
    pub fn undo_name(&self) -> Option<&str> {
        self.undo_stack.last().map(|c| c.name())
    }

    pub fn redo_name(&self) -> Option<&str> {
        self.redo_stack.last().map(|c| c.name())
    }

    /// Whether any command on either stack mentions the element
    pub fn references(&self, id: ElementId) -> bool {
        self.undo_stack
            .iter()
            .chain(self.redo_stack.iter())
            .any(|c| c.references(id))
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}
