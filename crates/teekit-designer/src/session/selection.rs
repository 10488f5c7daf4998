//! Selection, drag gestures and keyboard edits on the selected element.

use teekit_core::{Error, Result, ValidationError};

use super::EditorSession;
use crate::commands::DesignerCommand;
use crate::geometry::{intrinsic_size, Point};
use crate::interaction::DragMode;
use crate::model::{AreaId, Element, ElementId, ElementTransform};

impl EditorSession {
    pub fn get_selection(&self) -> Option<ElementId> {
        self.selection.selected_id()
    }

    pub fn active_area(&self) -> AreaId {
        self.selection.active_area()
    }

    /// Select a live element, switching to its area.
    /// Unknown ids are ignored; returns true if anything changed.
    pub fn select(&mut self, id: ElementId) -> Result<bool> {
        let snapshot = self.document_snapshot()?;
        let changed = self.selection.select(id, &snapshot);
        if changed {
            self.publish_selection();
        }
        Ok(changed)
    }

    pub fn clear_selection(&mut self) -> bool {
        let changed = self.selection.clear();
        if changed {
            self.publish_selection();
        }
        changed
    }

    /// Switch the active area; the selection is cleared
    pub fn set_active_area(&mut self, area: AreaId) -> bool {
        let changed = self.selection.set_active_area(area);
        if changed {
            self.interaction.cancel_drag();
            self.publish_selection();
        }
        changed
    }

    /// Select the top-most element of the active area under `point`
    pub fn select_at(&mut self, point: Point) -> Result<Option<ElementId>> {
        let snapshot = self.document_snapshot()?;
        let before = self.selection.selected_id();
        let hit = self
            .selection
            .select_at(point, &snapshot, self.measurer.as_ref());
        if hit != before {
            self.publish_selection();
        }
        Ok(hit)
    }

    /// Start a drag on the selected element. Returns false when nothing
    /// is selected.
    pub fn begin_drag(&mut self, mode: DragMode, point: Point) -> Result<bool> {
        let Some(id) = self.selection.selected_id() else {
            return Ok(false);
        };
        let element = self.get_element(id)?;
        let intrinsic = intrinsic_size(&element, self.measurer.as_ref());
        self.interaction
            .begin_drag(&element, intrinsic, mode, point)?;
        tracing::debug!("Begin {:?} drag on element {}", mode, id);
        Ok(true)
    }

    /// Update the provisional transform; the document is not touched
    pub fn update_drag(&mut self, point: Point) -> Result<Option<ElementTransform>> {
        Ok(self.interaction.update_drag(point)?)
    }

    /// The dragged element as it would look if the drag ended now
    pub fn preview_element(&self) -> Option<Element> {
        let (id, transform) = self.interaction.provisional()?;
        let mut element = self.get_element(id).ok()?;
        element.transform = transform;
        Some(element)
    }

    /// Commit the drag as one undoable step. Returns false when the
    /// gesture left the element where it was.
    pub fn end_drag(&mut self) -> Result<bool> {
        let Some(command) = self.interaction.end_drag() else {
            return Ok(false);
        };
        self.execute(command)?;
        Ok(true)
    }

    pub fn cancel_drag(&mut self) -> bool {
        self.interaction.cancel_drag()
    }

    /// Move the selected element by a keyboard step
    pub fn nudge(&mut self, dx: f64, dy: f64) -> Result<bool> {
        if !dx.is_finite() || !dy.is_finite() {
            return Err(ValidationError::invalid("offset", "must be finite").into());
        }
        let Some(element) = self.selected_element()? else {
            return Ok(false);
        };
        if dx == 0.0 && dy == 0.0 {
            return Ok(false);
        }
        let after = element.transform.translated(dx, dy);
        self.execute(DesignerCommand::transform(element.id, element.transform, after))?;
        Ok(true)
    }

    /// Rotate the selected element by `delta` degrees
    pub fn rotate_selected(&mut self, delta: f64) -> Result<bool> {
        if !delta.is_finite() {
            return Err(ValidationError::invalid("rotation", "must be finite").into());
        }
        let Some(element) = self.selected_element()? else {
            return Ok(false);
        };
        let after = element.transform.rotated_by(delta);
        if after == element.transform {
            return Ok(false);
        }
        self.execute(DesignerCommand::transform(element.id, element.transform, after))?;
        Ok(true)
    }

    /// Soft-delete the selected element
    pub fn delete_selected(&mut self) -> Result<bool> {
        let Some(element) = self.selected_element()? else {
            return Ok(false);
        };
        self.remove_element(element.id)?;
        Ok(true)
    }

    fn selected_element(&self) -> Result<Option<Element>> {
        if self.document.is_none() {
            return Err(Error::NoDocument);
        }
        Ok(self
            .selection
            .selected_id()
            .and_then(|id| self.get_element(id).ok()))
    }
}
