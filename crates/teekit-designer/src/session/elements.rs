//! Element creation, updates, removal and paint order.

use serde_json::Value;

use teekit_core::{Error, NotFoundError, Result};

use super::EditorSession;
use crate::commands::DesignerCommand;
use crate::events::HistoryEvent;
use crate::model::{
    create_element, AreaId, Color, Element, ElementId, ElementInit, ElementPatch,
    ElementTransform,
};

/// Offset applied to duplicated elements, in design units
pub const DUPLICATE_OFFSET: f64 = 10.0;

impl EditorSession {
    /// Create an element on top of `area`
    pub fn add_element(&mut self, area: AreaId, init: ElementInit) -> Result<ElementId> {
        self.add_element_at(area, init, None)
    }

    /// Create an element at a paint-order index (clamped; `None` = top)
    pub fn add_element_at(
        &mut self,
        area: AreaId,
        init: ElementInit,
        index: Option<usize>,
    ) -> Result<ElementId> {
        let snapshot = self.document_snapshot()?;
        let id = ElementId(snapshot.next_element_id());
        let images = &self.images;
        let element = create_element(id, area, init, |source| images.natural_size(source))?;
        let command = match index {
            Some(index) => DesignerCommand::add_at(element, index),
            None => DesignerCommand::add(element),
        };
        self.execute(command)?;
        tracing::debug!("Added element {} to {}", id, area);
        Ok(id)
    }

    /// Apply a typed patch. Returns the updated element.
    pub fn update_element(&mut self, id: ElementId, patch: &ElementPatch) -> Result<Element> {
        let before = self.get_element(id)?;
        let after = patch.apply_to(&before)?;
        if after == before {
            return Ok(after);
        }
        self.execute(DesignerCommand::update(before, after.clone()))?;
        Ok(after)
    }

    /// Apply a patch given as a JSON object, rejecting unknown fields
    pub fn update_element_json(&mut self, id: ElementId, patch: &Value) -> Result<Element> {
        let variant = self.get_element(id)?.variant();
        let patch = ElementPatch::from_json(patch, variant)?;
        self.update_element(id, &patch)
    }

    /// Replace an element's transform as one undoable step
    pub fn transform_element(&mut self, id: ElementId, transform: ElementTransform) -> Result<()> {
        transform.validate()?;
        let before = self.get_element(id)?.transform;
        let after = ElementTransform::new(transform.position, transform.rotation, transform.scale);
        if before == after {
            return Ok(());
        }
        self.execute(DesignerCommand::transform(id, before, after))
    }

    /// Undoable removal
    pub fn remove_element(&mut self, id: ElementId) -> Result<()> {
        self.get_element(id)?;
        self.execute(DesignerCommand::remove(id))?;
        tracing::debug!("Removed element {}", id);
        Ok(())
    }

    /// Permanent removal.
    ///
    /// Also accepts an element that only survives as a tombstone in the
    /// history. If any recorded command mentions the element, both history
    /// stacks are discarded.
    pub fn purge_element(&mut self, id: ElementId) -> Result<()> {
        let open = self.document.as_mut().ok_or(Error::NoDocument)?;
        let live = open.slot.load().contains(id);
        let referenced = open.history.references(id);
        if !live && !referenced {
            return Err(NotFoundError::from(id).into());
        }

        if live {
            open.slot.update(|doc| {
                doc.purge_element(id)?;
                doc.touch();
                Ok::<_, Error>(())
            })?;
        }
        if referenced {
            open.history.clear();
            tracing::warn!("Purged element {} was in history; history cleared", id);
        }
        tracing::info!("Purged element {}", id);

        if referenced {
            self.publish(HistoryEvent::Cleared);
        }
        self.after_change();
        Ok(())
    }

    /// Move an element to `index` within its area (clamped)
    pub fn reorder_element(&mut self, id: ElementId, index: usize) -> Result<()> {
        let snapshot = self.document_snapshot()?;
        let element = snapshot.element(id).ok_or(NotFoundError::from(id))?;
        let len = snapshot.area(element.area_id).len();
        let from = snapshot.index_of(id).ok_or(NotFoundError::from(id))?;
        let to = index.min(len.saturating_sub(1));
        if from == to {
            return Ok(());
        }
        self.execute(DesignerCommand::reorder(id, from, to))
    }

    pub fn bring_to_front(&mut self, id: ElementId) -> Result<()> {
        self.reorder_element(id, usize::MAX)
    }

    pub fn send_to_back(&mut self, id: ElementId) -> Result<()> {
        self.reorder_element(id, 0)
    }

    pub fn bring_forward(&mut self, id: ElementId) -> Result<()> {
        let index = self
            .document_snapshot()?
            .index_of(id)
            .ok_or(NotFoundError::from(id))?;
        self.reorder_element(id, index + 1)
    }

    pub fn send_backward(&mut self, id: ElementId) -> Result<()> {
        let index = self
            .document_snapshot()?
            .index_of(id)
            .ok_or(NotFoundError::from(id))?;
        self.reorder_element(id, index.saturating_sub(1))
    }

    pub fn set_area_background(&mut self, area: AreaId, color: Color) -> Result<()> {
        let before = self.document_snapshot()?.area(area).background_color;
        if before == color {
            return Ok(());
        }
        self.execute(DesignerCommand::set_background(area, before, color))
    }

    /// Copy an element, offset and placed directly above the original
    pub fn duplicate_element(&mut self, id: ElementId) -> Result<ElementId> {
        let snapshot = self.document_snapshot()?;
        let source = snapshot.element(id).ok_or(NotFoundError::from(id))?;
        let index = snapshot.index_of(id).ok_or(NotFoundError::from(id))?;
        let new_id = ElementId(snapshot.next_element_id());
        let mut copy = source.with_id(new_id);
        copy.transform = copy.transform.translated(DUPLICATE_OFFSET, DUPLICATE_OFFSET);
        self.execute(DesignerCommand::add_at(copy, index + 1))?;
        Ok(new_id)
    }
}
