use crate::document::Document;
use crate::font_manager::TextMeasurer;
use crate::geometry::{hit_test, Point};
use crate::model::{AreaId, ElementId};

/// Tracks the active area and the (single) selected element.
///
/// # Selection Model
///
/// - At most one element is selected at a time.
/// - Selecting an element in another area makes that area active.
/// - Switching the active area clears the selection.
/// - A selection that no longer resolves to a live element is dropped by
///   [`SelectionManager::revalidate`].
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionManager {
    selected_id: Option<ElementId>,
    active_area: AreaId,
}

impl SelectionManager {
    /// Creates a new `SelectionManager` with the front area active.
    ///
    /// # Examples
    ///
    /// ```
    /// use teekit_designer::selection_manager::SelectionManager;
    /// use teekit_designer::AreaId;
    ///
    /// let manager = SelectionManager::new();
    /// assert_eq!(manager.selected_id(), None);
    /// assert_eq!(manager.active_area(), AreaId::Front);
    /// ```
    pub fn new() -> Self {
        Self {
            selected_id: None,
            active_area: AreaId::Front,
        }
    }

    pub fn selected_id(&self) -> Option<ElementId> {
        self.selected_id
    }

    pub fn active_area(&self) -> AreaId {
        self.active_area
    }

    /// Select a live element. Unknown ids are ignored.
    ///
    /// Returns true if the selection or active area changed.
    pub fn select(&mut self, id: ElementId, doc: &Document) -> bool {
        let Some(element) = doc.element(id) else {
            tracing::debug!("Ignoring selection of unknown element {}", id);
            return false;
        };
        let changed = self.selected_id != Some(id) || self.active_area != element.area_id;
        self.active_area = element.area_id;
        self.selected_id = Some(id);
        changed
    }

    /// Returns true if something was selected
    pub fn clear(&mut self) -> bool {
        self.selected_id.take().is_some()
    }

    /// Switch the active area, clearing the selection.
    ///
    /// Returns true if anything changed.
    pub fn set_active_area(&mut self, area: AreaId) -> bool {
        if self.active_area == area {
            return false;
        }
        self.active_area = area;
        self.selected_id = None;
        true
    }

    /// Select the top-most element of the active area under `point`.
    /// A miss clears the selection.
    pub fn select_at(
        &mut self,
        point: Point,
        doc: &Document,
        measurer: &dyn TextMeasurer,
    ) -> Option<ElementId> {
        let hit = doc
            .elements_in(self.active_area)
            .into_iter()
            .rev()
            .find(|element| hit_test(point, element, measurer))
            .map(|element| element.id);
        self.selected_id = hit;
        hit
    }

    /// Drop a selection that no longer refers to a live element.
    ///
    /// Returns true if the selection was cleared.
    pub fn revalidate(&mut self, doc: &Document) -> bool {
        match self.selected_id {
            Some(id) if !doc.contains(id) => {
                self.selected_id = None;
                true
            }
            _ => false,
        }
    }
}

impl Default for SelectionManager {
    fn default() -> Self {
        Self::new()
    }
}
