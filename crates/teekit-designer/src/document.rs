//! Design document: four fixed areas and the element table they reference.
//!
//! Mutating operations return the prior state a command needs to invert
//! them. They validate before touching anything, so a failed call leaves
//! the document unchanged.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use uuid::Uuid;

use teekit_core::{NotFoundError, Result, ValidationError};

use crate::model::{AreaId, Color, Element, ElementId};

/// Default garment colour for new areas
pub const DEFAULT_AREA_BACKGROUND: Color = Color::WHITE;

/// One printable surface and its paint order (index 0 = bottom)
#[derive(Debug, Clone, PartialEq)]
pub struct Area {
    pub id: AreaId,
    pub background_color: Color,
    pub elements: Vec<ElementId>,
}

impl Area {
    pub fn new(id: AreaId) -> Self {
        Self {
            id,
            background_color: DEFAULT_AREA_BACKGROUND,
            elements: Vec::new(),
        }
    }

    pub fn index_of(&self, id: ElementId) -> Option<usize> {
        self.elements.iter().position(|e| *e == id)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// A removed element together with its former paint-order index
#[derive(Debug, Clone, PartialEq)]
pub struct Tombstone {
    pub element: Element,
    pub index: usize,
}

/// Result of a reorder: where the element was and where it ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reorder {
    pub from: usize,
    pub to: usize,
}

#[derive(Debug, Clone)]
pub struct Document {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub last_modified_at: DateTime<Utc>,
    areas: BTreeMap<AreaId, Area>,
    elements: BTreeMap<ElementId, Element>,
    next_element_id: u64,
    revision: u64,
}

/// Structural equality: identity, name and content. Timestamps, the id
/// counter and the revision are bookkeeping and do not participate.
impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.created_at == other.created_at
            && self.areas == other.areas
            && self.elements == other.elements
    }
}

impl Document {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            created_at: now,
            last_modified_at: now,
            areas: AreaId::ALL.iter().map(|id| (*id, Area::new(*id))).collect(),
            elements: BTreeMap::new(),
            next_element_id: 1,
            revision: 0,
        }
    }

    /// Rebuild a document from stored parts, checking reference integrity
    pub(crate) fn from_parts(
        id: Uuid,
        name: String,
        created_at: DateTime<Utc>,
        last_modified_at: DateTime<Utc>,
        areas: BTreeMap<AreaId, Area>,
        elements: BTreeMap<ElementId, Element>,
        next_element_id: u64,
    ) -> Result<Self> {
        let mut areas = areas;
        for id in AreaId::ALL {
            areas.entry(id).or_insert_with(|| Area::new(id));
        }
        let max_id = elements.keys().map(|id| id.0).max().unwrap_or(0);
        let doc = Self {
            id,
            name,
            created_at,
            last_modified_at,
            areas,
            elements,
            next_element_id: next_element_id.max(max_id + 1),
            revision: 0,
        };
        doc.check_integrity()?;
        Ok(doc)
    }

    /// Copy with a new identity, "Copy of" name and fresh timestamps
    pub fn duplicate(&self) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: format!("Copy of {}", self.name),
            created_at: now,
            last_modified_at: now,
            areas: self.areas.clone(),
            elements: self.elements.clone(),
            next_element_id: self.next_element_id,
            revision: 0,
        }
    }

    /// Monotonic change counter, bumped by [`Document::touch`]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn next_element_id(&self) -> u64 {
        self.next_element_id
    }

    /// Reserve a fresh id; ids are never reused within a document
    pub fn allocate_id(&mut self) -> ElementId {
        let id = ElementId(self.next_element_id);
        self.next_element_id += 1;
        id
    }

    /// Record a modification
    pub fn touch(&mut self) {
        self.revision += 1;
        self.last_modified_at = Utc::now();
    }

    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(&id)
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.elements.contains_key(&id)
    }

    pub fn area(&self, id: AreaId) -> &Area {
        // Every AreaId is inserted on construction
        &self.areas[&id]
    }

    fn area_mut(&mut self, id: AreaId) -> Result<&mut Area> {
        self.areas.get_mut(&id).ok_or_else(|| {
            NotFoundError::Area {
                area: id.to_string(),
            }
            .into()
        })
    }

    /// Areas in canonical order
    pub fn areas(&self) -> impl Iterator<Item = &Area> {
        self.areas.values()
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.elements.values()
    }

    /// Elements of an area in paint order, bottom first
    pub fn elements_in(&self, area: AreaId) -> Vec<&Element> {
        self.area(area)
            .elements
            .iter()
            .filter_map(|id| self.elements.get(id))
            .collect()
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Paint-order index of an element within its area
    pub fn index_of(&self, id: ElementId) -> Option<usize> {
        let element = self.elements.get(&id)?;
        self.area(element.area_id).index_of(id)
    }

    /// Insert an element into its area at `index` (clamped; `None` = top).
    /// Returns the index it was placed at.
    pub fn add_element(&mut self, element: Element, index: Option<usize>) -> Result<usize> {
        if self.elements.contains_key(&element.id) {
            return Err(ValidationError::Inconsistent {
                reason: format!("element {} already exists", element.id),
            }
            .into());
        }
        element.validate()?;

        let id = element.id;
        let area = self.area_mut(element.area_id)?;
        let index = index.unwrap_or(area.len()).min(area.len());
        area.elements.insert(index, id);

        self.next_element_id = self.next_element_id.max(id.0 + 1);
        self.elements.insert(id, element);
        Ok(index)
    }

    /// Soft removal: the caller keeps the tombstone for undo
    pub fn remove_element(&mut self, id: ElementId) -> Result<Tombstone> {
        let area_id = self
            .elements
            .get(&id)
            .map(|e| e.area_id)
            .ok_or(NotFoundError::from(id))?;
        let area = self.area_mut(area_id)?;
        let index = area.index_of(id).ok_or_else(|| ValidationError::Inconsistent {
            reason: format!("element {} missing from area {}", id, area_id),
        })?;
        area.elements.remove(index);

        let element = self
            .elements
            .remove(&id)
            .ok_or(NotFoundError::from(id))?;
        Ok(Tombstone { element, index })
    }

    /// Hard removal; history bookkeeping is the caller's concern
    pub fn purge_element(&mut self, id: ElementId) -> Result<Element> {
        self.remove_element(id).map(|tombstone| tombstone.element)
    }

    /// Move an element within its area; `new_index` is clamped to the area
    pub fn reorder_element(&mut self, id: ElementId, new_index: usize) -> Result<Reorder> {
        let area_id = self
            .elements
            .get(&id)
            .map(|e| e.area_id)
            .ok_or(NotFoundError::from(id))?;
        let area = self.area_mut(area_id)?;
        let from = area.index_of(id).ok_or_else(|| ValidationError::Inconsistent {
            reason: format!("element {} missing from area {}", id, area_id),
        })?;
        let to = new_index.min(area.len().saturating_sub(1));
        if from != to {
            let moved = area.elements.remove(from);
            area.elements.insert(to, moved);
        }
        Ok(Reorder { from, to })
    }

    /// Returns the previous background
    pub fn set_area_background(&mut self, area: AreaId, color: Color) -> Result<Color> {
        let area = self.area_mut(area)?;
        Ok(std::mem::replace(&mut area.background_color, color))
    }

    /// Swap in a new version of an element, keeping its id and area.
    /// Returns the previous version.
    pub fn replace_element(&mut self, id: ElementId, element: Element) -> Result<Element> {
        let current = self.elements.get(&id).ok_or(NotFoundError::from(id))?;
        if element.id != id || element.area_id != current.area_id {
            return Err(ValidationError::Inconsistent {
                reason: format!("replacement for element {} changes its id or area", id),
            }
            .into());
        }
        element.validate()?;
        self.elements
            .insert(id, element)
            .ok_or_else(|| NotFoundError::from(id).into())
    }

    /// Verify that every area reference resolves to exactly one element
    /// owned by that area, and that no element is unreferenced
    pub fn check_integrity(&self) -> std::result::Result<(), ValidationError> {
        let mut seen = std::collections::HashSet::new();
        for area in self.areas.values() {
            for id in &area.elements {
                if !seen.insert(*id) {
                    return Err(ValidationError::Inconsistent {
                        reason: format!("element {} referenced more than once", id),
                    });
                }
                match self.elements.get(id) {
                    None => {
                        return Err(ValidationError::Inconsistent {
                            reason: format!("area {} references missing element {}", area.id, id),
                        })
                    }
                    Some(element) if element.area_id != area.id => {
                        return Err(ValidationError::Inconsistent {
                            reason: format!(
                                "element {} listed in {} but belongs to {}",
                                id, area.id, element.area_id
                            ),
                        })
                    }
                    Some(_) => {}
                }
            }
        }
        if seen.len() != self.elements.len() {
            return Err(ValidationError::Inconsistent {
                reason: "element table contains unreferenced elements".to_string(),
            });
        }
        Ok(())
    }
}
