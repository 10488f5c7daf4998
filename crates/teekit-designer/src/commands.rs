//! Reversible document mutations.
//!
//! Every change to a [`Document`] is expressed as a [`DesignerCommand`] so
//! the history can undo and redo it. A command either applies completely or
//! leaves the document untouched.

use teekit_core::{NotFoundError, Result, ValidationError};

use crate::document::{Document, Tombstone};
use crate::model::{AreaId, Color, Element, ElementId, ElementTransform};

#[derive(Debug, Clone, PartialEq)]
pub struct AddElement {
    pub element: Element,
    /// Paint-order index; `None` places the element on top. Filled in on
    /// first apply so redo restores the same position.
    pub index: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RemoveElement {
    pub id: ElementId,
    /// Some while the element is removed (after apply), None otherwise
    pub tombstone: Option<Tombstone>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateElement {
    pub id: ElementId,
    pub before: Element,
    pub after: Element,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransformElement {
    pub id: ElementId,
    pub before: ElementTransform,
    pub after: ElementTransform,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReorderElement {
    pub id: ElementId,
    pub from: usize,
    pub to: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SetAreaBackground {
    pub area: AreaId,
    pub before: Color,
    pub after: Color,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompositeCommand {
    pub commands: Vec<DesignerCommand>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
#[allow(clippy::large_enum_variant)]
pub enum DesignerCommand {
    AddElement(AddElement),
    RemoveElement(RemoveElement),
    UpdateElement(UpdateElement),
    TransformElement(TransformElement),
    ReorderElement(ReorderElement),
    SetAreaBackground(SetAreaBackground),
    Composite(CompositeCommand),
}

impl DesignerCommand {
    pub fn add(element: Element) -> Self {
        DesignerCommand::AddElement(AddElement {
            element,
            index: None,
        })
    }

    pub fn add_at(element: Element, index: usize) -> Self {
        DesignerCommand::AddElement(AddElement {
            element,
            index: Some(index),
        })
    }

    pub fn remove(id: ElementId) -> Self {
        DesignerCommand::RemoveElement(RemoveElement {
            id,
            tombstone: None,
        })
    }

    pub fn update(before: Element, after: Element) -> Self {
        DesignerCommand::UpdateElement(UpdateElement {
            id: before.id,
            before,
            after,
        })
    }

    pub fn transform(id: ElementId, before: ElementTransform, after: ElementTransform) -> Self {
        DesignerCommand::TransformElement(TransformElement { id, before, after })
    }

    pub fn reorder(id: ElementId, from: usize, to: usize) -> Self {
        DesignerCommand::ReorderElement(ReorderElement { id, from, to })
    }

    pub fn set_background(area: AreaId, before: Color, after: Color) -> Self {
        DesignerCommand::SetAreaBackground(SetAreaBackground {
            area,
            before,
            after,
        })
    }

    pub fn composite(name: impl Into<String>, commands: Vec<DesignerCommand>) -> Self {
        DesignerCommand::Composite(CompositeCommand {
            commands,
            name: name.into(),
        })
    }

    /// Human readable name for menus and logs
    pub fn name(&self) -> &str {
        match self {
            DesignerCommand::AddElement(_) => "Add Element",
            DesignerCommand::RemoveElement(_) => "Remove Element",
            DesignerCommand::UpdateElement(_) => "Update Element",
            DesignerCommand::TransformElement(_) => "Transform Element",
            DesignerCommand::ReorderElement(_) => "Reorder Element",
            DesignerCommand::SetAreaBackground(_) => "Set Area Background",
            DesignerCommand::Composite(cmd) => &cmd.name,
        }
    }

    /// Whether this command mentions the element
    pub fn references(&self, id: ElementId) -> bool {
        match self {
            DesignerCommand::AddElement(cmd) => cmd.element.id == id,
            DesignerCommand::RemoveElement(cmd) => cmd.id == id,
            DesignerCommand::UpdateElement(cmd) => cmd.id == id,
            DesignerCommand::TransformElement(cmd) => cmd.id == id,
            DesignerCommand::ReorderElement(cmd) => cmd.id == id,
            DesignerCommand::SetAreaBackground(_) => false,
            DesignerCommand::Composite(cmd) => cmd.commands.iter().any(|c| c.references(id)),
        }
    }

    pub fn apply(&mut self, doc: &mut Document) -> Result<()> {
        match self {
            DesignerCommand::AddElement(cmd) => {
                let index = doc.add_element(cmd.element.clone(), cmd.index)?;
                cmd.index = Some(index);
            }
            DesignerCommand::RemoveElement(cmd) => {
                cmd.tombstone = Some(doc.remove_element(cmd.id)?);
            }
            DesignerCommand::UpdateElement(cmd) => {
                expect_current(doc, cmd.id, &cmd.before)?;
                doc.replace_element(cmd.id, cmd.after.clone())?;
            }
            DesignerCommand::TransformElement(cmd) => {
                swap_transform(doc, cmd.id, &cmd.before, cmd.after)?;
            }
            DesignerCommand::ReorderElement(cmd) => {
                expect_index(doc, cmd.id, cmd.from)?;
                doc.reorder_element(cmd.id, cmd.to)?;
            }
            DesignerCommand::SetAreaBackground(cmd) => {
                expect_background(doc, cmd.area, cmd.before)?;
                doc.set_area_background(cmd.area, cmd.after)?;
            }
            DesignerCommand::Composite(cmd) => {
                for i in 0..cmd.commands.len() {
                    if let Err(err) = cmd.commands[i].apply(doc) {
                        // Roll back the children that did apply
                        for applied in cmd.commands[..i].iter_mut().rev() {
                            if let Err(rollback) = applied.invert(doc) {
                                tracing::error!(
                                    "Rollback of '{}' failed: {}",
                                    applied.name(),
                                    rollback
                                );
                            }
                        }
                        return Err(err);
                    }
                }
            }
        }
        Ok(())
    }

    pub fn invert(&mut self, doc: &mut Document) -> Result<()> {
        match self {
            DesignerCommand::AddElement(cmd) => {
                let tombstone = doc.remove_element(cmd.element.id)?;
                cmd.index = Some(tombstone.index);
            }
            DesignerCommand::RemoveElement(cmd) => {
                let tombstone = cmd.tombstone.take().ok_or_else(|| {
                    ValidationError::Inconsistent {
                        reason: format!("element {} has not been removed", cmd.id),
                    }
                })?;
                if let Err(err) = doc.add_element(tombstone.element.clone(), Some(tombstone.index))
                {
                    cmd.tombstone = Some(tombstone);
                    return Err(err);
                }
            }
            DesignerCommand::UpdateElement(cmd) => {
                expect_current(doc, cmd.id, &cmd.after)?;
                doc.replace_element(cmd.id, cmd.before.clone())?;
            }
            DesignerCommand::TransformElement(cmd) => {
                swap_transform(doc, cmd.id, &cmd.after, cmd.before)?;
            }
            DesignerCommand::ReorderElement(cmd) => {
                expect_index(doc, cmd.id, cmd.to)?;
                doc.reorder_element(cmd.id, cmd.from)?;
            }
            DesignerCommand::SetAreaBackground(cmd) => {
                expect_background(doc, cmd.area, cmd.after)?;
                doc.set_area_background(cmd.area, cmd.before)?;
            }
            DesignerCommand::Composite(cmd) => {
                let len = cmd.commands.len();
                for i in (0..len).rev() {
                    if let Err(err) = cmd.commands[i].invert(doc) {
                        // Re-apply the children that were already inverted
                        for inverted in cmd.commands[i + 1..].iter_mut() {
                            if let Err(rollback) = inverted.apply(doc) {
                                tracing::error!(
                                    "Rollback of '{}' failed: {}",
                                    inverted.name(),
                                    rollback
                                );
                            }
                        }
                        return Err(err);
                    }
                }
            }
        }
        Ok(())
    }
}

fn expect_current(doc: &Document, id: ElementId, expected: &Element) -> Result<()> {
    let current = doc.element(id).ok_or(NotFoundError::from(id))?;
    if current != expected {
        return Err(ValidationError::Inconsistent {
            reason: format!("element {} does not match the recorded state", id),
        }
        .into());
    }
    Ok(())
}

fn expect_index(doc: &Document, id: ElementId, expected: usize) -> Result<()> {
    match doc.index_of(id) {
        Some(index) if index == expected => Ok(()),
        Some(index) => Err(ValidationError::Inconsistent {
            reason: format!(
                "element {} is at index {}, expected {}",
                id, index, expected
            ),
        }
        .into()),
        None => Err(NotFoundError::from(id).into()),
    }
}

fn expect_background(doc: &Document, area: AreaId, expected: Color) -> Result<()> {
    let current = doc.area(area).background_color;
    if current != expected {
        return Err(ValidationError::Inconsistent {
            reason: format!(
                "{} background is {}, expected {}",
                area, current, expected
            ),
        }
        .into());
    }
    Ok(())
}

fn swap_transform(
    doc: &mut Document,
    id: ElementId,
    expected: &ElementTransform,
    target: ElementTransform,
) -> Result<()> {
    let current = doc.element(id).ok_or(NotFoundError::from(id))?;
    if current.transform != *expected {
        return Err(ValidationError::Inconsistent {
            reason: format!("element {} transform does not match the recorded state", id),
        }
        .into());
    }
    let mut updated = current.clone();
    updated.transform = target;
    doc.replace_element(id, updated)?;
    Ok(())
}
