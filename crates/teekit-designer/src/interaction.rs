//! Pointer drag gestures.
//!
//! While a drag is in progress the engine holds a provisional transform for
//! the dragged element; the document is untouched until the gesture ends,
//! at which point exactly one [`DesignerCommand`] is produced.

use teekit_core::ValidationError;

use crate::commands::DesignerCommand;
use crate::geometry::{normalize_degrees, Point, Size};
use crate::model::{Element, ElementId, ElementTransform, Scale};

/// Rotation increment used when snapping
pub const ROTATION_SNAP_DEGREES: f64 = 15.0;

/// Scale drags never shrink an element below this factor
pub const MIN_DRAG_SCALE: f64 = 1e-3;

/// Pointer distances below this are treated as zero
const DEAD_ZONE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragMode {
    /// Translate by the pointer delta
    Move,
    /// Rotate about the element centre, optionally snapping to 15 degrees
    Rotate { snap: bool },
    /// Scale about the element centre, uniformly or per local axis
    Scale { uniform: bool },
}

#[derive(Debug, Clone)]
struct DragState {
    element_id: ElementId,
    mode: DragMode,
    start: Point,
    original: ElementTransform,
    intrinsic: Size,
    current: ElementTransform,
}

impl DragState {
    fn center(&self) -> Point {
        let scaled = self.intrinsic.scaled(self.original.scale);
        Point::new(
            self.original.position.x + scaled.width / 2.0,
            self.original.position.y + scaled.height / 2.0,
        )
    }

    fn transform_for(&self, point: Point) -> ElementTransform {
        match self.mode {
            DragMode::Move => self
                .original
                .translated(point.x - self.start.x, point.y - self.start.y),
            DragMode::Rotate { snap } => {
                let c = self.center();
                let a0 = (self.start.y - c.y).atan2(self.start.x - c.x);
                let a1 = (point.y - c.y).atan2(point.x - c.x);
                let mut degrees = self.original.rotation + (a1 - a0).to_degrees();
                if snap {
                    degrees = (degrees / ROTATION_SNAP_DEGREES).round() * ROTATION_SNAP_DEGREES;
                }
                ElementTransform {
                    rotation: normalize_degrees(degrees),
                    ..self.original
                }
            }
            DragMode::Scale { uniform } => {
                let c = self.center();
                let (rx, ry) = if uniform {
                    let d0 = self.start.distance_to(&c);
                    let ratio = if d0 > DEAD_ZONE {
                        point.distance_to(&c) / d0
                    } else {
                        1.0
                    };
                    (ratio, ratio)
                } else {
                    // Measure along the element's own axes
                    let (sin, cos) = (-self.original.rotation).to_radians().sin_cos();
                    let local = |p: Point| {
                        let (dx, dy) = (p.x - c.x, p.y - c.y);
                        (dx * cos - dy * sin, dx * sin + dy * cos)
                    };
                    let (x0, y0) = local(self.start);
                    let (x1, y1) = local(point);
                    let axis = |a: f64, b: f64| {
                        if a.abs() > DEAD_ZONE {
                            b.abs() / a.abs()
                        } else {
                            1.0
                        }
                    };
                    (axis(x0, x1), axis(y0, y1))
                };

                let scale = Scale::new(
                    (self.original.scale.sx * rx).max(MIN_DRAG_SCALE),
                    (self.original.scale.sy * ry).max(MIN_DRAG_SCALE),
                );
                let scaled = self.intrinsic.scaled(scale);
                ElementTransform {
                    position: Point::new(c.x - scaled.width / 2.0, c.y - scaled.height / 2.0),
                    rotation: self.original.rotation,
                    scale,
                }
            }
        }
    }
}

/// Drag gesture tracker
#[derive(Debug, Clone, Default)]
pub struct InteractionEngine {
    drag: Option<DragState>,
}

impl InteractionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn dragged_element(&self) -> Option<ElementId> {
        self.drag.as_ref().map(|d| d.element_id)
    }

    /// Start a gesture on `element`. Any gesture in progress is discarded.
    pub fn begin_drag(
        &mut self,
        element: &Element,
        intrinsic: Size,
        mode: DragMode,
        point: Point,
    ) -> Result<(), ValidationError> {
        if !point.is_finite() {
            return Err(ValidationError::invalid("point", "must be finite"));
        }
        if self.drag.is_some() {
            tracing::debug!("Discarding unfinished drag");
        }
        self.drag = Some(DragState {
            element_id: element.id,
            mode,
            start: point,
            original: element.transform,
            intrinsic,
            current: element.transform,
        });
        Ok(())
    }

    /// Recompute the provisional transform for the pointer position
    pub fn update_drag(&mut self, point: Point) -> Result<Option<ElementTransform>, ValidationError> {
        if !point.is_finite() {
            return Err(ValidationError::invalid("point", "must be finite"));
        }
        let Some(drag) = self.drag.as_mut() else {
            return Ok(None);
        };
        drag.current = drag.transform_for(point);
        Ok(Some(drag.current))
    }

    /// The dragged element and its provisional transform
    pub fn provisional(&self) -> Option<(ElementId, ElementTransform)> {
        self.drag.as_ref().map(|d| (d.element_id, d.current))
    }

    /// Finish the gesture, yielding a single transform command when the
    /// element actually moved
    pub fn end_drag(&mut self) -> Option<DesignerCommand> {
        let drag = self.drag.take()?;
        if drag.current == drag.original {
            return None;
        }
        Some(DesignerCommand::transform(
            drag.element_id,
            drag.original,
            drag.current,
        ))
    }

    /// Abandon the gesture. Returns true if one was in progress.
    pub fn cancel_drag(&mut self) -> bool {
        self.drag.take().is_some()
    }
}
