//! Element model for design areas.
//!
//! Elements are immutable value records from the caller's perspective: a
//! session hands out clones, and every change goes through a command so it
//! can be undone.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use teekit_core::{NotFoundError, ValidationError};

use crate::geometry::{normalize_degrees, Point, Size};

mod color;
mod image;
mod patch;
mod text;

pub use self::color::Color;
pub use self::image::{ImageElement, ImageInit};
pub use self::patch::ElementPatch;
pub use self::text::{FontStyle, FontWeight, TextAlign, TextElement, TextInit};

/// Default font family for new text elements
pub const DEFAULT_FONT_FAMILY: &str = "Arial";

/// Default font size for new text elements, in points
pub const DEFAULT_FONT_SIZE_PT: f64 = 24.0;

/// Stable element identifier, unique within a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(pub u64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<ElementId> for NotFoundError {
    fn from(id: ElementId) -> Self {
        NotFoundError::Element { id: id.0 }
    }
}

/// The printable surfaces of a garment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AreaId {
    Front,
    Back,
    LeftSleeve,
    RightSleeve,
}

impl AreaId {
    /// All areas in canonical order
    pub const ALL: [AreaId; 4] = [
        AreaId::Front,
        AreaId::Back,
        AreaId::LeftSleeve,
        AreaId::RightSleeve,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AreaId::Front => "front",
            AreaId::Back => "back",
            AreaId::LeftSleeve => "left-sleeve",
            AreaId::RightSleeve => "right-sleeve",
        }
    }

    /// Fixed design-surface size of the area in design units
    pub fn design_size(&self) -> Size {
        match self {
            AreaId::Front | AreaId::Back => Size::new(200.0, 250.0),
            AreaId::LeftSleeve | AreaId::RightSleeve => Size::new(100.0, 150.0),
        }
    }
}

impl fmt::Display for AreaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AreaId {
    type Err = NotFoundError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "front" => Ok(AreaId::Front),
            "back" => Ok(AreaId::Back),
            "left-sleeve" | "left_sleeve" | "leftsleeve" => Ok(AreaId::LeftSleeve),
            "right-sleeve" | "right_sleeve" | "rightsleeve" => Ok(AreaId::RightSleeve),
            _ => Err(NotFoundError::Area {
                area: s.to_string(),
            }),
        }
    }
}

/// Per-axis scale factors
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scale {
    pub sx: f64,
    pub sy: f64,
}

impl Scale {
    pub const IDENTITY: Scale = Scale { sx: 1.0, sy: 1.0 };

    pub fn new(sx: f64, sy: f64) -> Self {
        Self { sx, sy }
    }

    pub fn uniform(s: f64) -> Self {
        Self { sx: s, sy: s }
    }

    /// Reject zero, negative and non-finite factors
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_scale_factor("scaleX", self.sx)?;
        validate_scale_factor("scaleY", self.sy)
    }
}

impl Default for Scale {
    fn default() -> Self {
        Self::IDENTITY
    }
}

pub(crate) fn validate_scale_factor(field: &str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::invalid(field, "must be a finite number"));
    }
    if value <= 0.0 {
        return Err(ValidationError::invalid(
            field,
            format!("must be greater than zero (got {})", value),
        ));
    }
    Ok(())
}

pub(crate) fn validate_finite(field: &str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::invalid(field, "must be a finite number"))
    }
}

/// Position, rotation and scale shared by every element variant.
///
/// `position` is the top-left corner of the unrotated, scaled box in area
/// coordinates. Rotation is in degrees about the box centre.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElementTransform {
    pub position: Point,
    pub rotation: f64,
    pub scale: Scale,
}

impl ElementTransform {
    pub fn new(position: Point, rotation: f64, scale: Scale) -> Self {
        Self {
            position,
            rotation: normalize_degrees(rotation),
            scale,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_finite("x", self.position.x)?;
        validate_finite("y", self.position.y)?;
        validate_finite("rotation", self.rotation)?;
        self.scale.validate()
    }

    /// Copy with a translated position
    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        Self {
            position: Point::new(self.position.x + dx, self.position.y + dy),
            ..*self
        }
    }

    /// Copy rotated by `delta` degrees
    pub fn rotated_by(&self, delta: f64) -> Self {
        Self {
            rotation: normalize_degrees(self.rotation + delta),
            ..*self
        }
    }
}

impl Default for ElementTransform {
    fn default() -> Self {
        Self {
            position: Point::new(0.0, 0.0),
            rotation: 0.0,
            scale: Scale::IDENTITY,
        }
    }
}

/// Optional transform fields supplied when creating an element
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TransformInit {
    pub position: Option<Point>,
    pub rotation: Option<f64>,
    pub scale: Option<Scale>,
}

impl TransformInit {
    fn resolve(&self) -> Result<ElementTransform, ValidationError> {
        let transform = ElementTransform {
            position: self.position.unwrap_or(Point::new(0.0, 0.0)),
            rotation: self.rotation.unwrap_or(0.0),
            scale: self.scale.unwrap_or_default(),
        };
        transform.validate()?;
        Ok(ElementTransform {
            rotation: normalize_degrees(transform.rotation),
            ..transform
        })
    }
}

/// Element variant discriminant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementVariant {
    Text,
    Image,
}

impl fmt::Display for ElementVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementVariant::Text => write!(f, "text"),
            ElementVariant::Image => write!(f, "image"),
        }
    }
}

/// Variant-specific element data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ElementKind {
    Text(TextElement),
    Image(ImageElement),
}

/// A positioned content unit inside an area
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: ElementId,
    pub area_id: AreaId,
    pub transform: ElementTransform,
    pub kind: ElementKind,
}

impl Element {
    pub fn variant(&self) -> ElementVariant {
        match self.kind {
            ElementKind::Text(_) => ElementVariant::Text,
            ElementKind::Image(_) => ElementVariant::Image,
        }
    }

    pub fn position(&self) -> Point {
        self.transform.position
    }

    pub fn rotation(&self) -> f64 {
        self.transform.rotation
    }

    pub fn scale(&self) -> Scale {
        self.transform.scale
    }

    pub fn as_text(&self) -> Option<&TextElement> {
        match &self.kind {
            ElementKind::Text(text) => Some(text),
            ElementKind::Image(_) => None,
        }
    }

    pub fn as_image(&self) -> Option<&ImageElement> {
        match &self.kind {
            ElementKind::Image(image) => Some(image),
            ElementKind::Text(_) => None,
        }
    }

    /// Check every field against its allowed range
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.transform.validate()?;
        match &self.kind {
            ElementKind::Text(text) => text.validate(),
            ElementKind::Image(image) => image.validate(),
        }
    }

    /// Copy of this element with a new id, e.g. for duplication
    pub fn with_id(&self, id: ElementId) -> Self {
        Self {
            id,
            ..self.clone()
        }
    }
}

/// Initial fields for a new element
#[derive(Debug, Clone, PartialEq)]
pub enum ElementInit {
    Text(TextInit),
    Image(ImageInit),
}

impl ElementInit {
    /// Text element with the given content and default styling
    pub fn text(content: impl Into<String>) -> Self {
        ElementInit::Text(TextInit {
            content: Some(content.into()),
            ..Default::default()
        })
    }

    /// Image element referencing an ingested source
    pub fn image(source_ref: crate::image_store::SourceRef) -> Self {
        ElementInit::Image(ImageInit::new(source_ref))
    }

    fn transform_mut(&mut self) -> &mut TransformInit {
        match self {
            ElementInit::Text(init) => &mut init.transform,
            ElementInit::Image(init) => &mut init.transform,
        }
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.transform_mut().position = Some(Point::new(x, y));
        self
    }

    pub fn with_rotation(mut self, degrees: f64) -> Self {
        self.transform_mut().rotation = Some(degrees);
        self
    }

    pub fn with_scale(mut self, scale: Scale) -> Self {
        self.transform_mut().scale = Some(scale);
        self
    }
}

/// Build a validated element from its initial fields.
///
/// `natural_size` resolves an image source reference to its natural
/// dimensions; an unresolved reference is reported as not found.
pub fn create_element<F>(
    id: ElementId,
    area_id: AreaId,
    init: ElementInit,
    natural_size: F,
) -> teekit_core::Result<Element>
where
    F: Fn(&crate::image_store::SourceRef) -> Option<Size>,
{
    let (transform, kind) = match init {
        ElementInit::Text(init) => {
            let transform = init.transform.resolve()?;
            let text = init.build()?;
            (transform, ElementKind::Text(text))
        }
        ElementInit::Image(init) => {
            let transform = init.transform.resolve()?;
            let size = natural_size(&init.source_ref).ok_or_else(|| NotFoundError::Source {
                source_ref: init.source_ref.to_string(),
            })?;
            let image = ImageElement {
                source_ref: init.source_ref,
                natural_width: size.width,
                natural_height: size.height,
            };
            image.validate()?;
            (transform, ElementKind::Image(image))
        }
    };

    Ok(Element {
        id,
        area_id,
        transform,
        kind,
    })
}
