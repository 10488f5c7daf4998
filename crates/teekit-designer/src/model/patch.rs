//! Partial element updates.

use serde_json::Value;

use teekit_core::ValidationError;

use super::text::{validate_font_family, validate_font_size};
use super::{
    validate_finite, validate_scale_factor, Color, Element, ElementKind, ElementVariant,
    FontStyle, FontWeight, TextAlign,
};
use crate::geometry::normalize_degrees;

const TRANSFORM_FIELDS: &[&str] = &["x", "y", "rotation", "scaleX", "scaleY"];
const TEXT_FIELDS: &[&str] = &[
    "content",
    "fontFamily",
    "fontSize",
    "fill",
    "fontWeight",
    "fontStyle",
    "textAlign",
];

/// Set of optional field changes for an element.
///
/// Unset fields are left untouched. Text-only fields are rejected when the
/// target is an image.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementPatch {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub rotation: Option<f64>,
    pub scale_x: Option<f64>,
    pub scale_y: Option<f64>,
    pub content: Option<String>,
    pub font_family: Option<String>,
    pub font_size_pt: Option<f64>,
    pub fill_color: Option<Color>,
    pub font_weight: Option<FontWeight>,
    pub font_style: Option<FontStyle>,
    pub text_align: Option<TextAlign>,
}

impl ElementPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(mut self, x: f64, y: f64) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    pub fn rotation(mut self, degrees: f64) -> Self {
        self.rotation = Some(degrees);
        self
    }

    pub fn scale(mut self, sx: f64, sy: f64) -> Self {
        self.scale_x = Some(sx);
        self.scale_y = Some(sy);
        self
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn font_size(mut self, points: f64) -> Self {
        self.font_size_pt = Some(points);
        self
    }

    pub fn fill(mut self, color: Color) -> Self {
        self.fill_color = Some(color);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Names of the text-only fields this patch sets
    fn text_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.content.is_some() {
            fields.push("content");
        }
        if self.font_family.is_some() {
            fields.push("fontFamily");
        }
        if self.font_size_pt.is_some() {
            fields.push("fontSize");
        }
        if self.fill_color.is_some() {
            fields.push("fill");
        }
        if self.font_weight.is_some() {
            fields.push("fontWeight");
        }
        if self.font_style.is_some() {
            fields.push("fontStyle");
        }
        if self.text_align.is_some() {
            fields.push("textAlign");
        }
        fields
    }

    /// Build a patch from a JSON object, rejecting field names that do not
    /// exist for `variant`
    pub fn from_json(value: &Value, variant: ElementVariant) -> Result<Self, ValidationError> {
        let object = value.as_object().ok_or_else(|| {
            ValidationError::invalid("patch", "expected an object of field updates")
        })?;

        let mut patch = Self::default();
        for (key, value) in object {
            let allowed = TRANSFORM_FIELDS.contains(&key.as_str())
                || (variant == ElementVariant::Text && TEXT_FIELDS.contains(&key.as_str()));
            if !allowed {
                return Err(ValidationError::UnknownField {
                    field: key.clone(),
                    variant: variant.to_string(),
                });
            }

            match key.as_str() {
                "x" => patch.x = Some(number(key, value)?),
                "y" => patch.y = Some(number(key, value)?),
                "rotation" => patch.rotation = Some(number(key, value)?),
                "scaleX" => patch.scale_x = Some(number(key, value)?),
                "scaleY" => patch.scale_y = Some(number(key, value)?),
                "content" => patch.content = Some(string(key, value)?.to_string()),
                "fontFamily" => patch.font_family = Some(string(key, value)?.to_string()),
                "fontSize" => patch.font_size_pt = Some(number(key, value)?),
                "fill" => patch.fill_color = Some(Color::parse(string(key, value)?)?),
                "fontWeight" => patch.font_weight = Some(string(key, value)?.parse()?),
                "fontStyle" => patch.font_style = Some(string(key, value)?.parse()?),
                "textAlign" => patch.text_align = Some(string(key, value)?.parse()?),
                _ => {
                    return Err(ValidationError::UnknownField {
                        field: key.clone(),
                        variant: variant.to_string(),
                    })
                }
            }
        }
        Ok(patch)
    }

    /// Produce the patched element without touching the original.
    ///
    /// All fields are validated before anything is written, so a rejected
    /// patch never yields a partially updated element.
    pub fn apply_to(&self, element: &Element) -> Result<Element, ValidationError> {
        if element.variant() == ElementVariant::Image {
            if let Some(field) = self.text_fields().first() {
                return Err(ValidationError::UnknownField {
                    field: field.to_string(),
                    variant: ElementVariant::Image.to_string(),
                });
            }
        }

        if let Some(x) = self.x {
            validate_finite("x", x)?;
        }
        if let Some(y) = self.y {
            validate_finite("y", y)?;
        }
        if let Some(rotation) = self.rotation {
            validate_finite("rotation", rotation)?;
        }
        if let Some(sx) = self.scale_x {
            validate_scale_factor("scaleX", sx)?;
        }
        if let Some(sy) = self.scale_y {
            validate_scale_factor("scaleY", sy)?;
        }
        if let Some(size) = self.font_size_pt {
            validate_font_size(size)?;
        }
        if let Some(family) = &self.font_family {
            validate_font_family(family)?;
        }

        let mut updated = element.clone();
        let transform = &mut updated.transform;
        if let Some(x) = self.x {
            transform.position.x = x;
        }
        if let Some(y) = self.y {
            transform.position.y = y;
        }
        if let Some(rotation) = self.rotation {
            transform.rotation = normalize_degrees(rotation);
        }
        if let Some(sx) = self.scale_x {
            transform.scale.sx = sx;
        }
        if let Some(sy) = self.scale_y {
            transform.scale.sy = sy;
        }

        if let ElementKind::Text(text) = &mut updated.kind {
            if let Some(content) = &self.content {
                text.content = content.clone();
            }
            if let Some(family) = &self.font_family {
                text.font_family = family.trim().to_string();
            }
            if let Some(size) = self.font_size_pt {
                text.font_size_pt = size;
            }
            if let Some(color) = self.fill_color {
                text.fill_color = color;
            }
            if let Some(weight) = self.font_weight {
                text.font_weight = weight;
            }
            if let Some(style) = self.font_style {
                text.font_style = style;
            }
            if let Some(align) = self.text_align {
                text.text_align = align;
            }
        }

        Ok(updated)
    }
}

fn number(field: &str, value: &Value) -> Result<f64, ValidationError> {
    value
        .as_f64()
        .ok_or_else(|| ValidationError::invalid(field, "expected a number"))
}

fn string<'a>(field: &str, value: &'a Value) -> Result<&'a str, ValidationError> {
    value
        .as_str()
        .ok_or_else(|| ValidationError::invalid(field, "expected a string"))
}
