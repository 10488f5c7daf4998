use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use teekit_core::ValidationError;

use super::{
    validate_finite, Color, TransformInit, DEFAULT_FONT_FAMILY, DEFAULT_FONT_SIZE_PT,
};

/// Largest accepted font size, in points
pub const MAX_FONT_SIZE_PT: f64 = 1000.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

macro_rules! keyword_enum {
    ($ty:ident, $field:literal, { $($name:literal => $variant:ident),+ $(,)? }) => {
        impl FromStr for $ty {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($name => Ok($ty::$variant),)+
                    other => Err(ValidationError::invalid(
                        $field,
                        format!("unknown value '{}'", other),
                    )),
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $($ty::$variant => f.write_str($name),)+
                }
            }
        }
    };
}

keyword_enum!(FontWeight, "fontWeight", { "normal" => Normal, "bold" => Bold });
keyword_enum!(FontStyle, "fontStyle", { "normal" => Normal, "italic" => Italic });
keyword_enum!(TextAlign, "textAlign", { "left" => Left, "center" => Center, "right" => Right });

/// Text element fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextElement {
    /// May be empty; `\n` separates lines
    pub content: String,
    pub font_family: String,
    pub font_size_pt: f64,
    pub fill_color: Color,
    pub font_weight: FontWeight,
    pub font_style: FontStyle,
    pub text_align: TextAlign,
}

impl TextElement {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn is_bold(&self) -> bool {
        self.font_weight == FontWeight::Bold
    }

    pub fn is_italic(&self) -> bool {
        self.font_style == FontStyle::Italic
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.content.split('\n')
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_font_size(self.font_size_pt)?;
        validate_font_family(&self.font_family)
    }
}

impl Default for TextElement {
    fn default() -> Self {
        Self {
            content: String::new(),
            font_family: DEFAULT_FONT_FAMILY.to_string(),
            font_size_pt: DEFAULT_FONT_SIZE_PT,
            fill_color: Color::BLACK,
            font_weight: FontWeight::Normal,
            font_style: FontStyle::Normal,
            text_align: TextAlign::Left,
        }
    }
}

pub(crate) fn validate_font_size(size: f64) -> Result<(), ValidationError> {
    validate_finite("fontSize", size)?;
    if size <= 0.0 || size > MAX_FONT_SIZE_PT {
        return Err(ValidationError::invalid(
            "fontSize",
            format!("must be within (0, {}] points (got {})", MAX_FONT_SIZE_PT, size),
        ));
    }
    Ok(())
}

pub(crate) fn validate_font_family(family: &str) -> Result<(), ValidationError> {
    if family.trim().is_empty() {
        return Err(ValidationError::invalid("fontFamily", "must not be empty"));
    }
    Ok(())
}

/// Initial fields for a text element; unset fields take the defaults
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextInit {
    pub content: Option<String>,
    pub font_family: Option<String>,
    pub font_size_pt: Option<f64>,
    pub fill_color: Option<Color>,
    pub font_weight: Option<FontWeight>,
    pub font_style: Option<FontStyle>,
    pub text_align: Option<TextAlign>,
    pub transform: TransformInit,
}

impl TextInit {
    pub(crate) fn build(self) -> Result<TextElement, ValidationError> {
        let defaults = TextElement::default();
        let text = TextElement {
            content: self.content.unwrap_or(defaults.content),
            font_family: self.font_family.unwrap_or(defaults.font_family),
            font_size_pt: self.font_size_pt.unwrap_or(defaults.font_size_pt),
            fill_color: self.fill_color.unwrap_or(defaults.fill_color),
            font_weight: self.font_weight.unwrap_or_default(),
            font_style: self.font_style.unwrap_or_default(),
            text_align: self.text_align.unwrap_or_default(),
        };
        text.validate()?;
        Ok(text)
    }
}
