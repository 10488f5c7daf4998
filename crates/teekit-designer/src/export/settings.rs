//! Export request settings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use teekit_core::units::{is_valid_dpi, MAX_DPI, MIN_DPI};
use teekit_core::{ExportError, PrintSize};
use teekit_settings::ExportDefaults;

use crate::model::{AreaId, Color};

/// Bleed added to each side when enabled, in inches
pub const BLEED_INCHES: f64 = 0.125;

/// Allowed range for each side of a custom print size, in inches
pub const CUSTOM_SIZE_RANGE: (f64, f64) = (1.0, 48.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Png,
    Jpeg,
    Svg,
    Pdf,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg => "jpeg",
            ExportFormat::Svg => "svg",
            ExportFormat::Pdf => "pdf",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Jpeg => "jpg",
            other => other.as_str(),
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Png => "image/png",
            ExportFormat::Jpeg => "image/jpeg",
            ExportFormat::Svg => "image/svg+xml",
            ExportFormat::Pdf => "application/pdf",
        }
    }

    /// Whether a transparent background survives encoding
    pub fn supports_alpha(&self) -> bool {
        !matches!(self, ExportFormat::Jpeg)
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(ExportFormat::Png),
            "jpeg" | "jpg" => Ok(ExportFormat::Jpeg),
            "svg" => Ok(ExportFormat::Svg),
            "pdf" => Ok(ExportFormat::Pdf),
            _ => Err(ExportError::UnsupportedExportFormat {
                format: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Background {
    #[default]
    Transparent,
    White,
    Black,
    Custom(Color),
}

impl Background {
    /// Fill colour, `None` when the canvas stays clear
    pub fn color(&self) -> Option<Color> {
        match self {
            Background::Transparent => None,
            Background::White => Some(Color::WHITE),
            Background::Black => Some(Color::BLACK),
            Background::Custom(color) => Some(*color),
        }
    }

    /// Effective fill for a format; formats without alpha get white
    pub fn fill_for(&self, format: ExportFormat) -> Option<Color> {
        match self.color() {
            None if !format.supports_alpha() => Some(Color::WHITE),
            other => other,
        }
    }
}

impl FromStr for Background {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "transparent" | "none" => Ok(Background::Transparent),
            "white" => Ok(Background::White),
            "black" => Ok(Background::Black),
            other => Color::parse(other)
                .map(Background::Custom)
                .map_err(|e| ExportError::InvalidSettings {
                    reason: format!("background: {}", e),
                }),
        }
    }
}

/// Physical output size
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sizing {
    /// The area's own design size
    #[default]
    Original,
    /// 8" x 10"
    Small,
    /// 11" x 14"
    Medium,
    /// 16" x 20"
    Large,
    Custom { width_in: f64, height_in: f64 },
}

impl Sizing {
    /// Print size for one area, before bleed
    pub fn print_size(&self, area: AreaId) -> PrintSize {
        match self {
            Sizing::Original => {
                let size = area.design_size();
                PrintSize::from_units(size.width, size.height)
            }
            Sizing::Small => PrintSize::new(8.0, 10.0),
            Sizing::Medium => PrintSize::new(11.0, 14.0),
            Sizing::Large => PrintSize::new(16.0, 20.0),
            Sizing::Custom {
                width_in,
                height_in,
            } => PrintSize::new(*width_in, *height_in),
        }
    }

    fn validate(&self) -> Result<(), ExportError> {
        if let Sizing::Custom {
            width_in,
            height_in,
        } = self
        {
            let (min, max) = CUSTOM_SIZE_RANGE;
            for side in [width_in, height_in] {
                if !side.is_finite() || *side < min || *side > max {
                    return Err(ExportError::InvalidSettings {
                        reason: format!(
                            "custom size {}x{} must be within {}..={} inches",
                            width_in, height_in, min, max
                        ),
                    });
                }
            }
        }
        Ok(())
    }
}

impl FromStr for Sizing {
    type Err = ExportError;

    /// Accepts a preset name or `WxH` in inches (e.g. `12x16`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let sizing = match lower.as_str() {
            "original" => Sizing::Original,
            "small" => Sizing::Small,
            "medium" => Sizing::Medium,
            "large" => Sizing::Large,
            custom => {
                let invalid = || ExportError::InvalidSettings {
                    reason: format!("unknown sizing '{}'", s),
                };
                let (w, h) = custom.split_once('x').ok_or_else(invalid)?;
                Sizing::Custom {
                    width_in: w.trim().parse().map_err(|_| invalid())?,
                    height_in: h.trim().parse().map_err(|_| invalid())?,
                }
            }
        };
        sizing.validate()?;
        Ok(sizing)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSettings {
    pub format: ExportFormat,
    pub dpi: u32,
    pub background: Background,
    pub sizing: Sizing,
    pub include_bleed: bool,
    pub compress: bool,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            format: ExportFormat::Png,
            dpi: 300,
            background: Background::Transparent,
            sizing: Sizing::Original,
            include_bleed: false,
            compress: false,
        }
    }
}

impl ExportSettings {
    pub fn new(format: ExportFormat, dpi: u32) -> Self {
        Self {
            format,
            dpi,
            ..Self::default()
        }
    }

    /// Build settings from string-valued configuration defaults
    pub fn from_defaults(defaults: &ExportDefaults) -> Result<Self, ExportError> {
        let settings = Self {
            format: defaults.format.parse()?,
            dpi: defaults.dpi,
            background: defaults.background.parse()?,
            sizing: defaults.sizing.parse()?,
            include_bleed: defaults.include_bleed,
            compress: defaults.compress,
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ExportError> {
        if !is_valid_dpi(self.dpi) {
            return Err(ExportError::InvalidSettings {
                reason: format!("dpi {} outside {}..={}", self.dpi, MIN_DPI, MAX_DPI),
            });
        }
        self.sizing.validate()
    }

    /// Print size of one area including bleed
    pub fn area_print_size(&self, area: AreaId) -> PrintSize {
        let size = self.sizing.print_size(area);
        if self.include_bleed {
            size.with_bleed(BLEED_INCHES)
        } else {
            size
        }
    }
}
