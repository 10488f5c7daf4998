//! Unit conversion utilities
//!
//! Design coordinates are expressed in design units (1/96 inch, the CSS pixel).
//! Font sizes are given in typographic points (1/72 inch). Export sizes are
//! physical inches rendered at a requested DPI.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Design units per inch
pub const UNITS_PER_INCH: f64 = 96.0;

/// Points per inch
pub const POINTS_PER_INCH: f64 = 72.0;

/// Lowest DPI accepted for exports
pub const MIN_DPI: u32 = 36;

/// Highest DPI accepted for exports
pub const MAX_DPI: u32 = 1200;

/// Convert a font size in points to design units
pub fn points_to_units(points: f64) -> f64 {
    points * UNITS_PER_INCH / POINTS_PER_INCH
}

/// Convert design units to inches
pub fn units_to_inches(units: f64) -> f64 {
    units / UNITS_PER_INCH
}

/// Convert inches to output pixels at the given DPI, rounding up so that
/// nothing inside the requested physical size is cropped
pub fn inches_to_pixels(inches: f64, dpi: u32) -> u32 {
    (inches * dpi as f64).ceil().max(1.0) as u32
}

/// Check whether a DPI value is inside the accepted export range
pub fn is_valid_dpi(dpi: u32) -> bool {
    (MIN_DPI..=MAX_DPI).contains(&dpi)
}

/// Physical print size in inches
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrintSize {
    /// Width in inches
    pub width_in: f64,
    /// Height in inches
    pub height_in: f64,
}

impl PrintSize {
    /// Create a print size from inches
    pub fn new(width_in: f64, height_in: f64) -> Self {
        Self {
            width_in,
            height_in,
        }
    }

    /// Print size of a design surface measured in design units
    pub fn from_units(width: f64, height: f64) -> Self {
        Self::new(units_to_inches(width), units_to_inches(height))
    }

    /// Grow each side by `bleed_in` inches
    pub fn with_bleed(self, bleed_in: f64) -> Self {
        Self::new(
            self.width_in + 2.0 * bleed_in,
            self.height_in + 2.0 * bleed_in,
        )
    }

    /// Pixel dimensions at the given DPI
    pub fn to_pixels(self, dpi: u32) -> (u32, u32) {
        (
            inches_to_pixels(self.width_in, dpi),
            inches_to_pixels(self.height_in, dpi),
        )
    }
}

impl fmt::Display for PrintSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}\" x {:.2}\"", self.width_in, self.height_in)
    }
}

/// Parse a DPI value such as `"300"` or `"300dpi"`
pub fn parse_dpi(input: &str) -> Result<u32, String> {
    let trimmed = input.trim().to_lowercase();
    let digits = trimmed.strip_suffix("dpi").unwrap_or(&trimmed).trim();
    let dpi = u32::from_str(digits).map_err(|_| format!("Invalid DPI: {}", input))?;
    if !is_valid_dpi(dpi) {
        return Err(format!(
            "DPI {} outside supported range {}..={}",
            dpi, MIN_DPI, MAX_DPI
        ));
    }
    Ok(dpi)
}
