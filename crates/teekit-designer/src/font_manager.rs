//! Font lookup, text measurement and glyph outlines.
//!
//! Fonts come from the system font database; there is no bundled fallback.
//! When a family cannot be resolved, text is measured with approximate
//! metrics. Raster export then fails with `RenderError::MissingFont` and
//! SVG export falls back to a `<text>` element.

use fontdb::{Database, Family, Query, Stretch, Style, Weight};
use rusttype::{point as rt_point, Font, OutlineBuilder, Scale};
use std::{
    collections::HashMap,
    fs,
    sync::{Mutex, OnceLock},
};

use teekit_core::units::points_to_units;

use crate::geometry::Size;
use crate::model::{TextAlign, TextElement};

/// Line pitch as a multiple of the font size
pub const LINE_HEIGHT: f64 = 1.16;

/// Approximate glyph advance (em) used without a font
const APPROX_ADVANCE: f64 = 0.6;
const APPROX_ADVANCE_BOLD: f64 = 0.66;
const APPROX_ASCENT: f64 = 0.8;

#[derive(Clone, Eq, PartialEq, Hash)]
struct FontKey {
    family: String,
    bold: bool,
    italic: bool,
}

fn db() -> &'static Database {
    static DB: OnceLock<Database> = OnceLock::new();
    DB.get_or_init(|| {
        let mut db = Database::new();
        db.load_system_fonts();
        tracing::debug!("Loaded {} system font faces", db.len());
        db
    })
}

/// Font lookup used by renderers: family, bold, italic
pub type FontResolver = fn(&str, bool, bool) -> Option<&'static Font<'static>>;

/// Resolve a font for the family and style, falling back to any sans-serif
/// face. Results (including misses) are cached for the process lifetime.
pub fn get_font_for(family: &str, bold: bool, italic: bool) -> Option<&'static Font<'static>> {
    static CACHE: OnceLock<Mutex<HashMap<FontKey, Option<&'static Font<'static>>>>> =
        OnceLock::new();
    let cache = CACHE.get_or_init(|| Mutex::new(HashMap::new()));

    let key = FontKey {
        family: family.to_string(),
        bold,
        italic,
    };

    if let Some(font) = cache.lock().unwrap_or_else(|p| p.into_inner()).get(&key) {
        return *font;
    }

    let font_ref: Option<&'static Font<'static>> = match load_font_from_system(family, bold, italic)
    {
        Some(font) => Some(Box::leak(Box::new(font))),
        None => {
            tracing::warn!("No font found for family '{}'", family);
            None
        }
    };

    cache
        .lock()
        .unwrap_or_else(|p| p.into_inner())
        .insert(key, font_ref);
    font_ref
}

fn load_font_from_system(family: &str, bold: bool, italic: bool) -> Option<Font<'static>> {
    let families: Vec<Family<'_>> = match family.trim() {
        "" | "Sans" | "sans-serif" => vec![Family::SansSerif],
        "Serif" | "serif" => vec![Family::Serif],
        "Monospace" | "monospace" => vec![Family::Monospace],
        other => vec![Family::Name(other), Family::SansSerif],
    };

    let query = Query {
        families: &families,
        weight: if bold { Weight::BOLD } else { Weight::NORMAL },
        stretch: Stretch::Normal,
        style: if italic { Style::Italic } else { Style::Normal },
    };

    let id = db().query(&query)?;
    let face = db().face(id)?;

    match &face.source {
        fontdb::Source::File(path) => {
            let bytes = fs::read(path).ok()?;
            Font::try_from_vec(bytes)
        }
        fontdb::Source::SharedFile(path, _) => {
            let bytes = fs::read(path).ok()?;
            Font::try_from_vec(bytes)
        }
        fontdb::Source::Binary(bytes) => Font::try_from_vec(bytes.as_ref().as_ref().to_vec()),
    }
}

/// One laid-out line of text in element-local coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct LineLayout {
    pub text: String,
    /// Left edge after alignment
    pub x: f64,
    pub baseline: f64,
    pub width: f64,
}

/// Result of laying out a text element at its font size
#[derive(Debug, Clone, PartialEq)]
pub struct TextLayout {
    /// Intrinsic (unscaled) box size
    pub size: Size,
    /// Font size in design units
    pub font_px: f64,
    pub lines: Vec<LineLayout>,
}

/// Measures text so geometry and renderers agree on the intrinsic box
pub trait TextMeasurer: Send + Sync {
    fn layout(&self, text: &TextElement) -> TextLayout;
}

/// Measurer backed by system fonts, falling back to approximate metrics
#[derive(Debug, Clone, Copy, Default)]
pub struct FontMeasurer;

impl TextMeasurer for FontMeasurer {
    fn layout(&self, text: &TextElement) -> TextLayout {
        let Some(font) = get_font_for(&text.font_family, text.is_bold(), text.is_italic()) else {
            return ApproximateMeasurer.layout(text);
        };

        let font_px = points_to_units(text.font_size_pt);
        let scale = Scale::uniform(font_px as f32);
        let ascent = font.v_metrics(scale).ascent as f64;
        layout_lines(text, font_px, ascent, |line| {
            font.layout(line, scale, rt_point(0.0, 0.0))
                .last()
                .map(|g| (g.position().x + g.unpositioned().h_metrics().advance_width) as f64)
                .unwrap_or(0.0)
        })
    }
}

/// Font-independent metrics; deterministic across machines
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproximateMeasurer;

impl TextMeasurer for ApproximateMeasurer {
    fn layout(&self, text: &TextElement) -> TextLayout {
        let font_px = points_to_units(text.font_size_pt);
        let advance = if text.is_bold() {
            APPROX_ADVANCE_BOLD
        } else {
            APPROX_ADVANCE
        } * font_px;
        layout_lines(text, font_px, APPROX_ASCENT * font_px, |line| {
            line.chars().count() as f64 * advance
        })
    }
}

fn layout_lines<F>(text: &TextElement, font_px: f64, ascent: f64, measure: F) -> TextLayout
where
    F: Fn(&str) -> f64,
{
    let pitch = font_px * LINE_HEIGHT;
    let mut lines: Vec<LineLayout> = text
        .lines()
        .enumerate()
        .map(|(i, line)| LineLayout {
            text: line.to_string(),
            x: 0.0,
            baseline: i as f64 * pitch + ascent,
            width: measure(line),
        })
        .collect();

    let width = lines.iter().map(|l| l.width).fold(0.0, f64::max);
    for line in &mut lines {
        line.x = match text.text_align {
            TextAlign::Left => 0.0,
            TextAlign::Center => (width - line.width) / 2.0,
            TextAlign::Right => width - line.width,
        };
    }

    TextLayout {
        size: Size::new(width, lines.len() as f64 * pitch),
        font_px,
        lines,
    }
}

/// Feed glyph outlines of every line into `builder`, in element-local
/// coordinates.
pub fn outline_text<B: OutlineBuilder>(font: &Font<'_>, layout: &TextLayout, builder: &mut B) {
    let scale = Scale::uniform(layout.font_px as f32);
    for line in &layout.lines {
        let start = rt_point(line.x as f32, line.baseline as f32);
        for glyph in font.layout(&line.text, scale, start) {
            glyph.build_outline(builder);
        }
    }
}
