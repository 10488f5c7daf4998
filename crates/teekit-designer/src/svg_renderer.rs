//! SVG export.
//!
//! Text is written as glyph outlines (`<path>`), so the output does not
//! depend on fonts installed where it is opened. Images are embedded as
//! base64 data URIs; raster sources are always embedded as PNG.

use base64::{engine::general_purpose, Engine as _};
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use nalgebra::Matrix3;
use rusttype::OutlineBuilder;
use std::fmt::Write as _;
use std::sync::Arc;

use teekit_core::RenderError;

use crate::export::settings::ExportFormat;
use crate::font_manager::{get_font_for, outline_text, TextLayout, TextMeasurer};
use crate::geometry::element_matrix;
use crate::image_store::{DecodedImage, ImagePixels, SourceFormat};
use crate::model::{Color, ElementKind, ImageElement, TextAlign, TextElement};
use crate::renderer::{RenderContext, RenderOutput, RenderRequest, Renderer, SheetLayout};

/// Format a coordinate without trailing zeros
fn num(value: f64) -> String {
    let s = format!("{:.3}", value);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

fn svg_matrix(m: &Matrix3<f64>) -> String {
    format!(
        "matrix({} {} {} {} {} {})",
        num(m[(0, 0)]),
        num(m[(1, 0)]),
        num(m[(0, 1)]),
        num(m[(1, 1)]),
        num(m[(0, 2)]),
        num(m[(1, 2)])
    )
}

fn fill_attrs(color: Color) -> String {
    if color.is_opaque() {
        format!("fill=\"{}\"", color.to_rgb_hex())
    } else {
        format!(
            "fill=\"{}\" fill-opacity=\"{}\"",
            color.to_rgb_hex(),
            num(color.opacity() as f64)
        )
    }
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

/// Path data from glyph outlines
#[derive(Default)]
struct SvgPathBuilder {
    path: String,
}

impl OutlineBuilder for SvgPathBuilder {
    fn move_to(&mut self, x: f32, y: f32) {
        let _ = write!(self.path, "M{} {} ", num(x as f64), num(y as f64));
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let _ = write!(self.path, "L{} {} ", num(x as f64), num(y as f64));
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let _ = write!(
            self.path,
            "Q{} {} {} {} ",
            num(x1 as f64),
            num(y1 as f64),
            num(x as f64),
            num(y as f64)
        );
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let _ = write!(
            self.path,
            "C{} {} {} {} {} {} ",
            num(x1 as f64),
            num(y1 as f64),
            num(x2 as f64),
            num(y2 as f64),
            num(x as f64),
            num(y as f64)
        );
    }

    fn close(&mut self) {
        self.path.push_str("Z ");
    }
}

pub struct SvgRenderer {
    measurer: Arc<dyn TextMeasurer>,
}

impl SvgRenderer {
    pub fn new(measurer: Arc<dyn TextMeasurer>) -> Self {
        Self { measurer }
    }

    fn text_markup(&self, text: &TextElement) -> String {
        let layout = self.measurer.layout(text);
        if let Some(font) = get_font_for(&text.font_family, text.is_bold(), text.is_italic()) {
            let mut builder = SvgPathBuilder::default();
            outline_text(font, &layout, &mut builder);
            if builder.path.is_empty() {
                return String::new();
            }
            return format!(
                "<path d=\"{}\" {}/>",
                builder.path.trim_end(),
                fill_attrs(text.fill_color)
            );
        }
        tracing::warn!(
            "No font for '{}'; writing text as <text> elements",
            text.font_family
        );
        text_fallback(text, &layout)
    }

    fn image_markup(
        &self,
        image: &ImageElement,
        source: &DecodedImage,
    ) -> Result<String, RenderError> {
        let (mime, bytes) = match (&source.pixels, source.format) {
            (ImagePixels::Vector, _) => (SourceFormat::Svg.mime_type(), source.data.to_vec()),
            (ImagePixels::Raster(_), SourceFormat::Png) => {
                (SourceFormat::Png.mime_type(), source.data.to_vec())
            }
            (ImagePixels::Raster(rgba), _) => {
                let mut png = Vec::new();
                PngEncoder::new(&mut png)
                    .write_image(
                        rgba.as_raw(),
                        rgba.width(),
                        rgba.height(),
                        ExtendedColorType::Rgba8,
                    )
                    .map_err(|e| RenderError::Encode {
                        format: ExportFormat::Svg.to_string(),
                        reason: e.to_string(),
                    })?;
                (SourceFormat::Png.mime_type(), png)
            }
        };
        Ok(format!(
            "<image width=\"{}\" height=\"{}\" preserveAspectRatio=\"none\" href=\"data:{};base64,{}\"/>",
            num(image.natural_width),
            num(image.natural_height),
            mime,
            general_purpose::STANDARD.encode(bytes)
        ))
    }
}

fn text_fallback(text: &TextElement, layout: &TextLayout) -> String {
    let mut out = String::new();
    let weight = if text.is_bold() { "bold" } else { "normal" };
    let style = if text.is_italic() { "italic" } else { "normal" };
    for line in &layout.lines {
        let anchor_x = match text.text_align {
            TextAlign::Left => line.x,
            TextAlign::Center => line.x + line.width / 2.0,
            TextAlign::Right => line.x + line.width,
        };
        let anchor = match text.text_align {
            TextAlign::Left => "start",
            TextAlign::Center => "middle",
            TextAlign::Right => "end",
        };
        let _ = write!(
            out,
            "<text x=\"{}\" y=\"{}\" font-family=\"{}\" font-size=\"{}\" font-weight=\"{}\" font-style=\"{}\" text-anchor=\"{}\" {}>{}</text>",
            num(anchor_x),
            num(line.baseline),
            escape_xml(&text.font_family),
            num(layout.font_px),
            weight,
            style,
            anchor,
            fill_attrs(text.fill_color),
            escape_xml(&line.text)
        );
    }
    out
}

impl Renderer for SvgRenderer {
    fn format(&self) -> ExportFormat {
        ExportFormat::Svg
    }

    fn render(
        &self,
        request: &RenderRequest<'_>,
        ctx: &RenderContext,
    ) -> Result<RenderOutput, RenderError> {
        let layout =
            SheetLayout::compute(request.areas, request.settings, request.max_output_pixels)?;
        ctx.checkpoint()?;

        let (w, h) = (layout.width, layout.height);
        let mut svg = String::new();
        let _ = write!(
            svg,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">"
        );

        svg.push_str("<defs>");
        for (i, placement) in layout.placements.iter().enumerate() {
            let cell = &placement.cell;
            let _ = write!(
                svg,
                "<clipPath id=\"area-{}\"><rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\"/></clipPath>",
                i,
                num(cell.min_x),
                num(cell.min_y),
                num(cell.width()),
                num(cell.height())
            );
        }
        svg.push_str("</defs>");

        if let Some(color) = request.settings.background.fill_for(ExportFormat::Svg) {
            let _ = write!(
                svg,
                "<rect width=\"{}\" height=\"{}\" {}/>",
                w,
                h,
                fill_attrs(color)
            );
        }

        let document = &request.snapshot.document;
        let total = request.step_count();
        let mut done = 0;
        for (i, placement) in layout.placements.iter().enumerate() {
            let _ = write!(
                svg,
                "<g id=\"{}\" clip-path=\"url(#area-{})\">",
                placement.area, i
            );
            for element in document.elements_in(placement.area) {
                ctx.checkpoint()?;
                let matrix = placement.transform * element_matrix(element, self.measurer.as_ref());
                let body = match &element.kind {
                    ElementKind::Text(text) => self.text_markup(text),
                    ElementKind::Image(image) => {
                        let source = request.snapshot.images.get(&image.source_ref).ok_or_else(
                            || RenderError::MissingSource {
                                source_ref: image.source_ref.to_string(),
                            },
                        )?;
                        self.image_markup(image, &source)?
                    }
                };
                if !body.is_empty() {
                    let _ = write!(svg, "<g transform=\"{}\">{}</g>", svg_matrix(&matrix), body);
                }
                done += 1;
                ctx.report(done, total);
            }
            svg.push_str("</g>");
        }
        svg.push_str("</svg>");

        ctx.checkpoint()?;
        Ok(RenderOutput {
            bytes: svg.into_bytes(),
            width: w,
            height: h,
        })
    }
}
