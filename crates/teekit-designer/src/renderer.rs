//! Export renderers.
//! Turns a document snapshot into encoded bytes for one export format.
//!
//! Features:
//! - Sheet layout: target areas side by side, content fitted and centred
//! - Raster output through tiny-skia, encoded with the `image` crate
//! - Cooperative cancellation and deadline checks between steps

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder};
use nalgebra::Matrix3;
use rusttype::OutlineBuilder;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tiny_skia::{
    FillRule, FilterQuality, IntSize, Mask, Paint, PathBuilder, Pixmap, PixmapPaint, Transform,
};

use teekit_core::units::{inches_to_pixels, units_to_inches};
use teekit_core::RenderError;

use crate::export::settings::{ExportFormat, ExportSettings, BLEED_INCHES};
use crate::export::snapshot::RenderSnapshot;
use crate::font_manager::{get_font_for, outline_text, FontResolver, TextMeasurer};
use crate::geometry::{element_matrix, translation, Rect};
use crate::image_store::{DecodedImage, ImagePixels};
use crate::model::{AreaId, Color, ElementKind, ImageElement, TextElement};
use crate::svg_renderer::SvgRenderer;

const JPEG_QUALITY: u8 = 92;
const JPEG_QUALITY_COMPRESSED: u8 = 70;

/// Largest side of the offscreen buffer used for SVG sources
const MAX_SVG_RASTER_SIDE: f64 = 8192.0;

/// Progress, cancellation and deadline for one render
pub struct RenderContext {
    cancel: Arc<AtomicBool>,
    deadline: Option<Instant>,
    timeout_ms: u64,
    progress: Box<dyn Fn(u8) + Send + Sync>,
}

impl RenderContext {
    pub fn new(
        cancel: Arc<AtomicBool>,
        deadline: Option<Instant>,
        timeout_ms: u64,
        progress: impl Fn(u8) + Send + Sync + 'static,
    ) -> Self {
        Self {
            cancel,
            deadline,
            timeout_ms,
            progress: Box::new(progress),
        }
    }

    /// No cancellation, no deadline, progress ignored
    pub fn detached() -> Self {
        Self::new(Arc::new(AtomicBool::new(false)), None, 0, |_| {})
    }

    /// Fail fast when cancelled or past the deadline
    pub fn checkpoint(&self) -> Result<(), RenderError> {
        if self.cancel.load(Ordering::SeqCst) {
            return Err(RenderError::Cancelled);
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(RenderError::Timeout {
                timeout_ms: self.timeout_ms,
            });
        }
        Ok(())
    }

    /// Report `done` of `total` steps; never reports 100
    pub fn report(&self, done: usize, total: usize) {
        let total = total.max(1);
        let percent = (done.min(total) * 99 / total) as u8;
        (self.progress)(percent);
    }
}

/// One render request
pub struct RenderRequest<'a> {
    pub snapshot: &'a RenderSnapshot,
    pub areas: &'a [AreaId],
    pub settings: &'a ExportSettings,
    pub max_output_pixels: u64,
}

impl RenderRequest<'_> {
    /// Elements painted plus the final encode
    pub fn step_count(&self) -> usize {
        self.areas
            .iter()
            .map(|a| self.snapshot.document.area(*a).len())
            .sum::<usize>()
            + 1
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderOutput {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

pub trait Renderer: Send + Sync {
    fn format(&self) -> ExportFormat;

    fn render(
        &self,
        request: &RenderRequest<'_>,
        ctx: &RenderContext,
    ) -> Result<RenderOutput, RenderError>;
}

/// Renderers by output format
#[derive(Clone, Default)]
pub struct RendererRegistry {
    renderers: HashMap<ExportFormat, Arc<dyn Renderer>>,
}

impl RendererRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// PNG and JPEG raster plus SVG. PDF has no renderer.
    pub fn with_defaults(measurer: Arc<dyn TextMeasurer>) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(RasterRenderer::new(
            ExportFormat::Png,
            Arc::clone(&measurer),
        )));
        registry.register(Arc::new(RasterRenderer::new(
            ExportFormat::Jpeg,
            Arc::clone(&measurer),
        )));
        registry.register(Arc::new(SvgRenderer::new(measurer)));
        registry
    }

    /// Replaces any renderer for the same format
    pub fn register(&mut self, renderer: Arc<dyn Renderer>) {
        self.renderers.insert(renderer.format(), renderer);
    }

    pub fn get(&self, format: ExportFormat) -> Option<Arc<dyn Renderer>> {
        self.renderers.get(&format).cloned()
    }
}

impl std::fmt::Debug for RendererRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut formats: Vec<_> = self.renderers.keys().map(|f| f.as_str()).collect();
        formats.sort();
        f.debug_struct("RendererRegistry")
            .field("formats", &formats)
            .finish()
    }
}

/// Where one area lands on the output sheet
#[derive(Debug, Clone, PartialEq)]
pub struct AreaPlacement {
    pub area: AreaId,
    /// Cell on the sheet in pixels, bleed included
    pub cell: Rect,
    /// Area design units to sheet pixels
    pub transform: Matrix3<f64>,
}

/// Output canvas for a job: areas side by side, left to right
#[derive(Debug, Clone, PartialEq)]
pub struct SheetLayout {
    pub width: u32,
    pub height: u32,
    pub placements: Vec<AreaPlacement>,
}

impl SheetLayout {
    #[rustfmt::skip]
    pub fn compute(
        areas: &[AreaId],
        settings: &ExportSettings,
        max_output_pixels: u64,
    ) -> Result<Self, RenderError> {
        let bleed = if settings.include_bleed {
            BLEED_INCHES * settings.dpi as f64
        } else {
            0.0
        };

        let mut placements = Vec::with_capacity(areas.len());
        let mut x = 0u64;
        let mut height = 0u32;
        for area in areas {
            let (cell_w, cell_h) = settings.area_print_size(*area).to_pixels(settings.dpi);
            let design = area.design_size();
            let box_w = (cell_w as f64 - 2.0 * bleed).max(1.0);
            let box_h = (cell_h as f64 - 2.0 * bleed).max(1.0);
            let scale = (box_w / design.width).min(box_h / design.height);
            let offset_x = x as f64 + bleed + (box_w - design.width * scale) / 2.0;
            let offset_y = bleed + (box_h - design.height * scale) / 2.0;

            let fit = Matrix3::new(
                scale, 0.0, 0.0,
                0.0, scale, 0.0,
                0.0, 0.0, 1.0,
            );
            placements.push(AreaPlacement {
                area: *area,
                cell: Rect::from_xywh(x as f64, 0.0, cell_w as f64, cell_h as f64),
                transform: translation(offset_x, offset_y) * fit,
            });
            x += cell_w as u64;
            height = height.max(cell_h);
        }

        let too_large = |width: u32| RenderError::CanvasTooLarge {
            width,
            height,
            limit: max_output_pixels,
        };
        let width = u32::try_from(x).map_err(|_| too_large(u32::MAX))?;
        if width as u64 * height as u64 > max_output_pixels {
            return Err(too_large(width));
        }

        Ok(Self {
            width,
            height,
            placements,
        })
    }
}

/// Pixel size of the original-sized area at a DPI, handy for callers
pub fn area_pixel_size(area: AreaId, dpi: u32) -> (u32, u32) {
    let size = area.design_size();
    (
        inches_to_pixels(units_to_inches(size.width), dpi),
        inches_to_pixels(units_to_inches(size.height), dpi),
    )
}

pub(crate) fn to_skia_transform(m: &Matrix3<f64>) -> Transform {
    Transform::from_row(
        m[(0, 0)] as f32,
        m[(1, 0)] as f32,
        m[(0, 1)] as f32,
        m[(1, 1)] as f32,
        m[(0, 2)] as f32,
        m[(1, 2)] as f32,
    )
}

fn to_skia_color(color: Color) -> tiny_skia::Color {
    tiny_skia::Color::from_rgba8(color.r, color.g, color.b, color.a)
}

/// Collects glyph outlines into a tiny-skia path
struct SkiaPathBuilder {
    builder: PathBuilder,
}

impl OutlineBuilder for SkiaPathBuilder {
    fn move_to(&mut self, x: f32, y: f32) {
        self.builder.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.builder.line_to(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        self.builder.quad_to(x1, y1, x, y);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        self.builder.cubic_to(x1, y1, x2, y2, x, y);
    }

    fn close(&mut self) {
        self.builder.close();
    }
}

/// PNG or JPEG output
pub struct RasterRenderer {
    format: ExportFormat,
    measurer: Arc<dyn TextMeasurer>,
    resolve_font: FontResolver,
}

impl RasterRenderer {
    pub fn new(format: ExportFormat, measurer: Arc<dyn TextMeasurer>) -> Self {
        Self {
            format,
            measurer,
            resolve_font: get_font_for,
        }
    }

    /// Replace the system font lookup
    pub fn with_font_resolver(mut self, resolve_font: FontResolver) -> Self {
        self.resolve_font = resolve_font;
        self
    }

    fn paint_text(
        &self,
        pixmap: &mut Pixmap,
        text: &TextElement,
        transform: Transform,
        mask: Option<&Mask>,
    ) -> Result<(), RenderError> {
        let font = (self.resolve_font)(&text.font_family, text.is_bold(), text.is_italic())
            .ok_or_else(|| RenderError::MissingFont {
                family: text.font_family.clone(),
            })?;
        let layout = self.measurer.layout(text);
        let mut outline = SkiaPathBuilder {
            builder: PathBuilder::new(),
        };
        outline_text(font, &layout, &mut outline);
        let Some(path) = outline.builder.finish() else {
            return Ok(());
        };
        let mut paint = Paint::default();
        paint.set_color(to_skia_color(text.fill_color));
        paint.anti_alias = true;
        pixmap.fill_path(&path, &paint, FillRule::Winding, transform, mask);
        Ok(())
    }

    fn paint_image(
        &self,
        pixmap: &mut Pixmap,
        image: &ImageElement,
        source: &DecodedImage,
        transform: Transform,
        mask: Option<&Mask>,
    ) -> Result<(), RenderError> {
        let paint = PixmapPaint {
            quality: FilterQuality::Bicubic,
            ..PixmapPaint::default()
        };
        match &source.pixels {
            ImagePixels::Raster(rgba) => {
                let src = rgba_to_pixmap(rgba).ok_or_else(|| RenderError::Encode {
                    format: self.format.to_string(),
                    reason: format!("cannot rasterize image {}", image.source_ref),
                })?;
                pixmap.draw_pixmap(0, 0, src.as_ref(), &paint, transform, mask);
            }
            ImagePixels::Vector => {
                let tree = usvg::Tree::from_data(&source.data, &usvg::Options::default())
                    .map_err(|e| RenderError::MissingSource {
                        source_ref: format!("{} ({})", image.source_ref, e),
                    })?;
                // Rasterize at roughly the destination resolution, then place
                let device_scale = (transform.sx.hypot(transform.ky))
                    .max(transform.kx.hypot(transform.sy))
                    .max(f32::EPSILON) as f64;
                let side = image.natural_width.max(image.natural_height) * device_scale;
                let scale = if side > MAX_SVG_RASTER_SIDE {
                    device_scale * MAX_SVG_RASTER_SIDE / side
                } else {
                    device_scale
                };
                let w = (image.natural_width * scale).ceil().max(1.0) as u32;
                let h = (image.natural_height * scale).ceil().max(1.0) as u32;
                let Some(mut offscreen) = Pixmap::new(w, h) else {
                    return Ok(());
                };
                let tree_size = tree.size();
                let fit_x = (image.natural_width * scale) as f32 / tree_size.width();
                let fit_y = (image.natural_height * scale) as f32 / tree_size.height();
                resvg::render(
                    &tree,
                    Transform::from_scale(fit_x, fit_y),
                    &mut offscreen.as_mut(),
                );
                let inv = (1.0 / scale) as f32;
                pixmap.draw_pixmap(
                    0,
                    0,
                    offscreen.as_ref(),
                    &paint,
                    transform.pre_scale(inv, inv),
                    mask,
                );
            }
        }
        Ok(())
    }

    fn encode(&self, pixmap: &Pixmap, compress: bool) -> Result<Vec<u8>, RenderError> {
        let encode_error = |e: image::ImageError| RenderError::Encode {
            format: self.format.to_string(),
            reason: e.to_string(),
        };
        let (width, height) = (pixmap.width(), pixmap.height());
        let mut out = Vec::new();
        match self.format {
            ExportFormat::Png => {
                let mut data = Vec::with_capacity(pixmap.data().len());
                for px in pixmap.pixels() {
                    let c = px.demultiply();
                    data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
                }
                let compression = if compress {
                    CompressionType::Best
                } else {
                    CompressionType::Default
                };
                PngEncoder::new_with_quality(&mut out, compression, FilterType::Adaptive)
                    .write_image(&data, width, height, ExtendedColorType::Rgba8)
                    .map_err(encode_error)?;
            }
            ExportFormat::Jpeg => {
                // Background is always opaque for JPEG; flatten anything left over onto white
                let mut data = Vec::with_capacity(width as usize * height as usize * 3);
                for px in pixmap.pixels() {
                    let inv = 255 - px.alpha() as u16;
                    data.extend_from_slice(&[
                        (px.red() as u16 + inv).min(255) as u8,
                        (px.green() as u16 + inv).min(255) as u8,
                        (px.blue() as u16 + inv).min(255) as u8,
                    ]);
                }
                let quality = if compress {
                    JPEG_QUALITY_COMPRESSED
                } else {
                    JPEG_QUALITY
                };
                JpegEncoder::new_with_quality(&mut out, quality)
                    .write_image(&data, width, height, ExtendedColorType::Rgb8)
                    .map_err(encode_error)?;
            }
            other => {
                return Err(RenderError::UnsupportedFormat {
                    format: other.to_string(),
                })
            }
        }
        Ok(out)
    }
}

impl Renderer for RasterRenderer {
    fn format(&self) -> ExportFormat {
        self.format
    }

    fn render(
        &self,
        request: &RenderRequest<'_>,
        ctx: &RenderContext,
    ) -> Result<RenderOutput, RenderError> {
        let layout =
            SheetLayout::compute(request.areas, request.settings, request.max_output_pixels)?;
        ctx.checkpoint()?;

        let mut pixmap =
            Pixmap::new(layout.width, layout.height).ok_or(RenderError::CanvasTooLarge {
                width: layout.width,
                height: layout.height,
                limit: request.max_output_pixels,
            })?;
        if let Some(color) = request.settings.background.fill_for(self.format) {
            pixmap.fill(to_skia_color(color));
        }

        let document = &request.snapshot.document;
        let total = request.step_count();
        let mut done = 0;
        for placement in &layout.placements {
            let mask = cell_mask(layout.width, layout.height, &placement.cell);
            for element in document.elements_in(placement.area) {
                ctx.checkpoint()?;
                let matrix = placement.transform * element_matrix(element, self.measurer.as_ref());
                let transform = to_skia_transform(&matrix);
                match &element.kind {
                    ElementKind::Text(text) => {
                        self.paint_text(&mut pixmap, text, transform, mask.as_ref())?
                    }
                    ElementKind::Image(image) => {
                        let source = request.snapshot.images.get(&image.source_ref).ok_or_else(
                            || RenderError::MissingSource {
                                source_ref: image.source_ref.to_string(),
                            },
                        )?;
                        self.paint_image(&mut pixmap, image, &source, transform, mask.as_ref())?;
                    }
                }
                done += 1;
                ctx.report(done, total);
            }
        }

        ctx.checkpoint()?;
        let bytes = self.encode(&pixmap, request.settings.compress)?;
        Ok(RenderOutput {
            bytes,
            width: layout.width,
            height: layout.height,
        })
    }
}

/// Clip mask for one cell so elements cannot spill into a neighbouring area
fn cell_mask(width: u32, height: u32, cell: &Rect) -> Option<Mask> {
    let mut mask = Mask::new(width, height)?;
    let rect = tiny_skia::Rect::from_xywh(
        cell.min_x as f32,
        cell.min_y as f32,
        cell.width() as f32,
        cell.height() as f32,
    )?;
    let path = PathBuilder::from_rect(rect);
    mask.fill_path(&path, FillRule::Winding, false, Transform::identity());
    Some(mask)
}

/// Straight-alpha RGBA into a premultiplied pixmap
fn rgba_to_pixmap(rgba: &image::RgbaImage) -> Option<Pixmap> {
    let size = IntSize::from_wh(rgba.width(), rgba.height())?;
    let mut data = Vec::with_capacity(rgba.as_raw().len());
    for px in rgba.pixels() {
        let [r, g, b, a] = px.0;
        let premul = |c: u8| ((c as u16 * a as u16 + 127) / 255) as u8;
        data.extend_from_slice(&[premul(r), premul(g), premul(b), a]);
    }
    Pixmap::from_vec(data, size)
}
