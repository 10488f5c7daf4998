use std::io::Cursor;
use std::sync::Arc;

use teekit_core::RenderError;
use teekit_designer::export::RenderSnapshot;
use teekit_designer::{
    ApproximateMeasurer, AreaId, EditorSession, ElementInit, ExportFormat, ExportSettings,
    RenderContext, RenderRequest, Renderer, SvgRenderer,
};
use teekit_settings::Config;

fn render(session: &EditorSession, areas: &[AreaId], settings: &ExportSettings) -> String {
    let snapshot = RenderSnapshot {
        document: session.document_snapshot().unwrap(),
        images: Arc::clone(session.images()),
    };
    let request = RenderRequest {
        snapshot: &snapshot,
        areas,
        settings,
        max_output_pixels: 100_000_000,
    };
    let output = SvgRenderer::new(Arc::new(ApproximateMeasurer))
        .render(&request, &RenderContext::detached())
        .unwrap();
    String::from_utf8(output.bytes).unwrap()
}

fn session() -> EditorSession {
    let mut session = EditorSession::with_measurer(Config::default(), Arc::new(ApproximateMeasurer));
    session.new_document("Svg");
    session
}

#[test]
fn test_svg_document_structure() {
    let mut session = session();
    session
        .add_element(AreaId::Front, ElementInit::text("Hi").at(10.0, 10.0))
        .unwrap();

    let svg = render(
        &session,
        &[AreaId::Front],
        &ExportSettings::new(ExportFormat::Svg, 96),
    );
    assert!(svg.starts_with("<?xml") || svg.starts_with("<svg"));
    assert!(svg.contains("width=\"200\""));
    assert!(svg.contains("height=\"250\""));
    assert!(svg.contains("id=\"front\""));
    assert!(svg.contains("clip-path"));
    assert!(svg.trim_end().ends_with("</svg>"));
}

#[test]
fn test_raster_image_embedded_as_png_data_uri() {
    let mut session = session();
    let img = image::RgbImage::from_pixel(10, 10, image::Rgb([0, 255, 0]));
    let mut jpeg = Vec::new();
    img.write_to(&mut Cursor::new(&mut jpeg), image::ImageFormat::Jpeg)
        .unwrap();
    let source = session.images().ingest(&jpeg, Some("image/jpeg")).unwrap();
    session
        .add_element(AreaId::Back, ElementInit::image(source))
        .unwrap();

    let svg = render(
        &session,
        &[AreaId::Back],
        &ExportSettings::new(ExportFormat::Svg, 96),
    );
    assert!(svg.contains("data:image/png;base64,"));
}

#[test]
fn test_multi_area_sheet_is_side_by_side() {
    let session = session();
    let svg = render(
        &session,
        &[AreaId::LeftSleeve, AreaId::RightSleeve],
        &ExportSettings::new(ExportFormat::Svg, 96),
    );
    assert!(svg.contains("id=\"left-sleeve\""));
    assert!(svg.contains("id=\"right-sleeve\""));
    assert!(svg.contains("width=\"200\""));
}

#[test]
fn test_cancelled_render_stops() {
    let session = session();
    let snapshot = RenderSnapshot {
        document: session.document_snapshot().unwrap(),
        images: Arc::clone(session.images()),
    };
    let settings = ExportSettings::new(ExportFormat::Svg, 96);
    let request = RenderRequest {
        snapshot: &snapshot,
        areas: &[AreaId::Front],
        settings: &settings,
        max_output_pixels: 100_000_000,
    };
    let cancel = Arc::new(std::sync::atomic::AtomicBool::new(true));
    let ctx = RenderContext::new(cancel, None, 0, |_| {});
    let err = SvgRenderer::new(Arc::new(ApproximateMeasurer))
        .render(&request, &ctx)
        .unwrap_err();
    assert_eq!(err, RenderError::Cancelled);
}
