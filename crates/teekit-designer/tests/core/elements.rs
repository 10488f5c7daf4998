use std::io::Cursor;
use std::sync::Arc;

use serde_json::json;
use teekit_core::{Error, NotFoundError, ValidationError};
use teekit_designer::geometry::rotated_rect_extent;
use teekit_designer::{
    ApproximateMeasurer, AreaId, Color, EditorSession, ElementInit, ElementPatch, Scale,
};
use teekit_settings::Config;

fn session() -> EditorSession {
    let mut session = EditorSession::with_measurer(Config::default(), Arc::new(ApproximateMeasurer));
    session.new_document("Elements");
    session
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([200, 20, 20, 255]));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

#[test]
fn test_text_defaults() {
    let mut session = session();
    let id = session
        .add_element(AreaId::Front, ElementInit::text("Hi"))
        .unwrap();
    let element = session.get_element(id).unwrap();
    let text = element.as_text().unwrap();

    assert_eq!(text.content, "Hi");
    assert_eq!(text.font_family, "Arial");
    assert_eq!(text.font_size_pt, 24.0);
    assert_eq!(text.fill_color, Color::BLACK);
    assert_eq!(element.rotation(), 0.0);
    assert_eq!(element.scale(), Scale::uniform(1.0));
    assert_eq!(element.area_id, AreaId::Front);
}

#[test]
fn test_image_requires_ingested_source() {
    let mut session = session();
    let other = teekit_designer::ImageStore::new();
    let source = other.ingest(&png_bytes(4, 4), None).unwrap();

    let err = session
        .add_element(AreaId::Front, ElementInit::image(source))
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(NotFoundError::Source { .. })));
}

#[test]
fn test_rotated_image_bounding_box() {
    let mut session = session();
    let source = session.images().ingest(&png_bytes(80, 40), Some("image/png")).unwrap();
    let id = session
        .add_element(
            AreaId::Front,
            ElementInit::image(source)
                .at(100.0, 100.0)
                .with_scale(Scale::uniform(0.5)),
        )
        .unwrap();
    session
        .update_element(id, &ElementPatch::new().rotation(45.0))
        .unwrap();

    let bbox = session.bounding_box(id).unwrap();
    let extent = rotated_rect_extent(40.0, 20.0, 45.0);
    assert!((bbox.width() - extent.width).abs() < 1e-6);
    assert!((bbox.height() - extent.height).abs() < 1e-6);

    let centre = bbox.center();
    assert!((centre.x - 120.0).abs() < 1e-6);
    assert!((centre.y - 110.0).abs() < 1e-6);
}

#[test]
fn test_invalid_patch_leaves_element_unchanged() {
    let mut session = session();
    let id = session
        .add_element(AreaId::Back, ElementInit::text("Tour"))
        .unwrap();
    let before = session.get_element(id).unwrap();

    let err = session
        .update_element(id, &ElementPatch::new().scale(0.0, 1.0))
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert_eq!(session.get_element(id).unwrap(), before);
    assert_eq!(session.undo_name().as_deref(), Some("Add Element"));
}

#[test]
fn test_tiny_positive_scale_accepted() {
    let mut session = session();
    let id = session
        .add_element(AreaId::Front, ElementInit::text("Dot"))
        .unwrap();

    let updated = session
        .update_element(id, &ElementPatch::new().scale(0.0005, 0.0005))
        .unwrap();
    assert_eq!(updated.scale(), Scale::new(0.0005, 0.0005));

    let err = session
        .update_element(id, &ElementPatch::new().scale(-0.0005, 1.0))
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

#[test]
fn test_update_json_rejects_unknown_and_foreign_fields() {
    let mut session = session();
    let source = session.images().ingest(&png_bytes(4, 4), None).unwrap();
    let text = session.add_element(AreaId::Front, ElementInit::text("A")).unwrap();
    let image = session
        .add_element(AreaId::Front, ElementInit::image(source))
        .unwrap();

    let err = session
        .update_element_json(text, &json!({ "colour": "#ff0000" }))
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Validation(ValidationError::UnknownField { .. })
    ));

    let err = session
        .update_element_json(image, &json!({ "fontSize": 12 }))
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Validation(ValidationError::UnknownField { .. })
    ));

    let updated = session
        .update_element_json(text, &json!({ "fill": "#ff0000", "rotation": -90 }))
        .unwrap();
    assert_eq!(updated.as_text().unwrap().fill_color, Color::rgb(255, 0, 0));
    assert_eq!(updated.rotation(), 270.0);
}

#[test]
fn test_noop_update_records_nothing() {
    let mut session = session();
    let id = session.add_element(AreaId::Front, ElementInit::text("A")).unwrap();
    session
        .update_element(id, &ElementPatch::new().content("A"))
        .unwrap();
    session.undo().unwrap();
    assert!(session.elements_in(AreaId::Front).unwrap().is_empty());
}

#[test]
fn test_paint_order_operations() {
    let mut session = session();
    let a = session.add_element(AreaId::Front, ElementInit::text("a")).unwrap();
    let b = session.add_element(AreaId::Front, ElementInit::text("b")).unwrap();
    let c = session.add_element(AreaId::Front, ElementInit::text("c")).unwrap();
    let order = |s: &EditorSession| {
        s.elements_in(AreaId::Front)
            .unwrap()
            .iter()
            .map(|e| e.id)
            .collect::<Vec<_>>()
    };

    session.bring_to_front(a).unwrap();
    assert_eq!(order(&session), vec![b, c, a]);

    session.send_to_back(c).unwrap();
    assert_eq!(order(&session), vec![c, b, a]);

    session.bring_forward(c).unwrap();
    assert_eq!(order(&session), vec![b, c, a]);

    session.send_backward(a).unwrap();
    assert_eq!(order(&session), vec![b, a, c]);

    // Out of range indices clamp to the top
    session.reorder_element(b, 99).unwrap();
    assert_eq!(order(&session), vec![a, c, b]);

    session.undo().unwrap();
    assert_eq!(order(&session), vec![b, a, c]);
}

#[test]
fn test_duplicate_element_is_offset_above_source() {
    let mut session = session();
    let a = session
        .add_element(AreaId::Front, ElementInit::text("a").at(5.0, 5.0))
        .unwrap();
    let top = session.add_element(AreaId::Front, ElementInit::text("top")).unwrap();

    let copy = session.duplicate_element(a).unwrap();
    assert_ne!(copy, a);

    let elements = session.elements_in(AreaId::Front).unwrap();
    let ids: Vec<_> = elements.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![a, copy, top]);

    let duplicated = session.get_element(copy).unwrap();
    assert_eq!(duplicated.position().x, 15.0);
    assert_eq!(duplicated.position().y, 15.0);
    assert_eq!(duplicated.kind, session.get_element(a).unwrap().kind);
}

#[test]
fn test_ids_are_never_reused() {
    let mut session = session();
    let first = session.add_element(AreaId::Front, ElementInit::text("a")).unwrap();
    session.remove_element(first).unwrap();
    let second = session.add_element(AreaId::Front, ElementInit::text("b")).unwrap();
    assert!(second.0 > first.0);
}

#[test]
fn test_area_background_is_undoable() {
    let mut session = session();
    let navy = Color::parse("#000080").unwrap();
    session.set_area_background(AreaId::Back, navy).unwrap();
    assert_eq!(
        session.document_snapshot().unwrap().area(AreaId::Back).background_color,
        navy
    );
    session.undo().unwrap();
    assert_eq!(
        session.document_snapshot().unwrap().area(AreaId::Back).background_color,
        Color::WHITE
    );
}

#[test]
fn test_operations_require_open_document() {
    let mut session = EditorSession::with_measurer(Config::default(), Arc::new(ApproximateMeasurer));
    let err = session
        .add_element(AreaId::Front, ElementInit::text("x"))
        .unwrap_err();
    assert!(matches!(err, Error::NoDocument));
    assert!(!session.can_undo());
}
