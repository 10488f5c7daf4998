use std::io::Cursor;
use std::sync::Arc;

use serde_json::json;
use teekit_core::{Error, ValidationError};
use teekit_designer::serialization::{DesignFile, FILE_FORMAT_VERSION};
use teekit_designer::{
    load_document, save_document, ApproximateMeasurer, AreaId, Color, EditorSession, ElementInit,
    ElementPatch, ImageStore, Scale,
};
use teekit_settings::Config;

fn session() -> EditorSession {
    EditorSession::with_measurer(Config::default(), Arc::new(ApproximateMeasurer))
}

fn png_bytes() -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(16, 9, image::Rgba([0, 0, 255, 128]));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

fn populated() -> EditorSession {
    let mut session = session();
    session.new_document("Round trip");
    let text = session
        .add_element(
            AreaId::Front,
            ElementInit::text("Line one\nLine two")
                .at(12.5, 40.0)
                .with_rotation(30.0),
        )
        .unwrap();
    session
        .update_element(
            text,
            &ElementPatch::new()
                .font_size(36.0)
                .fill(Color::parse("#336699").unwrap()),
        )
        .unwrap();
    let source = session.images().ingest(&png_bytes(), None).unwrap();
    session
        .add_element(
            AreaId::RightSleeve,
            ElementInit::image(source)
                .at(5.0, 5.0)
                .with_scale(Scale::new(0.5, 2.0)),
        )
        .unwrap();
    session
        .set_area_background(AreaId::Back, Color::BLACK)
        .unwrap();
    session
}

#[test]
fn test_file_round_trip_is_lossless() {
    let mut source = populated();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("design.teekit.json");
    source.save_to_file(&path).unwrap();
    assert!(!source.is_modified());
    assert_eq!(source.current_file_path(), Some(&path));

    // A fresh session has an empty image store; assets come from the file
    let mut target = session();
    let loaded = target.load_from_file(&path).unwrap();
    assert_eq!(*loaded, *source.document_snapshot().unwrap());
    assert_eq!(loaded.next_element_id(), 3);
    assert_eq!(target.images().len(), 1);
    assert_eq!(target.config().recent_files.first(), Some(&path));
}

#[test]
fn test_json_shape() {
    let source = populated();
    let value: serde_json::Value = serde_json::from_str(&source.to_json().unwrap()).unwrap();

    assert_eq!(value["version"], FILE_FORMAT_VERSION);
    assert_eq!(value["metadata"]["name"], "Round trip");
    assert_eq!(value["nextElementId"], 3);
    assert_eq!(value["areas"]["back"]["backgroundColor"], "#000000");
    assert_eq!(value["areas"]["front"]["elements"][0]["type"], "text");
    assert_eq!(value["areas"]["front"]["elements"][0]["fontSize"], 36.0);
    assert_eq!(value["areas"]["right-sleeve"]["elements"][0]["type"], "image");
    assert!(value["areas"]["left-sleeve"]["elements"]
        .as_array()
        .unwrap()
        .is_empty());
}

#[test]
fn test_unknown_fields_ignored_and_missing_areas_created() {
    let json = json!({
        "version": "1.0",
        "metadata": { "name": "Sparse", "owner": "someone" },
        "nextElementId": 1,
        "areas": {
            "front": {
                "elements": [
                    { "type": "text", "id": 7, "x": 1, "y": 2, "content": "Hi", "glow": true }
                ],
                "pattern": "stripes"
            }
        },
        "printer": { "model": "dtg" }
    });

    let doc = load_document(&json.to_string(), None).unwrap();
    assert_eq!(doc.name, "Sparse");
    assert_eq!(doc.areas().count(), 4);
    assert!(doc.area(AreaId::Back).is_empty());

    let front = doc.elements_in(AreaId::Front);
    let text = front[0].as_text().unwrap();
    assert_eq!(text.content, "Hi");
    assert_eq!(text.font_size_pt, 24.0);
    assert_eq!(text.font_family, "Arial");
    assert!(doc.next_element_id() > 7);
}

#[test]
fn test_load_rejects_invalid_elements() {
    let json = json!({
        "areas": {
            "front": { "elements": [ { "type": "text", "id": 1, "fontSize": -4 } ] }
        }
    });
    let err = load_document(&json.to_string(), None).unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    let json = json!({
        "areas": {
            "front": { "elements": [ { "type": "text", "id": 1 } ] },
            "back": { "elements": [ { "type": "text", "id": 1 } ] }
        }
    });
    let err = load_document(&json.to_string(), None).unwrap_err();
    assert!(matches!(
        err,
        Error::Validation(ValidationError::Inconsistent { .. })
    ));
}

#[test]
fn test_image_without_asset_is_rejected() {
    let source = populated();
    let mut file = DesignFile::from_json(&source.to_json().unwrap()).unwrap();
    file.assets.clear();

    let err = file.into_document(Some(&ImageStore::new())).unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[test]
fn test_save_document_without_assets() {
    let source = populated();
    let json = save_document(&source.document_snapshot().unwrap(), None).unwrap();
    let file = DesignFile::from_json(&json).unwrap();
    assert!(file.assets.is_empty());
}

#[test]
fn test_duplicate_document() {
    let mut session = populated();
    let original = session.document_snapshot().unwrap();

    let copy = session.duplicate_document().unwrap();
    assert_ne!(copy.id, original.id);
    assert_eq!(copy.name, "Copy of Round trip");
    assert!(copy.created_at >= original.created_at);
    assert_eq!(
        copy.elements().collect::<Vec<_>>(),
        original.elements().collect::<Vec<_>>()
    );
    assert!(!session.can_undo());
}
