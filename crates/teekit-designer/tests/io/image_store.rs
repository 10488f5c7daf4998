use std::io::Cursor;

use teekit_core::{Error, ImageError};
use teekit_designer::image_store::{ImagePixels, SourceFormat};
use teekit_designer::ImageStore;

fn encode(format: image::ImageFormat) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(12, 8, image::Rgb([10, 120, 200]));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), format).unwrap();
    bytes
}

const SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="30" height="10"><rect width="30" height="10" fill="red"/></svg>"#;

#[test]
fn test_ingest_png_and_jpeg() {
    let store = ImageStore::new();
    let png = store.ingest(&encode(image::ImageFormat::Png), None).unwrap();
    let jpeg = store
        .ingest(&encode(image::ImageFormat::Jpeg), Some("image/jpeg"))
        .unwrap();

    let decoded = store.get(&png).unwrap();
    assert_eq!(decoded.format, SourceFormat::Png);
    assert!(matches!(decoded.pixels, ImagePixels::Raster(_)));
    assert_eq!(store.natural_size(&jpeg).map(|s| (s.width, s.height)), Some((12.0, 8.0)));
    assert_eq!(store.len(), 2);
}

#[test]
fn test_ingest_svg_uses_document_size() {
    let store = ImageStore::new();
    let source = store.ingest(SVG.as_bytes(), Some("image/svg+xml")).unwrap();
    let size = store.natural_size(&source).unwrap();
    assert_eq!((size.width, size.height), (30.0, 10.0));
}

#[test]
fn test_same_bytes_same_ref() {
    let store = ImageStore::new();
    let bytes = encode(image::ImageFormat::Png);
    let a = store.ingest(&bytes, None).unwrap();
    let b = store.ingest(&bytes, Some("image/png")).unwrap();
    assert_eq!(a, b);
    assert_eq!(store.len(), 1);
}

#[test]
fn test_rejects_unsupported_formats() {
    let store = ImageStore::new();
    let gif = b"GIF89a\x01\x00\x01\x00\x00\x00\x00;";
    let err = store.ingest(gif, None).unwrap_err();
    assert!(matches!(
        err,
        Error::Image(ImageError::UnsupportedImageFormat { .. })
    ));

    let err = store
        .ingest(&encode(image::ImageFormat::Png), Some("image/webp"))
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Image(ImageError::UnsupportedImageFormat { .. })
    ));
    assert!(store.is_empty());
}

#[test]
fn test_declared_mime_must_match_content() {
    let store = ImageStore::new();
    let err = store
        .ingest(&encode(image::ImageFormat::Png), Some("image/jpeg"))
        .unwrap_err();
    assert!(matches!(err, Error::Image(ImageError::Decode { .. })));
}

#[test]
fn test_truncated_png_fails_to_decode() {
    let store = ImageStore::new();
    let bytes = encode(image::ImageFormat::Png);
    let err = store.ingest(&bytes[..bytes.len() / 2], None).unwrap_err();
    assert!(matches!(err, Error::Image(ImageError::Decode { .. })));
}
