//! Image ingestion.
//!
//! Raw PNG, JPEG or SVG bytes are validated and decoded once, then exposed
//! to the element model only through an opaque [`SourceRef`]. The store is
//! append-only and shared between a session and its export workers.

use image::RgbaImage;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use teekit_core::{ImageError, Result};

use crate::geometry::Size;

/// Content hash of an ingested image (lowercase hex SHA-256)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceRef(String);

impl SourceRef {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let digest = Sha256::digest(bytes);
        let mut hex = String::with_capacity(digest.len() * 2);
        for byte in digest.iter() {
            hex.push_str(&format!("{:02x}", byte));
        }
        Self(hex)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Accepted input formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Png,
    Jpeg,
    Svg,
}

impl SourceFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            SourceFormat::Png => "image/png",
            SourceFormat::Jpeg => "image/jpeg",
            SourceFormat::Svg => "image/svg+xml",
        }
    }

    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        match essence.as_str() {
            "image/png" => Some(SourceFormat::Png),
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(SourceFormat::Jpeg),
            "image/svg+xml" => Some(SourceFormat::Svg),
            _ => None,
        }
    }

    /// Detect the format from leading bytes
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";
        const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];

        if bytes.starts_with(PNG_MAGIC) {
            return Some(SourceFormat::Png);
        }
        if bytes.starts_with(JPEG_MAGIC) {
            return Some(SourceFormat::Jpeg);
        }

        let head = &bytes[..bytes.len().min(1024)];
        let text = String::from_utf8_lossy(head);
        let text = text.trim_start_matches('\u{feff}').trim_start();
        if (text.starts_with("<?xml") || text.starts_with("<svg") || text.starts_with("<!--"))
            && text.contains("<svg")
        {
            return Some(SourceFormat::Svg);
        }
        None
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceFormat::Png => write!(f, "png"),
            SourceFormat::Jpeg => write!(f, "jpeg"),
            SourceFormat::Svg => write!(f, "svg"),
        }
    }
}

/// Decoded pixel or vector data
#[derive(Debug, Clone)]
pub enum ImagePixels {
    Raster(RgbaImage),
    /// Validated SVG source; parsed again at render time
    Vector,
}

/// An ingested image
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub format: SourceFormat,
    /// Natural size in design units
    pub size: Size,
    pub pixels: ImagePixels,
    /// Original bytes as ingested
    pub data: Arc<Vec<u8>>,
}

impl DecodedImage {
    fn decode(format: SourceFormat, bytes: &[u8]) -> std::result::Result<Self, ImageError> {
        let decode_error = |reason: String| ImageError::Decode {
            format: format.to_string(),
            reason,
        };

        let (size, pixels) = match format {
            SourceFormat::Png | SourceFormat::Jpeg => {
                let codec = match format {
                    SourceFormat::Png => image::ImageFormat::Png,
                    _ => image::ImageFormat::Jpeg,
                };
                let decoded = image::load_from_memory_with_format(bytes, codec)
                    .map_err(|e| decode_error(e.to_string()))?
                    .to_rgba8();
                let size = Size::new(decoded.width() as f64, decoded.height() as f64);
                (size, ImagePixels::Raster(decoded))
            }
            SourceFormat::Svg => {
                let tree = usvg::Tree::from_data(bytes, &usvg::Options::default())
                    .map_err(|e| decode_error(e.to_string()))?;
                let svg_size = tree.size();
                let size = Size::new(svg_size.width() as f64, svg_size.height() as f64);
                (size, ImagePixels::Vector)
            }
        };

        if size.width <= 0.0 || size.height <= 0.0 {
            return Err(decode_error("image has no area".to_string()));
        }

        Ok(Self {
            format,
            size,
            pixels,
            data: Arc::new(bytes.to_vec()),
        })
    }
}

/// Content-addressed store of decoded images
#[derive(Debug, Default)]
pub struct ImageStore {
    images: RwLock<HashMap<SourceRef, Arc<DecodedImage>>>,
}

impl ImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and decode `bytes`, returning the reference for later use.
    ///
    /// A declared MIME type, when given, must name one of the accepted
    /// formats and agree with the sniffed content. Ingesting the same bytes
    /// twice yields the same reference.
    pub fn ingest(&self, bytes: &[u8], mime: Option<&str>) -> Result<SourceRef> {
        let declared = match mime {
            Some(mime) => Some(SourceFormat::from_mime(mime).ok_or_else(|| {
                ImageError::UnsupportedImageFormat {
                    detected: mime.to_string(),
                }
            })?),
            None => None,
        };

        let sniffed = SourceFormat::sniff(bytes).ok_or_else(|| {
            ImageError::UnsupportedImageFormat {
                detected: declared
                    .map(|f| f.to_string())
                    .unwrap_or_else(|| "unknown".to_string()),
            }
        })?;

        if let Some(declared) = declared {
            if declared != sniffed {
                return Err(ImageError::Decode {
                    format: declared.to_string(),
                    reason: format!("content is {}", sniffed),
                }
                .into());
            }
        }

        let source_ref = SourceRef::from_bytes(bytes);
        if self.images.read().contains_key(&source_ref) {
            tracing::debug!("Image {} already ingested", source_ref);
            return Ok(source_ref);
        }

        let decoded = DecodedImage::decode(sniffed, bytes)?;
        tracing::debug!(
            "Ingested {} image {} ({}x{})",
            sniffed,
            source_ref,
            decoded.size.width,
            decoded.size.height
        );
        self.images
            .write()
            .insert(source_ref.clone(), Arc::new(decoded));
        Ok(source_ref)
    }

    pub fn get(&self, source_ref: &SourceRef) -> Option<Arc<DecodedImage>> {
        self.images.read().get(source_ref).cloned()
    }

    pub fn contains(&self, source_ref: &SourceRef) -> bool {
        self.images.read().contains_key(source_ref)
    }

    /// Natural size in design units
    pub fn natural_size(&self, source_ref: &SourceRef) -> Option<Size> {
        self.images.read().get(source_ref).map(|img| img.size)
    }

    pub fn len(&self) -> usize {
        self.images.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.read().is_empty()
    }
}
