//! Serialization and deserialization for design files.
//!
//! Implements save/load for TeeKit design documents using a versioned JSON
//! format. Unknown fields are ignored, missing optional fields take the
//! element defaults and missing areas are created empty.

use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use uuid::Uuid;

use teekit_core::{Error, NotFoundError, Result, ValidationError};

use crate::document::{Area, Document, DEFAULT_AREA_BACKGROUND};
use crate::geometry::Point;
use crate::image_store::{ImageStore, SourceRef};
use crate::model::{
    AreaId, Color, Element, ElementId, ElementKind, ElementTransform, FontStyle, FontWeight,
    ImageElement, Scale, TextAlign, TextElement, DEFAULT_FONT_FAMILY, DEFAULT_FONT_SIZE_PT,
};

/// Design file format version
pub const FILE_FORMAT_VERSION: &str = "1.0";

/// Complete design file structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignFile {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub metadata: DesignMetadata,
    #[serde(default)]
    pub next_element_id: u64,
    #[serde(default)]
    pub areas: BTreeMap<String, AreaData>,
    /// Embedded image bytes keyed by source reference
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub assets: BTreeMap<String, AssetData>,
}

/// Design metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignMetadata {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub last_modified_at: DateTime<Utc>,
}

impl Default for DesignMetadata {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: default_name(),
            created_at: now,
            last_modified_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaData {
    #[serde(default = "default_background")]
    pub background_color: Color,
    #[serde(default)]
    pub elements: Vec<ElementData>,
}

/// Serialized element, tagged by `type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ElementData {
    Text(TextData),
    Image(ImageData),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextData {
    pub id: u64,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub rotation: f64,
    #[serde(default = "default_scale")]
    pub scale_x: f64,
    #[serde(default = "default_scale")]
    pub scale_y: f64,
    #[serde(default)]
    pub content: String,
    #[serde(default = "default_font_family")]
    pub font_family: String,
    #[serde(default = "default_font_size")]
    pub font_size: f64,
    #[serde(default = "default_fill")]
    pub fill: Color,
    #[serde(default)]
    pub font_weight: FontWeight,
    #[serde(default)]
    pub font_style: FontStyle,
    #[serde(default)]
    pub text_align: TextAlign,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageData {
    pub id: u64,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub rotation: f64,
    #[serde(default = "default_scale")]
    pub scale_x: f64,
    #[serde(default = "default_scale")]
    pub scale_y: f64,
    pub source_ref: SourceRef,
    pub natural_width: f64,
    pub natural_height: f64,
}

/// Embedded image bytes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetData {
    pub mime: String,
    /// Base64 (standard alphabet)
    pub data: String,
}

fn default_version() -> String {
    FILE_FORMAT_VERSION.to_string()
}
fn default_name() -> String {
    "Untitled design".to_string()
}
fn default_background() -> Color {
    DEFAULT_AREA_BACKGROUND
}
fn default_scale() -> f64 {
    1.0
}
fn default_font_family() -> String {
    DEFAULT_FONT_FAMILY.to_string()
}
fn default_font_size() -> f64 {
    DEFAULT_FONT_SIZE_PT
}
fn default_fill() -> Color {
    Color::BLACK
}

impl ElementData {
    pub fn id(&self) -> u64 {
        match self {
            ElementData::Text(t) => t.id,
            ElementData::Image(i) => i.id,
        }
    }

    pub fn from_element(element: &Element) -> Self {
        let t = &element.transform;
        match &element.kind {
            ElementKind::Text(text) => ElementData::Text(TextData {
                id: element.id.0,
                x: t.position.x,
                y: t.position.y,
                rotation: t.rotation,
                scale_x: t.scale.sx,
                scale_y: t.scale.sy,
                content: text.content.clone(),
                font_family: text.font_family.clone(),
                font_size: text.font_size_pt,
                fill: text.fill_color,
                font_weight: text.font_weight,
                font_style: text.font_style,
                text_align: text.text_align,
            }),
            ElementKind::Image(image) => ElementData::Image(ImageData {
                id: element.id.0,
                x: t.position.x,
                y: t.position.y,
                rotation: t.rotation,
                scale_x: t.scale.sx,
                scale_y: t.scale.sy,
                source_ref: image.source_ref.clone(),
                natural_width: image.natural_width,
                natural_height: image.natural_height,
            }),
        }
    }

    /// Build and validate the element for `area`
    pub fn to_element(&self, area: AreaId) -> std::result::Result<Element, ValidationError> {
        let (id, x, y, rotation, sx, sy, kind) = match self {
            ElementData::Text(d) => (
                d.id,
                d.x,
                d.y,
                d.rotation,
                d.scale_x,
                d.scale_y,
                ElementKind::Text(TextElement {
                    content: d.content.clone(),
                    font_family: d.font_family.clone(),
                    font_size_pt: d.font_size,
                    fill_color: d.fill,
                    font_weight: d.font_weight,
                    font_style: d.font_style,
                    text_align: d.text_align,
                }),
            ),
            ElementData::Image(d) => (
                d.id,
                d.x,
                d.y,
                d.rotation,
                d.scale_x,
                d.scale_y,
                ElementKind::Image(ImageElement {
                    source_ref: d.source_ref.clone(),
                    natural_width: d.natural_width,
                    natural_height: d.natural_height,
                }),
            ),
        };

        // Validate the raw rotation before normalizing hides a NaN
        if !rotation.is_finite() {
            return Err(ValidationError::invalid("rotation", "must be finite"));
        }
        let element = Element {
            id: ElementId(id),
            area_id: area,
            transform: ElementTransform::new(Point::new(x, y), rotation, Scale::new(sx, sy)),
            kind,
        };
        element.validate()?;
        Ok(element)
    }
}

impl DesignFile {
    /// Capture a document. With an image store, referenced image bytes are
    /// embedded so the file is self-contained.
    pub fn from_document(doc: &Document, images: Option<&ImageStore>) -> Self {
        let mut assets = BTreeMap::new();
        let areas = doc
            .areas()
            .map(|area| {
                let elements = doc
                    .elements_in(area.id)
                    .into_iter()
                    .map(|element| {
                        if let (Some(store), ElementKind::Image(image)) = (images, &element.kind) {
                            if let Some(decoded) = store.get(&image.source_ref) {
                                assets
                                    .entry(image.source_ref.to_string())
                                    .or_insert_with(|| AssetData {
                                        mime: decoded.format.mime_type().to_string(),
                                        data: general_purpose::STANDARD.encode(&*decoded.data),
                                    });
                            }
                        }
                        ElementData::from_element(element)
                    })
                    .collect();
                (
                    area.id.as_str().to_string(),
                    AreaData {
                        background_color: area.background_color,
                        elements,
                    },
                )
            })
            .collect();

        Self {
            version: FILE_FORMAT_VERSION.to_string(),
            metadata: DesignMetadata {
                id: doc.id,
                name: doc.name.clone(),
                created_at: doc.created_at,
                last_modified_at: doc.last_modified_at,
            },
            next_element_id: doc.next_element_id(),
            areas,
            assets,
        }
    }

    /// Rebuild the document, validating every element.
    ///
    /// With an image store, embedded assets are ingested first and every
    /// image element must resolve against the store.
    pub fn into_document(self, images: Option<&ImageStore>) -> Result<Document> {
        let major = self.version.split('.').next().unwrap_or_default();
        if major != "1" {
            return Err(Error::Serialization(format!(
                "unsupported design file version {}",
                self.version
            )));
        }

        if let Some(store) = images {
            for (key, asset) in &self.assets {
                let bytes = general_purpose::STANDARD
                    .decode(asset.data.as_bytes())
                    .map_err(|e| Error::Serialization(format!("asset {}: {}", key, e)))?;
                let source_ref = store.ingest(&bytes, Some(&asset.mime))?;
                if source_ref.as_str() != key {
                    tracing::warn!("Asset {} hashes to {}", key, source_ref);
                }
            }
        }

        let mut areas = BTreeMap::new();
        let mut elements = BTreeMap::new();
        for (key, data) in self.areas {
            let Ok(area_id) = key.parse::<AreaId>() else {
                tracing::warn!("Ignoring unknown area '{}' in design file", key);
                continue;
            };
            let mut area = Area::new(area_id);
            area.background_color = data.background_color;

            for element_data in &data.elements {
                let element = element_data.to_element(area_id)?;
                if let (Some(store), ElementKind::Image(image)) = (images, &element.kind) {
                    if !store.contains(&image.source_ref) {
                        return Err(NotFoundError::Source {
                            source_ref: image.source_ref.to_string(),
                        }
                        .into());
                    }
                }
                if elements.contains_key(&element.id) {
                    return Err(ValidationError::Inconsistent {
                        reason: format!("duplicate element id {}", element.id),
                    }
                    .into());
                }
                area.elements.push(element.id);
                elements.insert(element.id, element);
            }
            areas.insert(area_id, area);
        }

        Document::from_parts(
            self.metadata.id,
            self.metadata.name,
            self.metadata.created_at,
            self.metadata.last_modified_at,
            areas,
            elements,
            self.next_element_id,
        )
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Save design to file
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = self.to_json()?;
        std::fs::write(path.as_ref(), json)?;
        tracing::debug!("Saved design to {}", path.as_ref().display());
        Ok(())
    }

    /// Load design from file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }
}

/// Serialize a document to design-file JSON
pub fn save_document(doc: &Document, images: Option<&ImageStore>) -> Result<String> {
    DesignFile::from_document(doc, images).to_json()
}

/// Parse design-file JSON into a document
pub fn load_document(json: &str, images: Option<&ImageStore>) -> Result<Document> {
    DesignFile::from_json(json)?.into_document(images)
}
