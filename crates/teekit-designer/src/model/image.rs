use serde::{Deserialize, Serialize};

use teekit_core::ValidationError;

use super::{validate_finite, TransformInit};
use crate::image_store::SourceRef;

/// Image element fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageElement {
    pub source_ref: SourceRef,
    pub natural_width: f64,
    pub natural_height: f64,
}

impl ImageElement {
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in [
            ("naturalWidth", self.natural_width),
            ("naturalHeight", self.natural_height),
        ] {
            validate_finite(field, value)?;
            if value <= 0.0 {
                return Err(ValidationError::invalid(field, "must be greater than zero"));
            }
        }
        Ok(())
    }
}

/// Initial fields for an image element
#[derive(Debug, Clone, PartialEq)]
pub struct ImageInit {
    pub source_ref: SourceRef,
    pub transform: TransformInit,
}

impl ImageInit {
    pub fn new(source_ref: SourceRef) -> Self {
        Self {
            source_ref,
            transform: TransformInit::default(),
        }
    }
}
