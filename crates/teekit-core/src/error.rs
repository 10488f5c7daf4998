//! Error handling for TeeKit
//!
//! Provides error types for all layers of the design engine:
//! - Validation errors (malformed field values on create/update)
//! - Lookup errors (missing elements, areas, jobs, image sources)
//! - Image ingestion errors (unsupported or corrupt input)
//! - Export request errors (bad settings, busy jobs)
//! - Render errors (captured into a job's terminal state)
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Validation error type
///
/// Raised when a create/update operation carries a malformed value. The
/// operation is rejected and the document is left unchanged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A field carries a value outside its allowed range
    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue {
        /// The field name.
        field: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// A field name that does not exist for the element variant
    #[error("Unknown field '{field}' for {variant} element")]
    UnknownField {
        /// The rejected field name.
        field: String,
        /// The element variant ("text" or "image").
        variant: String,
    },

    /// A required field is missing
    #[error("Missing required field '{field}'")]
    MissingField {
        /// The missing field name.
        field: String,
    },

    /// Structural problem in a loaded document
    #[error("Inconsistent document: {reason}")]
    Inconsistent {
        /// Description of the inconsistency.
        reason: String,
    },
}

impl ValidationError {
    /// Shorthand for [`ValidationError::InvalidValue`]
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Lookup error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotFoundError {
    /// No element with this id in the document
    #[error("Element {id} not found")]
    Element {
        /// The element id.
        id: u64,
    },

    /// Unknown area identifier
    #[error("Area '{area}' not found")]
    Area {
        /// The area identifier as given.
        area: String,
    },

    /// No export job with this id in the queue
    #[error("Export job {id} not found")]
    Job {
        /// The job id.
        id: u64,
    },

    /// No decoded image for this source reference
    #[error("Image source {source_ref} not found")]
    Source {
        /// The opaque source reference.
        source_ref: String,
    },
}

/// Image ingestion error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageError {
    /// Input is not PNG, JPEG or SVG
    #[error("Unsupported image format: {detected}")]
    UnsupportedImageFormat {
        /// The detected or declared format.
        detected: String,
    },

    /// Input claims a supported format but could not be decoded
    #[error("Failed to decode {format} image: {reason}")]
    Decode {
        /// The format that was attempted.
        format: String,
        /// Decoder message.
        reason: String,
    },
}

/// Export request error type
///
/// Raised synchronously when an export request itself is malformed; failures
/// that happen while rendering are [`RenderError`]s captured into the job.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExportError {
    /// Format string is not one of the known export formats
    #[error("Unsupported export format: {format}")]
    UnsupportedExportFormat {
        /// The rejected format string.
        format: String,
    },

    /// Settings are out of range
    #[error("Invalid export settings: {reason}")]
    InvalidSettings {
        /// Why the settings were rejected.
        reason: String,
    },

    /// Job is processing and must be cancelled before removal
    #[error("Export job {id} is processing; request cancellation first")]
    JobBusy {
        /// The job id.
        id: u64,
    },

    /// Only failed jobs can be resubmitted
    #[error("Export job {id} is {status} and cannot be retried")]
    NotRetryable {
        /// The job id.
        id: u64,
        /// The job's current status.
        status: String,
    },

    /// No scheduler is attached to the queue
    #[error("Export scheduler is not running")]
    SchedulerStopped,
}

/// Render error type
///
/// Captured into an export job's `failed` state; never propagated as a crash.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// No renderer is registered for the requested format
    #[error("No renderer available for format {format}")]
    UnsupportedFormat {
        /// The export format.
        format: String,
    },

    /// An image element references a source that is no longer in the store
    #[error("Image source {source_ref} is missing")]
    MissingSource {
        /// The missing source reference.
        source_ref: String,
    },

    /// No font face could be resolved for a text element
    #[error("No font available for family '{family}'")]
    MissingFont {
        /// The requested font family.
        family: String,
    },

    /// Requested output exceeds the configured pixel budget
    #[error("Output {width}x{height} exceeds the limit of {limit} pixels")]
    CanvasTooLarge {
        /// Output width in pixels.
        width: u32,
        /// Output height in pixels.
        height: u32,
        /// Configured pixel limit.
        limit: u64,
    },

    /// Encoding the output bytes failed
    #[error("Failed to encode {format}: {reason}")]
    Encode {
        /// The export format.
        format: String,
        /// Encoder message.
        reason: String,
    },

    /// Cancellation was requested while processing
    #[error("Export cancelled")]
    Cancelled,

    /// Processing exceeded the configured time budget
    #[error("Export timed out after {timeout_ms}ms")]
    Timeout {
        /// The timeout duration in milliseconds.
        timeout_ms: u64,
    },

    /// The render worker terminated unexpectedly
    #[error("Render worker failed: {reason}")]
    Worker {
        /// Description of the failure.
        reason: String,
    },
}

/// Main error type for TeeKit
///
/// A unified error type that can represent any error from all layers.
/// This is the primary error type used in public APIs.
#[derive(Error, Debug)]
pub enum Error {
    /// Validation error
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Lookup error
    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    /// Image ingestion error
    #[error(transparent)]
    Image(#[from] ImageError),

    /// Export request error
    #[error(transparent)]
    Export(#[from] ExportError),

    /// Render error
    #[error(transparent)]
    Render(#[from] RenderError),

    /// Operation requires an open document
    #[error("No document is open")]
    NoDocument,

    /// Design file could not be parsed or produced
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    /// Check if this is a lookup error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// Check if this is an unsupported image format error
    pub fn is_unsupported_image(&self) -> bool {
        matches!(
            self,
            Error::Image(ImageError::UnsupportedImageFormat { .. })
        )
    }

    /// Check if this is an unsupported export format error
    pub fn is_unsupported_export(&self) -> bool {
        matches!(
            self,
            Error::Export(ExportError::UnsupportedExportFormat { .. })
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
