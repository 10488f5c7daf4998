//! # TeeKit Core
//!
//! Core types and utilities shared by every TeeKit crate.
//! Provides the error taxonomy, the change-notification event bus and
//! print unit conversions.

pub mod error;
pub mod event_bus;
pub mod units;

pub use error::{
    Error, ExportError, ImageError, NotFoundError, RenderError, Result, ValidationError,
};

// Re-export event bus for convenience
pub use event_bus::{
    BusEvent, EventBus, EventBusConfig, EventBusError, EventCategory, EventFilter, SubscriptionId,
};

pub use units::PrintSize;
