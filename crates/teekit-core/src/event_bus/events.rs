//! Event categories shared by every event type carried on an [`EventBus`].
//!
//! Concrete event enums live next to the state they describe (the designer
//! crate defines `EditorEvent`); this module only fixes the vocabulary used
//! for filtering.
//!
//! [`EventBus`]: super::EventBus

use serde::{Deserialize, Serialize};

/// Event category for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventCategory {
    /// Document lifecycle and content changes.
    Document,
    /// Selection and active-area changes.
    Selection,
    /// Undo/redo availability changes.
    History,
    /// Export job transitions and progress.
    Export,
    /// Error and diagnostic events.
    Error,
}

impl std::fmt::Display for EventCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventCategory::Document => write!(f, "Document"),
            EventCategory::Selection => write!(f, "Selection"),
            EventCategory::History => write!(f, "History"),
            EventCategory::Export => write!(f, "Export"),
            EventCategory::Error => write!(f, "Error"),
        }
    }
}

/// An event that can be published on an [`EventBus`](super::EventBus).
pub trait BusEvent: Clone + Send + Sync + 'static {
    /// Get the category of this event
    fn category(&self) -> EventCategory;

    /// Get a short description of this event for logging
    fn description(&self) -> String;
}
