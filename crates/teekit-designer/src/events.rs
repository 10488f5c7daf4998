//! Change notifications published on a session's event bus.
//!
//! Document events carry an immutable snapshot so observers never need to
//! call back into the session to read the new state.

use std::sync::Arc;
use uuid::Uuid;

use teekit_core::{BusEvent, EventCategory};

use crate::document::Document;
use crate::export::{ExportJob, JobId};
use crate::model::{AreaId, ElementId};

#[derive(Debug, Clone)]
pub enum DocumentEvent {
    Opened {
        document_id: Uuid,
        snapshot: Arc<Document>,
    },
    Changed {
        revision: u64,
        snapshot: Arc<Document>,
    },
    Closed {
        document_id: Uuid,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionEvent {
    Changed {
        selected: Option<ElementId>,
        active_area: AreaId,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryEvent {
    Changed { can_undo: bool, can_redo: bool },
    /// Both stacks were discarded (purge of a referenced element)
    Cleared,
}

#[derive(Debug, Clone)]
pub enum ExportEvent {
    /// Any status, progress or artifact change of a job
    JobUpdated(ExportJob),
    /// Job deleted from the queue
    JobRemoved { id: JobId },
}

/// Everything an editor session publishes
#[derive(Debug, Clone)]
pub enum EditorEvent {
    Document(DocumentEvent),
    Selection(SelectionEvent),
    History(HistoryEvent),
    Export(ExportEvent),
}

impl BusEvent for EditorEvent {
    fn category(&self) -> EventCategory {
        match self {
            EditorEvent::Document(_) => EventCategory::Document,
            EditorEvent::Selection(_) => EventCategory::Selection,
            EditorEvent::History(_) => EventCategory::History,
            EditorEvent::Export(ExportEvent::JobUpdated(job)) if job.error.is_some() => {
                EventCategory::Error
            }
            EditorEvent::Export(_) => EventCategory::Export,
        }
    }

    fn description(&self) -> String {
        match self {
            EditorEvent::Document(DocumentEvent::Opened { document_id, .. }) => {
                format!("Document {} opened", document_id)
            }
            EditorEvent::Document(DocumentEvent::Changed { revision, .. }) => {
                format!("Document changed (revision {})", revision)
            }
            EditorEvent::Document(DocumentEvent::Closed { document_id }) => {
                format!("Document {} closed", document_id)
            }
            EditorEvent::Selection(SelectionEvent::Changed {
                selected,
                active_area,
            }) => match selected {
                Some(id) => format!("Selected element {} on {}", id, active_area),
                None => format!("Selection cleared on {}", active_area),
            },
            EditorEvent::History(HistoryEvent::Changed { can_undo, can_redo }) => {
                format!("History changed (undo: {}, redo: {})", can_undo, can_redo)
            }
            EditorEvent::History(HistoryEvent::Cleared) => "History cleared".to_string(),
            EditorEvent::Export(ExportEvent::JobUpdated(job)) => {
                format!("Export job {} {} ({}%)", job.id, job.status, job.progress)
            }
            EditorEvent::Export(ExportEvent::JobRemoved { id }) => {
                format!("Export job {} removed", id)
            }
        }
    }
}

impl From<DocumentEvent> for EditorEvent {
    fn from(event: DocumentEvent) -> Self {
        EditorEvent::Document(event)
    }
}

impl From<SelectionEvent> for EditorEvent {
    fn from(event: SelectionEvent) -> Self {
        EditorEvent::Selection(event)
    }
}

impl From<HistoryEvent> for EditorEvent {
    fn from(event: HistoryEvent) -> Self {
        EditorEvent::History(event)
    }
}

impl From<ExportEvent> for EditorEvent {
    fn from(event: ExportEvent) -> Self {
        EditorEvent::Export(event)
    }
}
