//! Editor session: the aggregate UI code talks to.
//! Owns the open document, its history, the selection, the image store and
//! the export queue, and publishes every change on its own event bus.
//!
//! This module is split into submodules for better organization:
//! - `elements`: Element creation, updates, removal and ordering
//! - `history`: Undo/redo functionality
//! - `selection`: Selection, drag gestures and keyboard edits
//! - `file_io`: Open, save, load and duplicate
//! - `export`: Export requests and queue management

mod elements;
mod export;
mod file_io;
mod history;
mod selection;

use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;

use teekit_core::{Error, EventBus, EventBusConfig, NotFoundError, Result};
use teekit_settings::Config;

use crate::commands::DesignerCommand;
use crate::document::{Area, Document};
use crate::events::{
    DocumentEvent, EditorEvent, HistoryEvent, SelectionEvent,
};
use crate::export::{DocumentSlot, ExportQueue, ExportScheduler};
use crate::font_manager::{FontMeasurer, TextMeasurer};
use crate::geometry::{bounding_box, Rect};
use crate::history::History;
use crate::image_store::ImageStore;
use crate::interaction::InteractionEngine;
use crate::model::{AreaId, Element, ElementId};
use crate::renderer::RendererRegistry;
use crate::selection_manager::SelectionManager;

/// The document currently open in a session with its history
struct OpenDocument {
    slot: DocumentSlot,
    history: History,
}

pub struct EditorSession {
    config: Config,
    document: Option<OpenDocument>,
    selection: SelectionManager,
    interaction: InteractionEngine,
    images: Arc<ImageStore>,
    measurer: Arc<dyn TextMeasurer>,
    events: Arc<EventBus<EditorEvent>>,
    queue: Arc<ExportQueue>,
    renderers: Arc<RwLock<RendererRegistry>>,
    export_permits: Arc<Semaphore>,
    scheduler: Option<ExportScheduler>,
    current_file_path: Option<PathBuf>,
    is_modified: bool,
}

impl EditorSession {
    /// Session measuring text with system fonts
    pub fn new(config: Config) -> Self {
        Self::with_measurer(config, Arc::new(FontMeasurer))
    }

    pub fn with_measurer(config: Config, measurer: Arc<dyn TextMeasurer>) -> Self {
        let events = Arc::new(EventBus::with_config(EventBusConfig {
            channel_capacity: config.events.channel_capacity,
            enable_history: config.events.enable_history,
            max_history_size: config.events.max_history_size,
            ..EventBusConfig::default()
        }));
        let queue = Arc::new(ExportQueue::with_events(Arc::clone(&events)));
        let renderers = Arc::new(RwLock::new(RendererRegistry::with_defaults(Arc::clone(
            &measurer,
        ))));
        let export_permits = ExportScheduler::permits(&config.export);
        Self {
            config,
            document: None,
            selection: SelectionManager::new(),
            interaction: InteractionEngine::new(),
            images: Arc::new(ImageStore::new()),
            measurer,
            events,
            queue,
            renderers,
            export_permits,
            scheduler: None,
            current_file_path: None,
            is_modified: false,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn events(&self) -> &Arc<EventBus<EditorEvent>> {
        &self.events
    }

    pub fn images(&self) -> &Arc<ImageStore> {
        &self.images
    }

    pub fn measurer(&self) -> &Arc<dyn TextMeasurer> {
        &self.measurer
    }

    pub fn is_open(&self) -> bool {
        self.document.is_some()
    }

    /// Whether the open document changed since it was opened or saved
    pub fn is_modified(&self) -> bool {
        self.is_modified
    }

    pub fn current_file_path(&self) -> Option<&PathBuf> {
        self.current_file_path.as_ref()
    }

    fn open_document(&self) -> Result<&OpenDocument> {
        self.document.as_ref().ok_or(Error::NoDocument)
    }

    /// Immutable snapshot of the open document
    pub fn document_snapshot(&self) -> Result<Arc<Document>> {
        Ok(self.open_document()?.slot.load())
    }

    /// All four areas in canonical order
    pub fn list_areas(&self) -> Result<Vec<Area>> {
        Ok(self.document_snapshot()?.areas().cloned().collect())
    }

    pub fn get_element(&self, id: ElementId) -> Result<Element> {
        self.document_snapshot()?
            .element(id)
            .cloned()
            .ok_or_else(|| NotFoundError::from(id).into())
    }

    /// Elements of an area in paint order, bottom first
    pub fn elements_in(&self, area: AreaId) -> Result<Vec<Element>> {
        Ok(self
            .document_snapshot()?
            .elements_in(area)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Axis-aligned bounds of an element in area coordinates
    pub fn bounding_box(&self, id: ElementId) -> Result<Rect> {
        let element = self.get_element(id)?;
        Ok(bounding_box(&element, self.measurer.as_ref()))
    }

    fn publish(&self, event: impl Into<EditorEvent>) {
        if let Err(e) = self.events.publish(event.into()) {
            tracing::trace!("Event not delivered: {}", e);
        }
    }

    /// Run a command through the history and publish the outcome
    fn execute(&mut self, command: DesignerCommand) -> Result<()> {
        let open = self.document.as_mut().ok_or(Error::NoDocument)?;
        open.slot
            .update(|doc| open.history.execute(command, doc))?;
        self.after_change();
        Ok(())
    }

    /// Publish document and history state, then drop a stale selection
    fn after_change(&mut self) {
        let Some(open) = self.document.as_ref() else {
            return;
        };
        let snapshot = open.slot.load();
        let history_event = HistoryEvent::Changed {
            can_undo: open.history.can_undo(),
            can_redo: open.history.can_redo(),
        };
        self.is_modified = true;

        if let Some(dragged) = self.interaction.dragged_element() {
            if !snapshot.contains(dragged) {
                self.interaction.cancel_drag();
            }
        }
        let selection_cleared = self.selection.revalidate(&snapshot);

        self.publish(DocumentEvent::Changed {
            revision: snapshot.revision(),
            snapshot,
        });
        self.publish(history_event);
        if selection_cleared {
            self.publish_selection();
        }
    }

    fn publish_selection(&self) {
        self.publish(SelectionEvent::Changed {
            selected: self.selection.selected_id(),
            active_area: self.selection.active_area(),
        });
    }

    fn slot(&self) -> Result<&DocumentSlot> {
        Ok(&self.open_document()?.slot)
    }
}

impl std::fmt::Debug for EditorSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorSession")
            .field("open", &self.is_open())
            .field("selection", &self.selection)
            .field("images", &self.images.len())
            .field("queue", &self.queue)
            .finish()
    }
}
