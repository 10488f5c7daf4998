//! Document lifecycle: new, open, close, save, load and duplicate.

use std::path::Path;
use std::sync::Arc;

use teekit_core::{Error, Result};

use super::{EditorSession, OpenDocument};
use crate::document::Document;
use crate::events::DocumentEvent;
use crate::export::DocumentSlot;
use crate::history::History;
use crate::serialization::{load_document, DesignFile};

impl EditorSession {
    /// Open a fresh, empty document
    pub fn new_document(&mut self, name: impl Into<String>) -> Arc<Document> {
        self.open(Document::new(name))
    }

    /// Make `document` the open document, closing any previous one.
    /// Export jobs queued from the previous document are unaffected.
    pub fn open(&mut self, document: Document) -> Arc<Document> {
        if self.document.is_some() {
            self.close();
        }
        let document_id = document.id;
        let slot = DocumentSlot::new(document);
        let snapshot = slot.load();
        self.document = Some(OpenDocument {
            slot,
            history: History::with_max_depth(self.config.history.max_depth),
        });
        self.selection = Default::default();
        self.interaction = Default::default();
        self.is_modified = false;
        tracing::info!("Opened document '{}' ({})", snapshot.name, document_id);

        self.publish(DocumentEvent::Opened {
            document_id,
            snapshot: Arc::clone(&snapshot),
        });
        self.publish_selection();
        snapshot
    }

    /// Close the open document. Returns false if none was open.
    pub fn close(&mut self) -> bool {
        let Some(open) = self.document.take() else {
            return false;
        };
        let document_id = open.slot.load().id;
        self.selection = Default::default();
        self.interaction = Default::default();
        self.current_file_path = None;
        self.is_modified = false;
        tracing::info!("Closed document {}", document_id);
        self.publish(DocumentEvent::Closed { document_id });
        true
    }

    /// Open a copy of the current document under a new id
    pub fn duplicate_document(&mut self) -> Result<Arc<Document>> {
        let copy = self.document_snapshot()?.duplicate();
        self.current_file_path = None;
        Ok(self.open(copy))
    }

    /// Design-file JSON for the open document, images embedded
    pub fn to_json(&self) -> Result<String> {
        let snapshot = self.document_snapshot()?;
        DesignFile::from_document(&snapshot, Some(self.images.as_ref())).to_json()
    }

    /// Parse design-file JSON and open it
    pub fn load_json(&mut self, json: &str) -> Result<Arc<Document>> {
        let document = load_document(json, Some(self.images.as_ref()))?;
        Ok(self.open(document))
    }

    pub fn save_to_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let snapshot = self.document_snapshot()?;
        DesignFile::from_document(&snapshot, Some(self.images.as_ref())).save_to_file(&path)?;
        self.current_file_path = Some(path.as_ref().to_path_buf());
        self.is_modified = false;
        self.config.add_recent_file(path.as_ref().to_path_buf());
        Ok(())
    }

    pub fn load_from_file(&mut self, path: impl AsRef<Path>) -> Result<Arc<Document>> {
        let design = DesignFile::load_from_file(&path).map_err(|e| match e {
            Error::Io(io) => Error::Io(std::io::Error::new(
                io.kind(),
                format!("{}: {}", path.as_ref().display(), io),
            )),
            other => other,
        })?;
        let document = design.into_document(Some(self.images.as_ref()))?;
        let snapshot = self.open(document);
        self.current_file_path = Some(path.as_ref().to_path_buf());
        self.config.add_recent_file(path.as_ref().to_path_buf());
        Ok(snapshot)
    }
}
