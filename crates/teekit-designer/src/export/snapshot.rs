//! Copy-on-write handoff between the editing thread and export workers.

use parking_lot::RwLock;
use std::sync::Arc;

use crate::document::Document;
use crate::image_store::ImageStore;

/// Shared slot holding the current state of one open document.
///
/// Readers take an `Arc` clone and never block on writers for longer than
/// the clone. Writers mutate in place when no snapshot is outstanding and
/// copy otherwise, so a snapshot never changes after it was taken.
#[derive(Debug, Clone)]
pub struct DocumentSlot {
    inner: Arc<RwLock<Arc<Document>>>,
}

impl DocumentSlot {
    pub fn new(document: Document) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(document))),
        }
    }

    /// Current immutable snapshot
    pub fn load(&self) -> Arc<Document> {
        self.inner.read().clone()
    }

    /// Mutate the document, copying it first if a snapshot is held elsewhere
    pub fn update<R>(&self, f: impl FnOnce(&mut Document) -> R) -> R {
        let mut guard = self.inner.write();
        f(Arc::make_mut(&mut guard))
    }

    /// Swap in a whole new document state
    pub fn replace(&self, document: Document) {
        *self.inner.write() = Arc::new(document);
    }
}

/// Everything a render worker reads
#[derive(Debug, Clone)]
pub struct RenderSnapshot {
    pub document: Arc<Document>,
    pub images: Arc<ImageStore>,
}

impl RenderSnapshot {
    pub fn capture(slot: &DocumentSlot, images: &Arc<ImageStore>) -> Self {
        Self {
            document: slot.load(),
            images: Arc::clone(images),
        }
    }
}
