//! # TeeKit Designer
//!
//! Design document engine for garment print layouts. A document has four
//! fixed print areas (front, back and both sleeves); each area holds an
//! ordered stack of text and image elements.
//!
//! ## Core Components
//!
//! ### Document Model
//! - **Elements**: Immutable text and image records with a shared transform
//! - **Document**: Four areas and the element table they reference
//! - **Commands/History**: Reversible edits with undo and redo stacks
//!
//! ### Editing
//! - **Selection**: Single selection plus the active area
//! - **Interaction**: Move, rotate and scale drags committed as one command
//! - **Session**: The aggregate that owns a document and publishes events
//!
//! ### Output
//! - **Export Pipeline**: Job queue and bounded async workers
//! - **Renderers**: Raster (PNG/JPEG) and vector (SVG) output
//! - **Serialization**: Versioned JSON design files
//!
//! ## Architecture
//!
//! ```text
//! EditorSession
//!   ├── Document (areas, elements)
//!   │     └── History (commands)
//!   ├── SelectionManager / InteractionEngine
//!   ├── ImageStore (decoded sources)
//!   ├── EventBus<EditorEvent>
//!   └── ExportQueue
//!         └── ExportScheduler -> Renderer (snapshot only)
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use teekit_designer::{AreaId, EditorSession, ElementInit};
//! use teekit_settings::Config;
//!
//! let mut session = EditorSession::new(Config::default());
//! session.new_document("Tour shirt");
//! let id = session
//!     .add_element(AreaId::Front, ElementInit::text("Hi").at(20.0, 40.0))
//!     .unwrap();
//! assert_eq!(session.elements_in(AreaId::Front).unwrap()[0].id, id);
//!
//! session.undo().unwrap();
//! assert!(session.elements_in(AreaId::Front).unwrap().is_empty());
//! ```

pub mod commands;
pub mod document;
pub mod events;
pub mod export;
pub mod font_manager;
pub mod geometry;
pub mod history;
pub mod image_store;
pub mod interaction;
pub mod model;
pub mod renderer;
pub mod selection_manager;
pub mod serialization;
pub mod session;
pub mod svg_renderer;

pub use commands::DesignerCommand;
pub use document::{Area, Document, Tombstone};
pub use events::{DocumentEvent, EditorEvent, ExportEvent, HistoryEvent, SelectionEvent};
pub use export::{
    Artifact, Background, ErrorInfo, ErrorKind, ExportJob, ExportQueue, ExportSettings,
    ExportFormat, JobId, JobStatus, Sizing,
};
pub use font_manager::{ApproximateMeasurer, FontMeasurer, TextMeasurer};
pub use geometry::{bounding_box, compose_transform, hit_test, Point, Rect, Size};
pub use history::{History, HistoryStep};
pub use image_store::{ImageStore, SourceRef};
pub use interaction::{DragMode, InteractionEngine};
pub use model::{
    create_element, AreaId, Color, Element, ElementId, ElementInit, ElementKind, ElementPatch,
    ElementTransform, ElementVariant, Scale,
};
pub use renderer::{
    RasterRenderer, RenderContext, RenderOutput, RenderRequest, Renderer, RendererRegistry,
};
pub use selection_manager::SelectionManager;
pub use serialization::{load_document, save_document, DesignFile};
pub use session::EditorSession;
pub use svg_renderer::SvgRenderer;
