//! # TeeKit
//!
//! A design document engine for multi-surface garment printing:
//! - Four fixed print areas (front, back, left and right sleeve)
//! - Text and image elements with position, rotation and scale
//! - Undo/redo history with reversible commands
//! - Background export to PNG, JPEG and SVG
//!
//! ## Architecture
//!
//! TeeKit is organized as a workspace with multiple crates:
//!
//! 1. **teekit-core** - Error taxonomy, event bus, print units
//! 2. **teekit-settings** - Configuration loading and validation
//! 3. **teekit-designer** - Document model, history, selection, export pipeline
//! 4. **teekit** - Command line host that integrates all crates

pub use teekit_core as core;
pub use teekit_designer as designer;
pub use teekit_settings as settings;

pub use teekit_core::{Error, Result};
pub use teekit_designer::{
    AreaId, Color, Document, EditorEvent, EditorSession, Element, ElementId, ElementInit,
    ElementPatch, ExportFormat, ExportJob, ExportSettings, JobStatus,
};
pub use teekit_settings::{Config, LoggingSettings};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging from configuration
///
/// Sets up structured logging with:
/// - RUST_LOG environment variable support, falling back to `settings.level`
/// - Pretty console output, or JSON lines when `settings.json` is set
/// - Output on stderr so command output on stdout stays clean
pub fn init_logging(settings: &LoggingSettings) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&settings.level)
            .map_err(|e| anyhow::anyhow!("Invalid log level '{}': {}", settings.level, e))?,
    };

    if settings.json {
        let fmt_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_level(true)
            .json();

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;
    } else {
        let fmt_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_level(true)
            .with_thread_names(true)
            .with_line_number(true)
            .pretty();

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;
    }

    Ok(())
}
