//! TeeKit Settings Crate
//!
//! Handles application configuration: undo history depth, export pipeline
//! limits, export defaults, event bus tuning and logging preferences.

pub mod config;

pub use config::{
    Config, EventSettings, ExportDefaults, ExportPipelineSettings, HistorySettings,
    LoggingSettings,
};
