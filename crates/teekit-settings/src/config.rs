//! Configuration and settings management for TeeKit
//!
//! Provides configuration file handling, defaults and validation.
//! Supports JSON and TOML file formats stored in platform-specific directories.
//!
//! Configuration is organized into logical sections:
//! - History settings (undo depth)
//! - Export pipeline settings (concurrency, timeouts, pixel budget)
//! - Export defaults (format, DPI, background, file prefix)
//! - Event bus settings (channel capacity, history)
//! - Logging preferences

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use teekit_core::units::{MAX_DPI, MIN_DPI};
use teekit_core::{Error, Result};

/// Application directory name under the platform config dir
const APP_DIR: &str = "teekit";

/// Undo history settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistorySettings {
    /// Maximum number of undo steps kept; `None` keeps everything
    pub max_depth: Option<usize>,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            max_depth: Some(500),
        }
    }
}

/// Export pipeline settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportPipelineSettings {
    /// Number of export jobs processed concurrently
    pub max_concurrent_jobs: usize,
    /// Wall-clock budget for a single job in milliseconds
    pub job_timeout_ms: u64,
    /// Largest output canvas, in pixels (width * height)
    pub max_output_pixels: u64,
}

impl Default for ExportPipelineSettings {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 3,
            job_timeout_ms: 120_000,
            max_output_pixels: 80_000_000,
        }
    }
}

/// Defaults applied to new export requests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportDefaults {
    /// Export format ("png", "jpeg", "svg", "pdf")
    pub format: String,
    /// Output resolution
    pub dpi: u32,
    /// Background ("transparent", "white", "black" or a hex color)
    pub background: String,
    /// Sizing preset ("original", "small", "medium", "large")
    pub sizing: String,
    /// Add 0.125" bleed around each side
    pub include_bleed: bool,
    /// Prefer smaller files over encoding speed/quality
    pub compress: bool,
    /// Prefix for generated file names
    pub file_prefix: String,
}

impl Default for ExportDefaults {
    fn default() -> Self {
        Self {
            format: "png".to_string(),
            dpi: 300,
            background: "transparent".to_string(),
            sizing: "original".to_string(),
            include_bleed: false,
            compress: false,
            file_prefix: "tshirt-design".to_string(),
        }
    }
}

/// Event bus settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventSettings {
    /// Broadcast channel capacity
    pub channel_capacity: usize,
    /// Keep a rolling history of published events
    pub enable_history: bool,
    /// Maximum number of events kept in history
    pub max_history_size: usize,
}

impl Default for EventSettings {
    fn default() -> Self {
        Self {
            channel_capacity: 256,
            enable_history: false,
            max_history_size: 1000,
        }
    }
}

/// Logging preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default level directive ("error", "warn", "info", "debug", "trace")
    pub level: String,
    /// Emit JSON lines instead of human readable output
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Complete application configuration
///
/// Aggregates all settings sections and provides file I/O operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Undo history
    pub history: HistorySettings,
    /// Export pipeline
    pub export: ExportPipelineSettings,
    /// Defaults for export requests
    pub export_defaults: ExportDefaults,
    /// Event bus
    pub events: EventSettings,
    /// Logging
    pub logging: LoggingSettings,
    /// Recently opened design files
    pub recent_files: Vec<PathBuf>,
}

impl Config {
    /// Maximum number of entries kept in `recent_files`
    pub const RECENT_FILES_LIMIT: usize = 10;

    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Default location of the config file (`<config dir>/teekit/config.toml`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
    }

    /// Load the config from the default location, falling back to defaults
    /// when the file does not exist
    pub fn load_or_default() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::other(format!("Failed to read config file: {}", e)))?;

        let config: Self = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content)
                .map_err(|e| Error::other(format!("Invalid JSON config: {}", e)))?
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            toml::from_str(&content)
                .map_err(|e| Error::other(format!("Invalid TOML config: {}", e)))?
        } else {
            return Err(Error::other(
                "Config file must be .json or .toml".to_string(),
            ));
        };

        config.validate()?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        self.validate()?;

        let content = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::to_string_pretty(self)
                .map_err(|e| Error::other(format!("Failed to serialize config: {}", e)))?
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            toml::to_string_pretty(self)
                .map_err(|e| Error::other(format!("Failed to serialize config: {}", e)))?
        } else {
            return Err(Error::other(
                "Config file must be .json or .toml".to_string(),
            ));
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::other(format!("Failed to create config dir: {}", e)))?;
        }
        std::fs::write(path, content)
            .map_err(|e| Error::other(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.history.max_depth == Some(0) {
            return Err(Error::other(
                "History depth must be > 0 (omit it for unbounded history)".to_string(),
            ));
        }

        if self.export.max_concurrent_jobs == 0 {
            return Err(Error::other("Export concurrency must be > 0".to_string()));
        }

        if self.export.job_timeout_ms == 0 {
            return Err(Error::other("Export job timeout must be > 0".to_string()));
        }

        if self.export.max_output_pixels == 0 {
            return Err(Error::other("Export pixel limit must be > 0".to_string()));
        }

        if !(MIN_DPI..=MAX_DPI).contains(&self.export_defaults.dpi) {
            return Err(Error::other(format!(
                "Default DPI must be within {}..={}",
                MIN_DPI, MAX_DPI
            )));
        }

        if self.export_defaults.file_prefix.trim().is_empty() {
            return Err(Error::other("File prefix must not be empty".to_string()));
        }

        if self.events.channel_capacity == 0 {
            return Err(Error::other("Event channel capacity must be > 0".to_string()));
        }

        Ok(())
    }

    /// Add file to recent files list
    pub fn add_recent_file(&mut self, path: PathBuf) {
        // Remove if already in list
        self.recent_files.retain(|f| f != &path);

        // Add to front
        self.recent_files.insert(0, path);

        self.recent_files.truncate(Self::RECENT_FILES_LIMIT);
    }
}
