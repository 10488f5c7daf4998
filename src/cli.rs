//! Command line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "teekit",
    version,
    about = "TeeKit - garment print design documents and exports",
    long_about = "Create, edit and export multi-surface garment designs.\n\n\
                  Design files are versioned JSON; exports render each print\n\
                  area to PNG, JPEG or SVG."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Config file (.json or .toml); defaults to the platform config dir
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Emit JSON log lines
    #[arg(long = "log-json", global = true)]
    pub log_json: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create an empty design file
    New(NewArgs),

    /// Summarize a design file
    Inspect(InspectArgs),

    /// Add a text element to a design file
    AddText(AddTextArgs),

    /// Add an image (PNG, JPEG or SVG) to a design file
    Ingest(IngestArgs),

    /// Render print areas of a design file
    Export(ExportArgs),
}

#[derive(Parser)]
pub struct NewArgs {
    /// Output design file
    #[arg(value_name = "FILE")]
    pub output: PathBuf,

    /// Document name
    #[arg(long = "name", default_value = "Untitled Design")]
    pub name: String,
}

#[derive(Parser)]
pub struct InspectArgs {
    #[arg(value_name = "FILE")]
    pub design: PathBuf,

    /// Print the summary as JSON
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Parser)]
pub struct AddTextArgs {
    #[arg(value_name = "FILE")]
    pub design: PathBuf,

    #[arg(value_name = "TEXT")]
    pub content: String,

    /// Target area (front, back, left-sleeve, right-sleeve)
    #[arg(long = "area", default_value = "front")]
    pub area: String,

    #[arg(long = "x", default_value_t = 0.0, allow_hyphen_values = true)]
    pub x: f64,

    #[arg(long = "y", default_value_t = 0.0, allow_hyphen_values = true)]
    pub y: f64,

    /// Font size in points
    #[arg(long = "font-size")]
    pub font_size: Option<f64>,

    #[arg(long = "font-family")]
    pub font_family: Option<String>,

    /// Fill colour as #rrggbb or #rrggbbaa
    #[arg(long = "fill")]
    pub fill: Option<String>,

    /// Rotation in degrees
    #[arg(long = "rotation", allow_hyphen_values = true)]
    pub rotation: Option<f64>,
}

#[derive(Parser)]
pub struct IngestArgs {
    #[arg(value_name = "FILE")]
    pub design: PathBuf,

    #[arg(value_name = "IMAGE")]
    pub image: PathBuf,

    #[arg(long = "area", default_value = "front")]
    pub area: String,

    #[arg(long = "x", default_value_t = 0.0, allow_hyphen_values = true)]
    pub x: f64,

    #[arg(long = "y", default_value_t = 0.0, allow_hyphen_values = true)]
    pub y: f64,

    /// Uniform scale factor
    #[arg(long = "scale", default_value_t = 1.0)]
    pub scale: f64,

    #[arg(long = "rotation", allow_hyphen_values = true)]
    pub rotation: Option<f64>,
}

#[derive(Parser)]
pub struct ExportArgs {
    #[arg(value_name = "FILE")]
    pub design: PathBuf,

    /// Areas rendered side by side onto one sheet; repeat for several
    #[arg(long = "area", value_name = "AREA", conflicts_with = "all")]
    pub areas: Vec<String>,

    /// One file per area
    #[arg(long = "all")]
    pub all: bool,

    /// png, jpeg, svg or pdf (defaults to the configured format)
    #[arg(long = "format")]
    pub format: Option<String>,

    #[arg(long = "dpi")]
    pub dpi: Option<u32>,

    /// transparent, white, black or a #rrggbb colour
    #[arg(long = "background")]
    pub background: Option<String>,

    /// original, small, medium, large or WxH in inches
    #[arg(long = "sizing")]
    pub sizing: Option<String>,

    /// Add 0.125" bleed on every side
    #[arg(long = "bleed")]
    pub bleed: bool,

    /// Smaller files at some cost in quality
    #[arg(long = "compress")]
    pub compress: bool,

    /// File name prefix (defaults to the configured prefix)
    #[arg(long = "prefix")]
    pub prefix: Option<String>,

    /// Directory the artifacts are written to
    #[arg(long = "output-dir", value_name = "DIR", default_value = ".")]
    pub output_dir: PathBuf,
}
