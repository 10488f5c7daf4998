//! TeeKit command line host.

use anyhow::{Context, Result};
use clap::Parser;

use teekit::{init_logging, Config};

mod cli;
mod commands;

use crate::cli::{Cli, Command};

fn load_config(cli: &Cli) -> Result<Config> {
    let config = match &cli.config {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::load_or_default()?,
    };
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let mut logging = config.logging.clone();
    logging.json |= cli.log_json;
    init_logging(&logging)?;
    tracing::debug!("teekit {} (built {})", teekit::VERSION, teekit::BUILD_DATE);

    match &cli.command {
        Command::New(args) => commands::run_new(config, args),
        Command::Inspect(args) => commands::run_inspect(config, args),
        Command::AddText(args) => commands::run_add_text(config, args),
        Command::Ingest(args) => commands::run_ingest(config, args),
        Command::Export(args) => commands::run_export(config, args).await,
    }
}
