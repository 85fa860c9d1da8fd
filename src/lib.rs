pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use anyhow::Result;
use std::path::PathBuf;
use tracing::debug;

/// Application commands that operate on a loaded configuration.
#[derive(Debug)]
pub enum AppCommand {
    Sync,
    Import { file: PathBuf },
    Prices { name: String },
    Breakdown { pattern: String, rollup: bool },
    Distribution,
    Overview,
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    let config = match config_path {
        Some(path) => core::config::AppConfig::load_from_path(path)?,
        None => core::config::AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    match command {
        AppCommand::Sync => cli::sync::run(&config).await,
        AppCommand::Import { file } => cli::import::run(&config, &file),
        AppCommand::Prices { name } => cli::prices::run(&config, &name),
        AppCommand::Breakdown { pattern, rollup } => cli::breakdown::run(&config, &pattern, rollup),
        AppCommand::Distribution => cli::distribution::run(&config),
        AppCommand::Overview => cli::overview::run(&config).await,
    }
}
