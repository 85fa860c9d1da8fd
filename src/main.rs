use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use folio::core::log::init_logging;
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for folio::AppCommand {
    fn from(cmd: Commands) -> folio::AppCommand {
        match cmd {
            Commands::Sync => folio::AppCommand::Sync,
            Commands::Import { file } => folio::AppCommand::Import { file },
            Commands::Prices { name } => folio::AppCommand::Prices { name },
            Commands::Breakdown { pattern, rollup } => {
                folio::AppCommand::Breakdown { pattern, rollup }
            }
            Commands::Distribution => folio::AppCommand::Distribution,
            Commands::Overview => folio::AppCommand::Overview,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Refresh stored price history for all configured commodities
    Sync,
    /// Replace stored postings with a CSV ledger export
    Import {
        /// Path to the CSV file
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Show stored price history for one commodity
    Prices {
        /// Commodity name as configured
        name: String,
    },
    /// Per-account investment, withdrawal, market value and returns
    Breakdown {
        /// Account pattern (SQL LIKE dialect)
        #[arg(short, long, default_value = "Assets:%")]
        pattern: String,

        /// Also report rolled-up ancestor groups
        #[arg(short, long)]
        rollup: bool,
    },
    /// Market-value distribution across first-level asset groups
    Distribution,
    /// Full portfolio overview
    Overview,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => folio::cli::setup::setup(),
        Some(cmd) => folio::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
