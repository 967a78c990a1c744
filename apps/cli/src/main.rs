mod commands;
mod core;
pub mod ui;

use crate::core::config::{validate_log_level, ShipyardConfig};
use crate::core::error::CliError;
use clap::{Parser, Subcommand};
use commands::{BuildCommand, ConsoleCommand, RebuildCommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "shipyard", version)]
#[command(about = "Build game-server plugin projects into images and deploy them as one stack", long_about = None)]
struct Cli {
    /// Path to shipyard.toml
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build projects, update the descriptor and deploy
    Build(BuildCommand),
    /// Redeploy the registered projects without building
    Rebuild(RebuildCommand),
    /// Run server console commands in a deployed service
    Console(ConsoleCommand),
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        e.render();
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = ShipyardConfig::load(cli.config.as_deref())?;

    let level = cli.log_level.unwrap_or_else(|| config.logging.level.clone());
    validate_log_level(&level).map_err(CliError::Config)?;
    crate::core::logging::init(&level, cli.json_logs || config.logging.json)?;

    match cli.command {
        Commands::Build(cmd) => cmd.execute(&config).await,
        Commands::Rebuild(cmd) => cmd.execute(&config).await,
        Commands::Console(cmd) => cmd.execute().await,
    }
}
