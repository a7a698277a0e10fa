//! Strategy engine CLI application.

mod cli;

use anyhow::Result;
use atlas_config::{load_config, LoggingConfig};
use atlas_monitor::setup_logging;
use clap::Parser;
use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // A broken config still gets default logging so the error is reported
    let loaded = load_config(&cli.config);
    let logging = loaded
        .as_ref()
        .map(|c| c.logging.clone())
        .unwrap_or_else(|_| LoggingConfig::default());
    let level = cli
        .log_level
        .map(|l| l.as_str().to_string())
        .unwrap_or_else(|| logging.level.clone());
    let _guard = setup_logging(
        &level,
        cli.json_logs || logging.is_json(),
        logging.file.as_deref(),
    );

    match cli.command {
        Commands::Backtest(args) => cli::commands::backtest::run(args, loaded?).await,
        Commands::Paper(args) => cli::commands::paper::run(args, loaded?).await,
        Commands::Strategies => cli::commands::strategies::run(),
        Commands::ValidateConfig => cli::commands::validate::run(&cli.config, loaded),
    }
}
