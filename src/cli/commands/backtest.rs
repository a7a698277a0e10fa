//! Backtest command implementation.

use anyhow::{Context, Result};
use atlas_backtest::{BacktestEngine, RunStatus};
use atlas_config::AppConfig;
use atlas_data::{parse_timestamp, CsvDataProvider};
use tracing::info;

use crate::cli::{BacktestArgs, OutputFormat};

pub async fn run(args: BacktestArgs, mut config: AppConfig) -> Result<()> {
    if let Some(symbol) = args.symbol {
        config.strategy.symbol = symbol;
    }
    if let Some(strategy) = args.strategy {
        config.strategy.strategy = strategy;
    }

    let data = super::data_path(args.data, &config)?;
    let provider = CsvDataProvider::new(&data)?;
    let engine = BacktestEngine::new(config.strategy.clone()).context("Invalid strategy settings")?;

    info!(
        symbol = %config.strategy.symbol,
        strategy = %config.strategy.strategy,
        data = %data.display(),
        "Starting backtest"
    );

    let report = match (args.start, args.end) {
        (Some(start), Some(end)) => {
            let start = parse_timestamp(&start)?;
            let end = parse_timestamp(&end)?;
            engine.run_from_provider(&provider, start, end).await?
        }
        _ => {
            let bars = provider.load_all(&config.strategy.symbol, config.strategy.base_timeframe)?;
            engine.run(&bars)?
        }
    };

    match args.output {
        OutputFormat::Json => println!("{}", report.to_json()?),
        OutputFormat::Text => println!("{}", report.summary()),
    }

    if let Some(dir) = args.save.or(config.backtest.output_dir) {
        for path in report.save(&dir)? {
            info!(path = %path.display(), "Saved");
        }
    }

    if let RunStatus::Failed { error } = &report.status {
        anyhow::bail!("Backtest failed: {}", error);
    }
    Ok(())
}
