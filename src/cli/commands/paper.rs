//! Paper trading command implementation.

use anyhow::{Context, Result};
use atlas_backtest::{run_many, LiveRunner};
use atlas_broker::PaperBroker;
use atlas_config::AppConfig;
use atlas_core::traits::DataProvider;
use atlas_data::CsvDataProvider;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::cli::PaperArgs;

pub async fn run(args: PaperArgs, mut config: AppConfig) -> Result<()> {
    if let Some(strategy) = args.strategy {
        config.strategy.strategy = strategy;
    }
    let symbols = if args.symbols.is_empty() {
        vec![config.strategy.symbol.clone()]
    } else {
        args.symbols
    };

    let data = super::data_path(args.data, &config)?;
    let delay = args.replay_delay_ms.unwrap_or(config.backtest.replay_delay_ms);
    let mut provider = CsvDataProvider::new(&data)?;
    if delay > 0 {
        provider = provider.with_replay_delay(Duration::from_millis(delay));
    }

    let broker = Arc::new(PaperBroker::new());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown requested");
            let _ = shutdown_tx.send(true);
        }
    });

    let mut runners = Vec::with_capacity(symbols.len());
    for symbol in &symbols {
        let mut settings = config.strategy.clone();
        settings.symbol = symbol.clone();
        let runner = LiveRunner::new(settings, broker.clone())
            .with_context(|| format!("Invalid settings for {}", symbol))?;
        let bars = provider
            .stream_bars(symbol, config.strategy.base_timeframe)
            .await
            .with_context(|| format!("No data for {}", symbol))?;
        runners.push((runner, bars));
    }

    info!(
        symbols = ?symbols,
        broker = "paper",
        delay_ms = delay,
        "Starting paper run"
    );
    let reports = run_many(runners, shutdown_rx).await;

    for report in &reports {
        println!("{}", report.summary());
        if let Some(dir) = &args.save {
            for path in report.save(&dir.join(&report.symbol))? {
                info!(path = %path.display(), "Saved");
            }
        }
    }

    let open = broker.open_orders().await;
    if !open.is_empty() {
        warn!(count = open.len(), "Orders left open at the paper broker");
    }
    if reports.len() < symbols.len() {
        anyhow::bail!("{} of {} runners failed", symbols.len() - reports.len(), symbols.len());
    }
    Ok(())
}
