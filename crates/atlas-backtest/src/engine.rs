//! Backtesting engine.

use atlas_config::StrategySettings;
use atlas_core::error::TradingError;
use atlas_core::traits::DataProvider;
use atlas_core::types::Bar;
use chrono::{DateTime, Utc};
use tracing::{error, info};

use crate::pipeline::SymbolPipeline;
use crate::report::{RunReport, RunStatus};

/// Replays historical bars for one symbol through the full pipeline.
pub struct BacktestEngine {
    settings: StrategySettings,
}

impl BacktestEngine {
    /// Create a new backtest engine. Settings are validated up front.
    pub fn new(settings: StrategySettings) -> Result<Self, TradingError> {
        settings.validate()?;
        Ok(Self { settings })
    }

    pub fn settings(&self) -> &StrategySettings {
        &self.settings
    }

    /// Run a backtest over bars in chronological order.
    ///
    /// Setup failures are returned as errors. A data error part way through
    /// ends the run with [`RunStatus::Failed`] and a report holding every
    /// trade and equity point recorded before the failing bar.
    pub fn run(&self, bars: &[Bar]) -> Result<RunReport, TradingError> {
        let mut pipeline = SymbolPipeline::from_settings(&self.settings)?;

        info!(
            symbol = %self.settings.symbol,
            strategy = %self.settings.strategy,
            bars = bars.len(),
            "Starting backtest"
        );

        for bar in bars {
            if let Err(e) = pipeline.process(bar) {
                error!(
                    symbol = %self.settings.symbol,
                    at = %bar.open_time,
                    error = %e,
                    "Backtest aborted"
                );
                return Ok(RunReport::from_pipeline(
                    &pipeline,
                    RunStatus::Failed {
                        error: e.to_string(),
                    },
                ));
            }
        }

        pipeline.finish();
        let report = RunReport::from_pipeline(&pipeline, RunStatus::Completed);

        info!(
            symbol = %report.symbol,
            trades = report.snapshot.trade_count,
            final_equity = %report.snapshot.final_equity,
            "Backtest complete"
        );
        Ok(report)
    }

    /// Load `[start, end)` from a provider and run over it.
    pub async fn run_from_provider(
        &self,
        provider: &dyn DataProvider,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<RunReport, TradingError> {
        let bars = provider
            .get_historical_bars(
                &self.settings.symbol,
                self.settings.base_timeframe,
                start,
                end,
            )
            .await?;
        self.run(&bars)
    }
}
