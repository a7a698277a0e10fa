//! Streaming runner for paper and live mode.

use atlas_config::StrategySettings;
use atlas_core::error::TradingError;
use atlas_core::traits::Broker;
use atlas_core::types::{Bar, OrderId, OrderStatus};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::pipeline::SymbolPipeline;
use crate::report::{RunReport, RunStatus};

/// Drives one symbol's pipeline from a bar stream and mirrors its orders
/// to a broker.
///
/// Fills are still simulated from bars; the broker sees every order the
/// pipeline places and every cancellation. A broker rejection is fed back
/// so the state machine resynchronizes.
pub struct LiveRunner {
    settings: StrategySettings,
    broker: Arc<dyn Broker>,
}

impl LiveRunner {
    pub fn new(settings: StrategySettings, broker: Arc<dyn Broker>) -> Result<Self, TradingError> {
        settings.validate()?;
        Ok(Self { settings, broker })
    }

    pub fn symbol(&self) -> &str {
        &self.settings.symbol
    }

    /// Consume bars until the stream ends or `shutdown` flips to `true`.
    ///
    /// On shutdown every working order is cancelled locally and at the
    /// broker and the report is marked [`RunStatus::Stopped`]. When the
    /// stream ends the run is finished like a backtest.
    pub async fn run(
        &self,
        mut bars: mpsc::Receiver<Bar>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<RunReport, TradingError> {
        let mut pipeline = SymbolPipeline::from_settings(&self.settings)?;
        let mut forwarder = OrderForwarder::default();

        info!(
            symbol = %self.settings.symbol,
            strategy = %self.settings.strategy,
            broker = self.broker.name(),
            "Live runner started"
        );

        let status = loop {
            tokio::select! {
                biased;

                changed = shutdown.changed() => {
                    let stop = changed.is_err() || *shutdown.borrow();
                    if stop {
                        let cancelled = pipeline.stop();
                        debug!(symbol = %self.settings.symbol, cancelled = cancelled.len(), "Working orders cancelled");
                        forwarder.sync(&mut pipeline, self.broker.as_ref()).await;
                        break RunStatus::Stopped;
                    }
                }

                bar = bars.recv() => {
                    let Some(bar) = bar else {
                        pipeline.finish();
                        forwarder.sync(&mut pipeline, self.broker.as_ref()).await;
                        break RunStatus::Completed;
                    };
                    if let Err(e) = pipeline.process(&bar) {
                        error!(symbol = %self.settings.symbol, error = %e, "Live run aborted");
                        pipeline.stop();
                        forwarder.sync(&mut pipeline, self.broker.as_ref()).await;
                        break RunStatus::Failed { error: e.to_string() };
                    }
                    forwarder.sync(&mut pipeline, self.broker.as_ref()).await;
                }
            }
        };

        let report = RunReport::from_pipeline(&pipeline, status);
        info!(
            symbol = %report.symbol,
            status = ?report.status,
            trades = report.snapshot.trade_count,
            "Live runner finished"
        );
        Ok(report)
    }
}

/// Tracks which local orders the broker has seen.
#[derive(Debug, Default)]
struct OrderForwarder {
    watermark: Option<OrderId>,
    forwarded: Vec<OrderId>,
}

impl OrderForwarder {
    async fn sync(&mut self, pipeline: &mut SymbolPipeline, broker: &dyn Broker) {
        let fresh: Vec<_> = pipeline
            .orders()
            .orders_after(self.watermark)
            .to_vec();
        if let Some(last) = fresh.last() {
            self.watermark = Some(last.id);
        }

        for order in fresh.iter().filter(|o| o.is_active()) {
            match broker.place_order(order).await {
                Ok(ack) => {
                    debug!(order = %order, broker_order_id = %ack.broker_order_id, "Order forwarded");
                    self.forwarded.push(order.id);
                }
                Err(e) => {
                    warn!(order = %order, error = %e, "Broker rejected order");
                    pipeline.reject_order(order, &e.to_string());
                }
            }
        }

        let mut still_working = Vec::with_capacity(self.forwarded.len());
        for id in self.forwarded.drain(..) {
            let Some(order) = pipeline.orders().order(id) else {
                continue;
            };
            match order.status {
                OrderStatus::Pending => still_working.push(id),
                OrderStatus::Cancelled | OrderStatus::Rejected => {
                    if let Err(e) = broker.cancel_order(&order.symbol, id).await {
                        warn!(order = %order, error = %e, "Broker cancel failed");
                    }
                }
                OrderStatus::Filled => {}
            }
        }
        self.forwarded = still_working;
    }
}

/// Run one [`LiveRunner`] per symbol concurrently and collect their
/// reports. A runner that fails to start or panics is logged and left out.
pub async fn run_many(
    runners: Vec<(LiveRunner, mpsc::Receiver<Bar>)>,
    shutdown: watch::Receiver<bool>,
) -> Vec<RunReport> {
    let mut set = JoinSet::new();
    for (runner, bars) in runners {
        let shutdown = shutdown.clone();
        set.spawn(async move {
            let symbol = runner.symbol().to_string();
            (symbol, runner.run(bars, shutdown).await)
        });
    }

    let mut reports = Vec::new();
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((_, Ok(report))) => reports.push(report),
            Ok((symbol, Err(e))) => error!(symbol = %symbol, error = %e, "Runner failed"),
            Err(e) => error!(error = %e, "Runner task panicked"),
        }
    }
    reports.sort_by(|a, b| a.symbol.cmp(&b.symbol));
    reports
}
