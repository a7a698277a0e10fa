//! Per-symbol processing pipeline.

use atlas_broker::OrderManager;
use atlas_config::StrategySettings;
use atlas_core::error::{DataError, IndicatorError, OutOfOrderBarError, TradingError};
use atlas_core::types::{Bar, ExitReason, Intent, Order, Timeframe, Trade};
use atlas_data::{BarStore, Resampler, SessionWindow};
use atlas_indicators::IndicatorEngine;
use atlas_strategies::{StrategyRegistry, StrategyStateMachine};
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::ledger::RunLedger;

/// Why a bar was not processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Malformed,
    OutsideSession,
}

/// What processing one base bar did.
#[derive(Debug, Clone, PartialEq)]
pub enum BarOutcome {
    Skipped(SkipReason),
    Processed {
        /// Round trip closed by fills on this bar
        trade: Option<Trade>,
        /// Intents emitted by the state machine, accepted or not
        intents: Vec<Intent>,
    },
}

/// Everything one symbol needs, owned in one place.
///
/// A bar is processed to completion before the next is accepted: fills
/// for orders placed on earlier bars, then resampling, indicators on the
/// newly closed bars (coarsest first), decisions, new orders and finally
/// an equity point. Orders placed on a bar can therefore only fill from
/// the next bar on.
pub struct SymbolPipeline {
    symbol: String,
    base: Timeframe,
    ma: Timeframe,
    trend: Timeframe,
    session: Option<SessionWindow>,
    flatten_at_end: bool,
    resampler: Resampler,
    store: BarStore,
    indicators: IndicatorEngine,
    machine: StrategyStateMachine,
    orders: OrderManager,
    ledger: RunLedger,
    last_open: Option<DateTime<Utc>>,
    last_bar: Option<Bar>,
    processed: usize,
    skipped: usize,
    rejected: usize,
}

impl SymbolPipeline {
    /// Build a pipeline from validated settings.
    pub fn from_settings(settings: &StrategySettings) -> Result<Self, TradingError> {
        settings.validate()?;

        let symbol = settings.symbol.clone();
        let base = settings.base_timeframe;

        let targets = [settings.ma_timeframe, settings.trend_timeframe]
            .into_iter()
            .filter(|tf| *tf != base);
        let resampler = Resampler::new(symbol.clone(), base, targets)?;

        let mut indicators = IndicatorEngine::new(symbol.clone()).with_supertrend(
            settings.trend_timeframe,
            settings.supertrend_length,
            settings.supertrend_multiplier,
        )?;
        for (label, period) in settings.ma_periods.labelled() {
            indicators =
                indicators.with_average(settings.ma_timeframe, label, settings.ma_type, period)?;
        }

        let policy = StrategyRegistry::new()
            .create(&settings.strategy, settings.strategy_params.clone())?;
        let machine = StrategyStateMachine::new(
            symbol.clone(),
            policy,
            settings.ma_timeframe,
            settings.trend_timeframe,
        );

        Ok(Self {
            base,
            ma: settings.ma_timeframe,
            trend: settings.trend_timeframe,
            session: settings.session_window()?,
            flatten_at_end: settings.flatten_at_end,
            resampler,
            store: BarStore::new(),
            indicators,
            machine,
            orders: OrderManager::new(symbol.clone(), settings.order_manager_config()),
            ledger: RunLedger::new(settings.starting_equity),
            symbol,
            last_open: None,
            last_bar: None,
            processed: 0,
            skipped: 0,
            rejected: 0,
        })
    }

    /// Process one closed base bar.
    ///
    /// Malformed bars and bars outside the session are skipped. An error
    /// means the run cannot continue; the ledger keeps everything recorded
    /// up to the previous bar.
    pub fn process(&mut self, bar: &Bar) -> Result<BarOutcome, DataError> {
        if bar.symbol != self.symbol {
            return Err(DataError::SymbolNotFound(format!(
                "pipeline for {} received {}",
                self.symbol, bar.symbol
            )));
        }
        if bar.timeframe != self.base {
            return Err(DataError::InvalidTimeframe(format!(
                "expected {} bar, got {}",
                self.base, bar.timeframe
            )));
        }
        if let Err(e) = bar.validate() {
            warn!(symbol = %self.symbol, at = %bar.open_time, error = %e, "Skipping malformed bar");
            self.skipped += 1;
            return Ok(BarOutcome::Skipped(SkipReason::Malformed));
        }
        if let Some(last) = self.last_open {
            if bar.open_time <= last {
                return Err(OutOfOrderBarError {
                    symbol: self.symbol.clone(),
                    timeframe: self.base,
                    last,
                    received: bar.open_time,
                }
                .into());
            }
        }
        self.last_open = Some(bar.open_time);

        if let Some(session) = &self.session {
            if !session.contains(bar.open_time) {
                debug!(symbol = %self.symbol, at = %bar.open_time, "Outside session");
                self.skipped += 1;
                return Ok(BarOutcome::Skipped(SkipReason::OutsideSession));
            }
        }

        let trade = self.orders.on_bar(bar);
        if let Some(trade) = &trade {
            self.ledger.record_trade(trade.clone());
        }

        let mut closed = self.resampler.ingest(bar)?;
        closed.push(bar.clone());
        self.store.extend(closed.iter().cloned())?;

        let mut intents = Vec::new();
        for closed_bar in &closed {
            let Some(state) = self.indicators.on_closed_bar(closed_bar)? else {
                continue;
            };
            self.machine.sync(self.orders.exposure());
            if let Some(intent) = self.machine.on_indicator_update(&state) {
                self.submit(&intent);
                intents.push(intent);
            }
        }

        self.ledger
            .record_equity(bar.close_time(), self.orders.equity());
        self.last_bar = Some(bar.clone());
        self.processed += 1;

        Ok(BarOutcome::Processed { trade, intents })
    }

    fn submit(&mut self, intent: &Intent) {
        if let Err(e) = self.orders.on_intent(intent) {
            self.rejected += 1;
            warn!(
                symbol = %self.symbol,
                action = %intent.action,
                error = %e,
                "Intent dropped"
            );
            self.machine.sync(self.orders.exposure());
        }
    }

    /// Close out a finished run: flattens the open position at the last
    /// bar's close when configured to.
    pub fn finish(&mut self) -> Option<Trade> {
        if !self.flatten_at_end {
            return None;
        }
        let bar = self.last_bar.clone()?;
        let trade = self.orders.flatten(&bar, ExitReason::EndOfRun)?;
        self.ledger.record_trade(trade.clone());
        self.ledger
            .record_equity(bar.close_time(), self.orders.equity());
        self.machine.sync(self.orders.exposure());
        Some(trade)
    }

    /// Cancel every working order, leaving any position open.
    pub fn stop(&mut self) -> Vec<Order> {
        let cancelled = self.orders.cancel_pending("run stopped");
        self.machine.sync(self.orders.exposure());
        cancelled
    }

    /// Record an external rejection of an order and resynchronize.
    pub fn reject_order(&mut self, order: &Order, reason: &str) {
        if let Err(e) = self.orders.reject_order(order.id, reason) {
            warn!(symbol = %self.symbol, error = %e, "Could not record rejection");
        }
        self.rejected += 1;
        self.machine.sync(self.orders.exposure());
    }

    /// Whether the trend and MA indicators are past their warm-up.
    pub fn ensure_warmed_up(&self) -> Result<(), IndicatorError> {
        self.indicators.ensure_ready(self.trend)?;
        self.indicators.ensure_ready(self.ma)
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn policy_name(&self) -> &str {
        self.machine.policy_name()
    }

    pub fn ledger(&self) -> &RunLedger {
        &self.ledger
    }

    pub fn orders(&self) -> &OrderManager {
        &self.orders
    }

    pub fn store(&self) -> &BarStore {
        &self.store
    }

    pub fn indicators(&self) -> &IndicatorEngine {
        &self.indicators
    }

    pub fn machine(&self) -> &StrategyStateMachine {
        &self.machine
    }

    /// Bars that went through the whole pipeline.
    pub fn bars_processed(&self) -> usize {
        self.processed
    }

    /// Malformed or out-of-session bars.
    pub fn bars_skipped(&self) -> usize {
        self.skipped
    }

    /// Intents or orders refused by the order manager or broker.
    pub fn rejections(&self) -> usize {
        self.rejected
    }
}
