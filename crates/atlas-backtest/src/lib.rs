//! Backtest and live-mode runners.
//!
//! Both modes push bars through the same [`SymbolPipeline`]: resampling,
//! indicators, the strategy state machine and simulated order handling.
//! [`BacktestEngine`] replays a slice of bars, [`LiveRunner`] consumes a
//! channel and mirrors orders to a broker.

mod engine;
mod ledger;
mod live;
mod pipeline;
mod report;

pub use engine::BacktestEngine;
pub use ledger::{EquityPoint, LedgerSnapshot, RunLedger};
pub use live::{run_many, LiveRunner};
pub use pipeline::{BarOutcome, SkipReason, SymbolPipeline};
pub use report::{RunReport, RunStatus};
