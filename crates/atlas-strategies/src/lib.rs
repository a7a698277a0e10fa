//! Strategy state machine and strategy implementations.
//!
//! This crate provides:
//! - The per-symbol position state machine
//! - SuperTrend + moving average stack (reference policy)
//! - Moving Average Crossover
//! - An explicit registry mapping names to variants

mod ma_crossover;
mod machine;
mod registry;
mod supertrend_ma;

pub use ma_crossover::{MACrossoverConfig, MACrossoverStrategy};
pub use machine::StrategyStateMachine;
pub use registry::{StrategyInfo, StrategyRegistry};
pub use supertrend_ma::{SupertrendMaConfig, SupertrendMaStrategy};

/// Moving average labels shared by strategies and indicator setup.
pub mod labels {
    pub const FAST: &str = "fast";
    pub const SIGNAL: &str = "signal";
    pub const MEDIUM: &str = "medium";
    pub const SLOW: &str = "slow";
}
