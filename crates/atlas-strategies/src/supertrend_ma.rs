//! SuperTrend-gated moving average stack strategy.
//!
//! Enters long when the higher-timeframe trend is up and the four averages
//! are stacked `fast > signal > medium > slow`. Enters short when the trend
//! is down and `fast` has just crossed below `slow`. Longs exit on a close
//! below `signal`, shorts on a close above it.

use atlas_core::{
    error::StrategyError,
    traits::{DecisionContext, Strategy, StrategyConfig},
    types::{IndicatorState, IntentAction, PositionSide, TrendDirection},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::labels::{FAST, MEDIUM, SIGNAL, SLOW};

/// Configuration for the SuperTrend + MA strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SupertrendMaConfig {
    /// Take long entries
    pub allow_long: bool,
    /// Take short entries
    pub allow_short: bool,
}

impl Default for SupertrendMaConfig {
    fn default() -> Self {
        Self {
            allow_long: true,
            allow_short: true,
        }
    }
}

impl StrategyConfig for SupertrendMaConfig {
    fn validate(&self) -> Result<(), StrategyError> {
        if !self.allow_long && !self.allow_short {
            return Err(StrategyError::InvalidConfig(
                "At least one of allow_long/allow_short must be enabled".into(),
            ));
        }
        Ok(())
    }
}

/// Reference SuperTrend + moving average policy.
pub struct SupertrendMaStrategy {
    config: SupertrendMaConfig,
    prev_fast: Option<Decimal>,
    prev_slow: Option<Decimal>,
}

impl SupertrendMaStrategy {
    /// Create a new SuperTrend + MA strategy.
    pub fn new(config: SupertrendMaConfig) -> Self {
        Self {
            config,
            prev_fast: None,
            prev_slow: None,
        }
    }

    fn crossed_below(&self, fast: Decimal, slow: Decimal) -> bool {
        matches!(
            (self.prev_fast, self.prev_slow),
            (Some(pf), Some(ps)) if pf > ps && fast < slow
        )
    }
}

impl Strategy for SupertrendMaStrategy {
    fn name(&self) -> &str {
        "supertrend_ma"
    }

    fn description(&self) -> &str {
        "SuperTrend trend filter with a fast/signal/medium/slow moving average stack"
    }

    fn required_averages(&self) -> &[&'static str] {
        &[FAST, SIGNAL, MEDIUM, SLOW]
    }

    fn decide(&mut self, ctx: &DecisionContext<'_>) -> Option<IntentAction> {
        let ind = ctx.indicators;
        let (fast, signal, medium, slow) = (
            ind.average(FAST)?,
            ind.average(SIGNAL)?,
            ind.average(MEDIUM)?,
            ind.average(SLOW)?,
        );

        match ctx.position {
            PositionSide::Flat => {
                if self.config.allow_long
                    && ctx.trend == TrendDirection::Up
                    && fast > signal
                    && signal > medium
                    && medium > slow
                {
                    Some(IntentAction::EnterLong)
                } else if self.config.allow_short
                    && ctx.trend == TrendDirection::Down
                    && self.crossed_below(fast, slow)
                {
                    Some(IntentAction::EnterShort)
                } else {
                    None
                }
            }
            PositionSide::Long => (ctx.close() < signal).then_some(IntentAction::Exit),
            PositionSide::Short => (ctx.close() > signal).then_some(IntentAction::Exit),
        }
    }

    fn observe(&mut self, indicators: &IndicatorState) {
        self.prev_fast = indicators.average(FAST);
        self.prev_slow = indicators.average(SLOW);
    }

    fn reset(&mut self) {
        self.prev_fast = None;
        self.prev_slow = None;
    }
}
