//! Moving Average Crossover Strategy.
//!
//! Enters long when the fast MA crosses above the slow MA and short when it
//! crosses below, optionally gated by the SuperTrend direction. An open
//! position is closed on the opposite cross.

use atlas_core::{
    error::StrategyError,
    traits::{DecisionContext, Strategy, StrategyConfig},
    types::{IndicatorState, IntentAction, PositionSide, TrendDirection},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::labels::{FAST, SLOW};

/// Configuration for the MA Crossover strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MACrossoverConfig {
    /// Only enter in the direction of the trend timeframe
    pub follow_trend: bool,
    /// Take short entries
    pub allow_short: bool,
    /// Minimum |fast - slow| / slow for an entry cross
    pub signal_threshold: Decimal,
}

impl Default for MACrossoverConfig {
    fn default() -> Self {
        Self {
            follow_trend: true,
            allow_short: true,
            signal_threshold: Decimal::ZERO,
        }
    }
}

impl StrategyConfig for MACrossoverConfig {
    fn validate(&self) -> Result<(), StrategyError> {
        if self.signal_threshold < Decimal::ZERO || self.signal_threshold >= Decimal::ONE {
            return Err(StrategyError::InvalidConfig(
                "signal_threshold must be in [0, 1)".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cross {
    Above,
    Below,
}

/// Moving Average Crossover Strategy.
pub struct MACrossoverStrategy {
    config: MACrossoverConfig,
    prev_fast: Option<Decimal>,
    prev_slow: Option<Decimal>,
}

impl MACrossoverStrategy {
    /// Create a new MA Crossover strategy.
    pub fn new(config: MACrossoverConfig) -> Self {
        Self {
            config,
            prev_fast: None,
            prev_slow: None,
        }
    }

    fn cross(&self, fast: Decimal, slow: Decimal) -> Option<Cross> {
        let (prev_f, prev_s) = (self.prev_fast?, self.prev_slow?);
        if prev_f <= prev_s && fast > slow {
            Some(Cross::Above)
        } else if prev_f >= prev_s && fast < slow {
            Some(Cross::Below)
        } else {
            None
        }
    }

    fn strong_enough(&self, fast: Decimal, slow: Decimal) -> bool {
        if slow.is_zero() {
            return self.config.signal_threshold.is_zero();
        }
        ((fast - slow) / slow).abs() >= self.config.signal_threshold
    }

    fn trend_allows(&self, trend: TrendDirection, wanted: TrendDirection) -> bool {
        !self.config.follow_trend || trend == wanted
    }
}

impl Strategy for MACrossoverStrategy {
    fn name(&self) -> &str {
        "ma_crossover"
    }

    fn description(&self) -> &str {
        "Trades fast/slow moving average crossovers in the direction of the trend"
    }

    fn required_averages(&self) -> &[&'static str] {
        &[FAST, SLOW]
    }

    fn decide(&mut self, ctx: &DecisionContext<'_>) -> Option<IntentAction> {
        let fast = ctx.indicators.average(FAST)?;
        let slow = ctx.indicators.average(SLOW)?;
        let cross = self.cross(fast, slow)?;

        match (ctx.position, cross) {
            (PositionSide::Flat, Cross::Above)
                if self.trend_allows(ctx.trend, TrendDirection::Up)
                    && self.strong_enough(fast, slow) =>
            {
                Some(IntentAction::EnterLong)
            }
            (PositionSide::Flat, Cross::Below)
                if self.config.allow_short
                    && self.trend_allows(ctx.trend, TrendDirection::Down)
                    && self.strong_enough(fast, slow) =>
            {
                Some(IntentAction::EnterShort)
            }
            (PositionSide::Long, Cross::Below) | (PositionSide::Short, Cross::Above) => {
                Some(IntentAction::Exit)
            }
            _ => None,
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
