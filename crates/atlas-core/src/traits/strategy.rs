//! Strategy trait definitions.

use crate::error::StrategyError;
use crate::types::{IndicatorState, IntentAction, PositionSide, TrendDirection};

/// Configuration trait for strategies.
pub trait StrategyConfig: Send + Sync + Clone + 'static {
    /// Validate the configuration.
    fn validate(&self) -> Result<(), StrategyError>;
}

/// Everything a policy may look at when deciding.
#[derive(Debug, Clone, Copy)]
pub struct DecisionContext<'a> {
    /// Current exposure of the symbol
    pub position: PositionSide,
    /// Last known trend from the trend timeframe
    pub trend: TrendDirection,
    /// Values from the MA-timeframe bar that just closed
    pub indicators: &'a IndicatorState,
}

impl DecisionContext<'_> {
    /// Close of the MA-timeframe bar being evaluated.
    pub fn close(&self) -> rust_decimal::Decimal {
        self.indicators.close
    }
}

/// Transition policy for the per-symbol state machine.
///
/// `decide` is only called once every required value is defined; `observe`
/// is called for every MA-timeframe bar afterwards so policies can keep the
/// previous values they need for crossover detection.
pub trait Strategy: Send + Sync {
    /// Get the unique name of this strategy.
    fn name(&self) -> &str;

    /// MA labels this policy reads.
    fn required_averages(&self) -> &[&'static str];

    /// Decide on a transition, if any.
    fn decide(&mut self, ctx: &DecisionContext<'_>) -> Option<IntentAction>;

    /// Record the bar's values after the decision.
    fn observe(&mut self, _indicators: &IndicatorState) {}

    /// Reset the strategy state.
    fn reset(&mut self);

    /// Get a description of the strategy.
    fn description(&self) -> &str {
        ""
    }
}
