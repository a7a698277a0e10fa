//! Per-symbol position state machine.

use atlas_core::traits::{DecisionContext, Strategy};
use atlas_core::types::{
    IndicatorState, Intent, IntentAction, PositionSide, Timeframe, TrendDirection,
};
use tracing::{debug, info};

/// Turns indicator updates into entry/exit intents for one symbol.
///
/// Two timeframes feed a decision: the trend timeframe sets the last known
/// trend direction, held until its next bar closes, and each closed bar of
/// the MA timeframe triggers one evaluation of the policy.
pub struct StrategyStateMachine {
    symbol: String,
    ma_timeframe: Timeframe,
    trend_timeframe: Timeframe,
    state: PositionSide,
    trend: Option<TrendDirection>,
    policy: Box<dyn Strategy>,
    evaluations: usize,
    intents: usize,
}

impl StrategyStateMachine {
    /// Create a machine in the `Flat` state.
    pub fn new(
        symbol: impl Into<String>,
        policy: Box<dyn Strategy>,
        ma_timeframe: Timeframe,
        trend_timeframe: Timeframe,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            ma_timeframe,
            trend_timeframe,
            state: PositionSide::Flat,
            trend: None,
            policy,
            evaluations: 0,
            intents: 0,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Current state.
    pub fn state(&self) -> PositionSide {
        self.state
    }

    /// Last known trend direction.
    pub fn trend(&self) -> Option<TrendDirection> {
        self.trend
    }

    /// Name of the policy driving the machine.
    pub fn policy_name(&self) -> &str {
        self.policy.name()
    }

    /// Number of MA bars on which the policy was consulted.
    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    /// Number of intents emitted.
    pub fn intents_emitted(&self) -> usize {
        self.intents
    }

    /// Align the state with the order manager's exposure.
    pub fn sync(&mut self, exposure: PositionSide) {
        if exposure != self.state {
            debug!(
                symbol = %self.symbol,
                from = %self.state,
                to = %exposure,
                "State synchronized from exposure"
            );
            self.state = exposure;
        }
    }

    /// Consume the indicator state of a freshly closed bar.
    pub fn on_indicator_update(&mut self, update: &IndicatorState) -> Option<Intent> {
        if update.timeframe == self.trend_timeframe {
            self.trend = update.trend();
        }
        if update.timeframe != self.ma_timeframe {
            return None;
        }

        let action = match self.trend {
            Some(trend) if update.averages_ready(self.policy.required_averages().iter().copied()) => {
                self.evaluations += 1;
                self.policy.decide(&DecisionContext {
                    position: self.state,
                    trend,
                    indicators: update,
                })
            }
            _ => {
                debug!(
                    symbol = %self.symbol,
                    as_of = %update.as_of,
                    "Insufficient indicator data, no decision"
                );
                None
            }
        };
        self.policy.observe(update);

        let action = action.filter(|a| self.permits(*a))?;
        self.state = action.target_side();
        self.intents += 1;

        let intent = Intent::new(
            action,
            self.symbol.clone(),
            update.close,
            update.as_of + update.timeframe.duration(),
        );
        info!(
            symbol = %self.symbol,
            action = %action,
            price = %intent.reference_price,
            at = %intent.timestamp,
            "Strategy intent"
        );
        Some(intent)
    }

    fn permits(&self, action: IntentAction) -> bool {
        match action {
            IntentAction::EnterLong | IntentAction::EnterShort => self.state == PositionSide::Flat,
            IntentAction::Exit => self.state != PositionSide::Flat,
        }
    }

    /// Return to `Flat` with no trend and a fresh policy.
    pub fn reset(&mut self) {
        self.state = PositionSide::Flat;
        self.trend = None;
        self.evaluations = 0;
        self.intents = 0;
        self.policy.reset();
    }
}
