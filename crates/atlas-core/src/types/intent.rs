//! Strategy intents handed to the order manager.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::PositionSide;

/// Action requested by a strategy transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentAction {
    EnterLong,
    EnterShort,
    Exit,
}

impl IntentAction {
    /// Position side this action moves towards.
    pub fn target_side(&self) -> PositionSide {
        match self {
            IntentAction::EnterLong => PositionSide::Long,
            IntentAction::EnterShort => PositionSide::Short,
            IntentAction::Exit => PositionSide::Flat,
        }
    }
}

impl fmt::Display for IntentAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IntentAction::EnterLong => "enter_long",
            IntentAction::EnterShort => "enter_short",
            IntentAction::Exit => "exit",
        };
        f.write_str(s)
    }
}

/// An entry or exit request for one symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    pub action: IntentAction,
    pub symbol: String,
    /// Close of the bar that triggered the decision
    pub reference_price: Decimal,
    /// Close time of that bar
    pub timestamp: DateTime<Utc>,
}

impl Intent {
    pub fn new(
        action: IntentAction,
        symbol: impl Into<String>,
        reference_price: Decimal,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            action,
            symbol: symbol.into(),
            reference_price,
            timestamp,
        }
    }
}
