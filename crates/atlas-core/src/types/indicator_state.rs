//! Latest indicator values for one (symbol, timeframe).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::Timeframe;

/// SuperTrend direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendDirection::Up => write!(f, "up"),
            TrendDirection::Down => write!(f, "down"),
        }
    }
}

/// A defined SuperTrend reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuperTrendValue {
    pub direction: TrendDirection,
    /// Active band: the lower band in an up trend, the upper band in a down trend
    pub band: Decimal,
}

/// Indicator values computed from closed bars only.
///
/// `None` entries mean "insufficient data", never zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorState {
    pub symbol: String,
    pub timeframe: Timeframe,
    /// Open time of the closed bar these values were computed from
    pub as_of: DateTime<Utc>,
    /// Close of that bar
    pub close: Decimal,
    pub supertrend: Option<SuperTrendValue>,
    /// MA label (`fast`, `signal`, ...) to value
    pub averages: BTreeMap<String, Option<Decimal>>,
}

impl IndicatorState {
    /// Trend direction, if SuperTrend is defined.
    pub fn trend(&self) -> Option<TrendDirection> {
        self.supertrend.map(|st| st.direction)
    }

    /// Value of the labelled average, if defined.
    pub fn average(&self, label: &str) -> Option<Decimal> {
        self.averages.get(label).copied().flatten()
    }

    /// Whether every listed average is defined.
    pub fn averages_ready<'a>(&self, labels: impl IntoIterator<Item = &'a str>) -> bool {
        labels.into_iter().all(|l| self.average(l).is_some())
    }
}
