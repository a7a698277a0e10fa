//! OHLCV (Open, High, Low, Close, Volume) data types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use super::Timeframe;
use crate::error::DataError;

/// A closed OHLCV bar for one symbol over one timeframe bucket.
///
/// All prices use `Decimal` so that indicator, fill and P&L arithmetic share
/// one precision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bar {
    /// Symbol identifier
    pub symbol: String,
    /// Timeframe of the bar
    pub timeframe: Timeframe,
    /// Start of the bar's bucket
    pub open_time: DateTime<Utc>,
    /// Opening price
    pub open: Decimal,
    /// Highest price
    pub high: Decimal,
    /// Lowest price
    pub low: Decimal,
    /// Closing price
    pub close: Decimal,
    /// Trading volume
    pub volume: Decimal,
}

impl Bar {
    /// Create a new bar.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        symbol: impl Into<String>,
        timeframe: Timeframe,
        open_time: DateTime<Utc>,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        volume: Decimal,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe,
            open_time,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// End of the bar's bucket (exclusive).
    pub fn close_time(&self) -> DateTime<Utc> {
        self.open_time + self.timeframe.duration()
    }

    /// Midpoint of the bar's range.
    #[inline]
    pub fn hl2(&self) -> Decimal {
        (self.high + self.low) / Decimal::TWO
    }

    /// Calculate the bar's range (high - low).
    #[inline]
    pub fn range(&self) -> Decimal {
        self.high - self.low
    }

    /// Check if the bar is bullish (close > open).
    #[inline]
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    /// Whether `price` lies within `[low, high]`.
    #[inline]
    pub fn contains(&self, price: Decimal) -> bool {
        price >= self.low && price <= self.high
    }

    /// Clamp a price into the bar's `[low, high]` range.
    #[inline]
    pub fn clamp(&self, price: Decimal) -> Decimal {
        price.max(self.low).min(self.high)
    }

    /// Calculate the true range (used for ATR).
    pub fn true_range(&self, prev_close: Option<Decimal>) -> Decimal {
        match prev_close {
            Some(pc) => {
                let hl = self.high - self.low;
                let hc = (self.high - pc).abs();
                let lc = (self.low - pc).abs();
                hl.max(hc).max(lc)
            }
            None => self.high - self.low,
        }
    }

    /// Check the OHLC invariants: `high >= max(open, close, low)`,
    /// `low <= min(open, close, high)`, no negative prices or volume.
    pub fn validate(&self) -> Result<(), DataError> {
        let malformed = |reason: &str| {
            Err(DataError::MalformedBar(format!(
                "{} {} @ {}: {}",
                self.symbol, self.timeframe, self.open_time, reason
            )))
        };

        if self.symbol.is_empty() {
            return malformed("empty symbol");
        }
        if self.low.is_sign_negative() || self.volume.is_sign_negative() {
            return malformed("negative price or volume");
        }
        if self.high < self.open.max(self.close).max(self.low) {
            return malformed("high below open/close/low");
        }
        if self.low > self.open.min(self.close).min(self.high) {
            return malformed("low above open/close/high");
        }
        Ok(())
    }
}

/// Time-series container for bars, optimized for sequential access.
#[derive(Debug, Clone)]
pub struct BarSeries {
    /// Symbol identifier
    pub symbol: String,
    /// Timeframe of the bars
    pub timeframe: Timeframe,
    /// Bars stored in a deque for efficient push/pop
    bars: VecDeque<Bar>,
    /// Maximum capacity (0 = unlimited)
    capacity: usize,
}

impl BarSeries {
    /// Create a new empty bar series.
    pub fn new(symbol: impl Into<String>, timeframe: Timeframe) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe,
            bars: VecDeque::new(),
            capacity: 0,
        }
    }

    /// Create a bar series with a maximum capacity.
    /// When capacity is reached, oldest bars are removed.
    pub fn with_capacity(symbol: impl Into<String>, timeframe: Timeframe, capacity: usize) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe,
            bars: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a bar, removing the oldest if at capacity.
    ///
    /// Open times must be strictly increasing.
    pub fn push(&mut self, bar: Bar) -> Result<(), DataError> {
        if let Some(last) = self.bars.back() {
            if bar.open_time <= last.open_time {
                return Err(DataError::OutOfOrder(crate::error::OutOfOrderBarError {
                    symbol: self.symbol.clone(),
                    timeframe: self.timeframe,
                    last: last.open_time,
                    received: bar.open_time,
                }));
            }
        }
        if self.capacity > 0 && self.bars.len() >= self.capacity {
            self.bars.pop_front();
        }
        self.bars.push_back(bar);
        Ok(())
    }

    /// Get the number of bars.
    #[inline]
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Check if the series is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Get the last N bars.
    pub fn last_n(&self, n: usize) -> Vec<&Bar> {
        let start = self.bars.len().saturating_sub(n);
        self.bars.iter().skip(start).collect()
    }

    /// Get the last bar.
    pub fn last(&self) -> Option<&Bar> {
        self.bars.back()
    }

    /// Get a bar by index (0 = oldest).
    pub fn get(&self, index: usize) -> Option<&Bar> {
        self.bars.get(index)
    }

    /// Extract close prices as a vector.
    pub fn closes(&self) -> Vec<Decimal> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// Get an iterator over the bars.
    pub fn iter(&self) -> impl Iterator<Item = &Bar> {
        self.bars.iter()
    }
}
