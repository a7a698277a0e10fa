//! In-memory bar store keyed by (symbol, timeframe).

use atlas_core::error::DataError;
use atlas_core::types::{Bar, BarSeries, Timeframe};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Series of closed bars per (symbol, timeframe).
///
/// Open times are strictly increasing within a series; an append that
/// would break this is refused with `DataError::OutOfOrder`.
#[derive(Debug, Default)]
pub struct BarStore {
    series: HashMap<(String, Timeframe), BarSeries>,
    /// Per-series capacity (0 = unlimited)
    capacity: usize,
}

impl BarStore {
    /// Create an unbounded store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that keeps at most `capacity` bars per series.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            series: HashMap::new(),
            capacity,
        }
    }

    /// Append a closed bar to its series.
    pub fn append(&mut self, bar: Bar) -> Result<(), DataError> {
        let capacity = self.capacity;
        let key = (bar.symbol.clone(), bar.timeframe);
        self.series
            .entry(key)
            .or_insert_with(|| BarSeries::with_capacity(bar.symbol.clone(), bar.timeframe, capacity))
            .push(bar)
    }

    /// Append several bars in order.
    pub fn extend(&mut self, bars: impl IntoIterator<Item = Bar>) -> Result<(), DataError> {
        bars.into_iter().try_for_each(|b| self.append(b))
    }

    /// Get the series for a symbol and timeframe.
    pub fn series(&self, symbol: &str, timeframe: Timeframe) -> Option<&BarSeries> {
        self.series.get(&(symbol.to_string(), timeframe))
    }

    /// Number of stored bars for a symbol and timeframe.
    pub fn len(&self, symbol: &str, timeframe: Timeframe) -> usize {
        self.series(symbol, timeframe).map_or(0, BarSeries::len)
    }

    /// Whether the store holds no bars at all.
    pub fn is_empty(&self) -> bool {
        self.series.values().all(BarSeries::is_empty)
    }

    /// Most recent bar for a symbol and timeframe.
    pub fn last(&self, symbol: &str, timeframe: Timeframe) -> Option<&Bar> {
        self.series(symbol, timeframe).and_then(BarSeries::last)
    }

    /// Bars with `from <= open_time < to`, oldest first.
    pub fn range(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Vec<Bar> {
        self.series(symbol, timeframe)
            .map(|s| {
                s.iter()
                    .filter(|b| b.open_time >= from && b.open_time < to)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Timeframes stored for a symbol, finest first.
    pub fn timeframes(&self, symbol: &str) -> Vec<Timeframe> {
        let mut frames: Vec<Timeframe> = self
            .series
            .keys()
            .filter(|(s, _)| s == symbol)
            .map(|(_, tf)| *tf)
            .collect();
        frames.sort();
        frames
    }

    /// Clear all series for a symbol.
    pub fn clear(&mut self, symbol: &str) {
        self.series.retain(|(s, _), _| s != symbol);
    }
}
