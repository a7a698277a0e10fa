//! Per-symbol indicator engine over closed bars.

use atlas_core::error::{DataError, IndicatorError, OutOfOrderBarError};
use atlas_core::traits::StreamingIndicator;
use atlas_core::types::{Bar, IndicatorState, Timeframe};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::trace;

use crate::moving_average::{MaType, MovingAverage};
use crate::volatility::SuperTrend;

/// Indicators attached to one timeframe.
#[derive(Debug, Clone, Default)]
struct TimeframeIndicators {
    supertrend: Option<SuperTrend>,
    averages: Vec<(String, MovingAverage)>,
    bars: usize,
    last_open: Option<DateTime<Utc>>,
    latest: Option<IndicatorState>,
}

/// Computes SuperTrend and labelled moving averages for one symbol.
///
/// Only closed bars are accepted, in strictly increasing open time per
/// timeframe, so a value published for bar *t* is never revised by later
/// bars.
#[derive(Debug, Clone)]
pub struct IndicatorEngine {
    symbol: String,
    frames: BTreeMap<Timeframe, TimeframeIndicators>,
}

impl IndicatorEngine {
    /// Create an engine with no indicators.
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            frames: BTreeMap::new(),
        }
    }

    /// Attach a SuperTrend to `timeframe`.
    pub fn with_supertrend(
        mut self,
        timeframe: Timeframe,
        length: usize,
        multiplier: Decimal,
    ) -> Result<Self, IndicatorError> {
        self.frames.entry(timeframe).or_default().supertrend =
            Some(SuperTrend::new(length, multiplier)?);
        Ok(self)
    }

    /// Attach a labelled moving average to `timeframe`.
    pub fn with_average(
        mut self,
        timeframe: Timeframe,
        label: impl Into<String>,
        ma_type: MaType,
        period: usize,
    ) -> Result<Self, IndicatorError> {
        let label = label.into();
        let frame = self.frames.entry(timeframe).or_default();
        if frame.averages.iter().any(|(l, _)| *l == label) {
            return Err(IndicatorError::InvalidParameter(format!(
                "duplicate average label '{}' on {}",
                label, timeframe
            )));
        }
        frame
            .averages
            .push((label, MovingAverage::new(ma_type, period)?));
        Ok(self)
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Timeframes with at least one indicator, finest first.
    pub fn timeframes(&self) -> impl Iterator<Item = Timeframe> + '_ {
        self.frames.keys().copied()
    }

    /// Whether any indicator is attached to `timeframe`.
    pub fn tracks(&self, timeframe: Timeframe) -> bool {
        self.frames.contains_key(&timeframe)
    }

    /// Feed a closed bar.
    ///
    /// Returns the refreshed state for the bar's timeframe, or `None` if the
    /// timeframe carries no indicators.
    pub fn on_closed_bar(&mut self, bar: &Bar) -> Result<Option<IndicatorState>, DataError> {
        let Some(frame) = self.frames.get_mut(&bar.timeframe) else {
            return Ok(None);
        };

        if let Some(last) = frame.last_open {
            if bar.open_time <= last {
                return Err(OutOfOrderBarError {
                    symbol: self.symbol.clone(),
                    timeframe: bar.timeframe,
                    last,
                    received: bar.open_time,
                }
                .into());
            }
        }
        frame.last_open = Some(bar.open_time);
        frame.bars += 1;

        let supertrend = frame.supertrend.as_mut().and_then(|st| st.update(bar));
        let averages = frame
            .averages
            .iter_mut()
            .map(|(label, ma)| (label.clone(), ma.update(&bar.close)))
            .collect();

        let state = IndicatorState {
            symbol: self.symbol.clone(),
            timeframe: bar.timeframe,
            as_of: bar.open_time,
            close: bar.close,
            supertrend,
            averages,
        };

        trace!(
            symbol = %self.symbol,
            timeframe = %bar.timeframe,
            trend = ?state.trend(),
            "Indicators updated"
        );

        frame.latest = Some(state.clone());
        Ok(Some(state))
    }

    /// Most recent state for a timeframe.
    pub fn latest(&self, timeframe: Timeframe) -> Option<&IndicatorState> {
        self.frames.get(&timeframe).and_then(|f| f.latest.as_ref())
    }

    /// Whether every indicator on `timeframe` has seen enough bars to be
    /// defined.
    pub fn ensure_ready(&self, timeframe: Timeframe) -> Result<(), IndicatorError> {
        let frame = self.frames.get(&timeframe).ok_or_else(|| {
            IndicatorError::InvalidParameter(format!("no indicators on {}", timeframe))
        })?;
        let required = frame
            .supertrend
            .iter()
            .map(|st| st.period())
            .chain(frame.averages.iter().map(|(_, ma)| ma.period()))
            .max()
            .unwrap_or(0);
        if frame.bars < required {
            return Err(IndicatorError::InsufficientData {
                required,
                available: frame.bars,
            });
        }
        Ok(())
    }

    /// Clear all indicator state, keeping the configuration.
    pub fn reset(&mut self) {
        for frame in self.frames.values_mut() {
            if let Some(st) = frame.supertrend.as_mut() {
                st.reset();
            }
            for (_, ma) in frame.averages.iter_mut() {
                ma.reset();
            }
            frame.bars = 0;
            frame.last_open = None;
            frame.latest = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atlas_core::types::TrendDirection;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn bar(tf: Timeframe, i: i64, close: Decimal) -> Bar {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 2, 12, 0, 0).unwrap();
        Bar::new(
            "QQQ",
            tf,
            t0 + tf.duration() * i as i32,
            close,
            close + dec!(1),
            close - dec!(1),
            close,
            dec!(100),
        )
    }

    fn engine() -> IndicatorEngine {
        IndicatorEngine::new("QQQ")
            .with_supertrend(Timeframe::HOUR_3, 3, dec!(2))
            .unwrap()
            .with_average(Timeframe::MINUTE_30, "fast", MaType::Simple, 2)
            .unwrap()
            .with_average(Timeframe::MINUTE_30, "slow", MaType::Exponential, 3)
            .unwrap()
    }

    #[test]
    fn test_averages_fill_in() {
        let mut engine = engine();

        let s1 = engine
            .on_closed_bar(&bar(Timeframe::MINUTE_30, 0, dec!(10)))
            .unwrap()
            .unwrap();
        assert_eq!(s1.average("fast"), None);

        let s2 = engine
            .on_closed_bar(&bar(Timeframe::MINUTE_30, 1, dec!(12)))
            .unwrap()
            .unwrap();
        assert_eq!(s2.average("fast"), Some(dec!(11)));
        assert_eq!(s2.average("slow"), None);

        let s3 = engine
            .on_closed_bar(&bar(Timeframe::MINUTE_30, 2, dec!(14)))
            .unwrap()
            .unwrap();
        assert_eq!(s3.average("slow"), Some(dec!(12)));
        assert_eq!(s3.supertrend, None);
    }

    #[test]
    fn test_supertrend_needs_length_plus_one() {
        let mut engine = engine();
        for i in 0..3 {
            let state = engine
                .on_closed_bar(&bar(Timeframe::HOUR_3, i, dec!(100) + Decimal::from(i)))
                .unwrap()
                .unwrap();
            assert_eq!(state.trend(), None);
        }
        let state = engine
            .on_closed_bar(&bar(Timeframe::HOUR_3, 3, dec!(104)))
            .unwrap()
            .unwrap();
        assert_eq!(state.trend(), Some(TrendDirection::Up));
        assert_eq!(engine.latest(Timeframe::HOUR_3), Some(&state));
    }

    #[test]
    fn test_ensure_ready_reports_warmup() {
        let mut engine = engine();
        for i in 0..2 {
            engine
                .on_closed_bar(&bar(Timeframe::HOUR_3, i, dec!(100)))
                .unwrap();
        }
        assert_eq!(
            engine.ensure_ready(Timeframe::HOUR_3),
            Err(IndicatorError::InsufficientData {
                required: 4,
                available: 2
            })
        );
        for i in 2..4 {
            engine
                .on_closed_bar(&bar(Timeframe::HOUR_3, i, dec!(100)))
                .unwrap();
        }
        assert!(engine.ensure_ready(Timeframe::HOUR_3).is_ok());
        assert!(matches!(
            engine.ensure_ready(Timeframe::DAILY),
            Err(IndicatorError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_untracked_timeframe_and_ordering() {
        let mut engine = engine();
        assert!(engine
            .on_closed_bar(&bar(Timeframe::MINUTE_1, 0, dec!(1)))
            .unwrap()
            .is_none());

        engine
            .on_closed_bar(&bar(Timeframe::MINUTE_30, 4, dec!(1)))
            .unwrap();
        let err = engine
            .on_closed_bar(&bar(Timeframe::MINUTE_30, 4, dec!(1)))
            .unwrap_err();
        assert!(matches!(err, DataError::OutOfOrder(_)));
    }

    #[test]
    fn test_duplicate_label_rejected() {
        let result = IndicatorEngine::new("QQQ")
            .with_average(Timeframe::MINUTE_30, "fast", MaType::Simple, 5)
            .and_then(|e| e.with_average(Timeframe::MINUTE_30, "fast", MaType::Simple, 9));
        assert!(result.is_err());
    }

    #[test]
    fn test_reset() {
        let mut engine = engine();
        engine
            .on_closed_bar(&bar(Timeframe::MINUTE_30, 0, dec!(10)))
            .unwrap();
        engine.reset();
        assert!(engine.latest(Timeframe::MINUTE_30).is_none());
        // Ordering cursor is cleared too
        assert!(engine
            .on_closed_bar(&bar(Timeframe::MINUTE_30, 0, dec!(10)))
            .is_ok());
    }
}
