//! Incremental multi-timeframe resampling.

use atlas_core::error::{DataError, OutOfOrderBarError};
use atlas_core::types::{Bar, Timeframe};
use chrono::{DateTime, Utc};
use std::cmp::Reverse;
use tracing::trace;

/// Aggregates base bars of one symbol into coarser timeframes.
///
/// Each target keeps one open bucket keyed by its canonical start
/// (`floor(open_time, duration)`). A bucket is finalized either when the
/// base bar that completes it arrives or, after a gap, when a bar from a
/// later bucket arrives. Bars finalized by the same ingest are returned
/// coarsest first.
#[derive(Debug, Clone)]
pub struct Resampler {
    symbol: String,
    base: Timeframe,
    /// Sorted coarsest first
    targets: Vec<Timeframe>,
    buckets: Vec<Option<Bar>>,
    last_open: Option<DateTime<Utc>>,
}

impl Resampler {
    /// Create a resampler for `symbol` from `base` into `targets`.
    ///
    /// Every target must be a whole multiple of the base timeframe.
    pub fn new(
        symbol: impl Into<String>,
        base: Timeframe,
        targets: impl IntoIterator<Item = Timeframe>,
    ) -> Result<Self, DataError> {
        let mut targets: Vec<Timeframe> = targets.into_iter().collect();
        if let Some(bad) = targets.iter().find(|tf| !tf.is_multiple_of(base)) {
            return Err(DataError::InvalidTimeframe(format!(
                "{} is not a whole multiple of base {}",
                bad, base
            )));
        }
        targets.sort_by_key(|tf| Reverse(*tf));
        targets.dedup();

        let buckets = vec![None; targets.len()];
        Ok(Self {
            symbol: symbol.into(),
            base,
            targets,
            buckets,
            last_open: None,
        })
    }

    /// Base timeframe accepted by `ingest`.
    pub fn base(&self) -> Timeframe {
        self.base
    }

    /// Target timeframes, coarsest first.
    pub fn targets(&self) -> &[Timeframe] {
        &self.targets
    }

    /// Open time of the last ingested base bar.
    pub fn last_open(&self) -> Option<DateTime<Utc>> {
        self.last_open
    }

    /// The still-forming bucket for `timeframe`, if any.
    pub fn open_bucket(&self, timeframe: Timeframe) -> Option<&Bar> {
        self.targets
            .iter()
            .position(|tf| *tf == timeframe)
            .and_then(|i| self.buckets[i].as_ref())
    }

    /// Ingest one closed base bar and return the higher-timeframe bars it
    /// finalized.
    pub fn ingest(&mut self, bar: &Bar) -> Result<Vec<Bar>, DataError> {
        if bar.timeframe != self.base {
            return Err(DataError::InvalidTimeframe(format!(
                "expected {} bar, got {}",
                self.base, bar.timeframe
            )));
        }
        if bar.symbol != self.symbol {
            return Err(DataError::SymbolNotFound(format!(
                "resampler for {} received {}",
                self.symbol, bar.symbol
            )));
        }
        if let Some(last) = self.last_open {
            if bar.open_time <= last {
                return Err(OutOfOrderBarError {
                    symbol: self.symbol.clone(),
                    timeframe: self.base,
                    last,
                    received: bar.open_time,
                }
                .into());
            }
        }
        self.last_open = Some(bar.open_time);

        let bar_end = bar.close_time();
        let mut closed = Vec::new();

        for (tf, slot) in self.targets.iter().zip(self.buckets.iter_mut()) {
            let start = tf.bucket_start(bar.open_time);

            let same_bucket = matches!(slot, Some(open) if open.open_time == start);
            if same_bucket {
                if let Some(open) = slot.as_mut() {
                    merge(open, bar);
                }
            } else if let Some(stale) = slot.replace(seed(bar, *tf, start)) {
                // Left incomplete by a gap in the base series.
                closed.push(stale);
            }

            if bar_end >= start + tf.duration() {
                if let Some(done) = slot.take() {
                    closed.push(done);
                }
            }
        }

        if !closed.is_empty() {
            trace!(
                symbol = %self.symbol,
                count = closed.len(),
                at = %bar.open_time,
                "Finalized resampled bars"
            );
        }
        Ok(closed)
    }

    /// Drop all open buckets and the ordering cursor.
    pub fn reset(&mut self) {
        self.buckets.iter_mut().for_each(|b| *b = None);
        self.last_open = None;
    }
}

fn seed(bar: &Bar, timeframe: Timeframe, start: DateTime<Utc>) -> Bar {
    Bar {
        timeframe,
        open_time: start,
        ..bar.clone()
    }
}

fn merge(bucket: &mut Bar, bar: &Bar) {
    bucket.high = bucket.high.max(bar.high);
    bucket.low = bucket.low.min(bar.low);
    bucket.close = bar.close;
    bucket.volume += bar.volume;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn minute(start: DateTime<Utc>, i: i64, o: Decimal, h: Decimal, l: Decimal, c: Decimal) -> Bar {
        Bar::new(
            "QQQ",
            Timeframe::MINUTE_1,
            start + Duration::minutes(i),
            o,
            h,
            l,
            c,
            dec!(10),
        )
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 15, 0, 0).unwrap()
    }

    #[test]
    fn test_five_minute_aggregate() {
        let mut rs = Resampler::new("QQQ", Timeframe::MINUTE_1, [Timeframe::MINUTE_5]).unwrap();
        let bars = [
            minute(t0(), 0, dec!(100), dec!(100.5), dec!(99.8), dec!(100.2)),
            minute(t0(), 1, dec!(100.2), dec!(101), dec!(100), dec!(100.4)),
            minute(t0(), 2, dec!(100.4), dec!(100.6), dec!(99), dec!(99.5)),
            minute(t0(), 3, dec!(99.5), dec!(100.1), dec!(99.2), dec!(100)),
            minute(t0(), 4, dec!(100), dec!(100.7), dec!(99.9), dec!(100.5)),
        ];

        let mut out = Vec::new();
        for (i, bar) in bars.iter().enumerate() {
            let closed = rs.ingest(bar).unwrap();
            if i < 4 {
                assert!(closed.is_empty());
            }
            out.extend(closed);
        }

        assert_eq!(out.len(), 1);
        let five = &out[0];
        assert_eq!(five.timeframe, Timeframe::MINUTE_5);
        assert_eq!(five.open_time, t0());
        assert_eq!(five.open, dec!(100));
        assert_eq!(five.high, dec!(101));
        assert_eq!(five.low, dec!(99));
        assert_eq!(five.close, dec!(100.5));
        assert_eq!(five.volume, dec!(50));
        assert!(rs.open_bucket(Timeframe::MINUTE_5).is_none());
    }

    #[test]
    fn test_gap_closes_previous_bucket() {
        let mut rs = Resampler::new("QQQ", Timeframe::MINUTE_1, [Timeframe::MINUTE_5]).unwrap();
        rs.ingest(&minute(t0(), 0, dec!(1), dec!(2), dec!(1), dec!(2))).unwrap();
        rs.ingest(&minute(t0(), 1, dec!(2), dec!(3), dec!(2), dec!(3))).unwrap();

        // Jumps into the next bucket; the partial one is emitted once.
        let closed = rs
            .ingest(&minute(t0(), 7, dec!(5), dec!(6), dec!(5), dec!(6)))
            .unwrap();
        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].open_time, t0());
        assert_eq!(closed[0].close, dec!(3));
        assert_eq!(
            rs.open_bucket(Timeframe::MINUTE_5).unwrap().open_time,
            t0() + Duration::minutes(5)
        );
    }

    #[test]
    fn test_coarsest_first() {
        let mut rs = Resampler::new(
            "QQQ",
            Timeframe::MINUTE_1,
            [Timeframe::MINUTE_5, Timeframe::MINUTE_15],
        )
        .unwrap();
        let mut last = Vec::new();
        for i in 0..15 {
            last = rs
                .ingest(&minute(t0(), i, dec!(1), dec!(1), dec!(1), dec!(1)))
                .unwrap();
        }
        let frames: Vec<_> = last.iter().map(|b| b.timeframe).collect();
        assert_eq!(frames, vec![Timeframe::MINUTE_15, Timeframe::MINUTE_5]);
    }

    #[test]
    fn test_rejects_out_of_order_and_duplicates() {
        let mut rs = Resampler::new("QQQ", Timeframe::MINUTE_1, [Timeframe::MINUTE_5]).unwrap();
        rs.ingest(&minute(t0(), 3, dec!(1), dec!(1), dec!(1), dec!(1))).unwrap();

        let err = rs
            .ingest(&minute(t0(), 2, dec!(1), dec!(1), dec!(1), dec!(1)))
            .unwrap_err();
        assert!(matches!(err, DataError::OutOfOrder(_)));
        assert!(rs
            .ingest(&minute(t0(), 3, dec!(1), dec!(1), dec!(1), dec!(1)))
            .is_err());
    }

    #[test]
    fn test_rejects_non_multiple_target() {
        let err = Resampler::new("QQQ", Timeframe::MINUTE_5, [Timeframe::minutes(7).unwrap()]);
        assert!(matches!(err, Err(DataError::InvalidTimeframe(_))));
    }

    #[test]
    fn test_rejects_wrong_base() {
        let mut rs = Resampler::new("QQQ", Timeframe::MINUTE_1, [Timeframe::MINUTE_5]).unwrap();
        let mut bar = minute(t0(), 0, dec!(1), dec!(1), dec!(1), dec!(1));
        bar.timeframe = Timeframe::MINUTE_5;
        assert!(matches!(rs.ingest(&bar), Err(DataError::InvalidTimeframe(_))));
    }
}
