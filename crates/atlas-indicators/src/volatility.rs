//! Volatility and trend indicators: ATR and SuperTrend.

use atlas_core::error::IndicatorError;
use atlas_core::traits::StreamingIndicator;
use atlas_core::types::{Bar, SuperTrendValue, TrendDirection};
use rust_decimal::Decimal;
use std::collections::VecDeque;

/// Average True Range (ATR).
///
/// Simple mean of the last `length` true ranges. The first bar only seeds
/// the previous close, so `length + 1` bars are needed for a value.
#[derive(Debug, Clone)]
pub struct Atr {
    length: usize,
    prev_close: Option<Decimal>,
    ranges: VecDeque<Decimal>,
    sum: Decimal,
}

impl Atr {
    /// Create a new ATR indicator.
    pub fn new(length: usize) -> Result<Self, IndicatorError> {
        if length == 0 {
            return Err(IndicatorError::InvalidParameter(
                "ATR length must be greater than 0".into(),
            ));
        }
        Ok(Self {
            length,
            prev_close: None,
            ranges: VecDeque::with_capacity(length + 1),
            sum: Decimal::ZERO,
        })
    }

    /// Number of true ranges averaged.
    pub fn length(&self) -> usize {
        self.length
    }
}

impl StreamingIndicator for Atr {
    type Input = Bar;
    type Output = Decimal;

    fn update(&mut self, bar: &Bar) -> Option<Decimal> {
        let prev = self.prev_close.replace(bar.close);
        if prev.is_some() {
            let tr = bar.true_range(prev);
            self.ranges.push_back(tr);
            self.sum += tr;
            if self.ranges.len() > self.length {
                if let Some(old) = self.ranges.pop_front() {
                    self.sum -= old;
                }
            }
        }
        self.current()
    }

    fn current(&self) -> Option<Decimal> {
        (self.ranges.len() == self.length).then(|| self.sum / Decimal::from(self.length))
    }

    fn reset(&mut self) {
        self.prev_close = None;
        self.ranges.clear();
        self.sum = Decimal::ZERO;
    }

    fn period(&self) -> usize {
        self.length + 1
    }

    fn name(&self) -> &str {
        "ATR"
    }
}

/// Final bands carried between bars.
#[derive(Debug, Clone, Copy)]
struct Bands {
    upper: Decimal,
    lower: Decimal,
    direction: TrendDirection,
}

/// SuperTrend: ATR bands around the bar midpoint with directional flips.
///
/// Bands follow the standard recurrence: the upper band only moves down and
/// the lower band only moves up unless the previous close broke through
/// them. The trend flips down when the close falls below the lower band and
/// up when it rises above the upper band. The first defined bar starts in
/// the up direction.
#[derive(Debug, Clone)]
pub struct SuperTrend {
    multiplier: Decimal,
    atr: Atr,
    prev_close: Option<Decimal>,
    bands: Option<Bands>,
    name: String,
}

impl SuperTrend {
    /// Create a SuperTrend with ATR `length` and band `multiplier`.
    pub fn new(length: usize, multiplier: Decimal) -> Result<Self, IndicatorError> {
        if multiplier <= Decimal::ZERO {
            return Err(IndicatorError::InvalidParameter(format!(
                "SuperTrend multiplier must be positive, got {}",
                multiplier
            )));
        }
        Ok(Self {
            multiplier,
            atr: Atr::new(length)?,
            prev_close: None,
            bands: None,
            name: format!("supertrend_{}_{}", length, multiplier),
        })
    }

    /// Current upper and lower final bands.
    pub fn bands(&self) -> Option<(Decimal, Decimal)> {
        self.bands.map(|b| (b.upper, b.lower))
    }
}

impl StreamingIndicator for SuperTrend {
    type Input = Bar;
    type Output = SuperTrendValue;

    fn update(&mut self, bar: &Bar) -> Option<SuperTrendValue> {
        let atr = self.atr.update(bar);
        let prev_close = self.prev_close.replace(bar.close);
        let atr = atr?;

        let hl2 = bar.hl2();
        let basic_upper = hl2 + self.multiplier * atr;
        let basic_lower = hl2 - self.multiplier * atr;

        let next = match (self.bands, prev_close) {
            (Some(prev), Some(prev_close)) => {
                let upper = if basic_upper < prev.upper || prev_close > prev.upper {
                    basic_upper
                } else {
                    prev.upper
                };
                let lower = if basic_lower > prev.lower || prev_close < prev.lower {
                    basic_lower
                } else {
                    prev.lower
                };
                let direction = match prev.direction {
                    TrendDirection::Up if bar.close < lower => TrendDirection::Down,
                    TrendDirection::Down if bar.close > upper => TrendDirection::Up,
                    unchanged => unchanged,
                };
                Bands {
                    upper,
                    lower,
                    direction,
                }
            }
            _ => Bands {
                upper: basic_upper,
                lower: basic_lower,
                direction: TrendDirection::Up,
            },
        };

        self.bands = Some(next);
        self.current()
    }

    fn current(&self) -> Option<SuperTrendValue> {
        self.bands.map(|b| SuperTrendValue {
            direction: b.direction,
            band: match b.direction {
                TrendDirection::Up => b.lower,
                TrendDirection::Down => b.upper,
            },
        })
    }

    fn reset(&mut self) {
        self.atr.reset();
        self.prev_close = None;
        self.bands = None;
    }

    fn period(&self) -> usize {
        self.atr.period()
    }

    fn name(&self) -> &str {
        &self.name
    }
}
