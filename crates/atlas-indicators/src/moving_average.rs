//! Moving average indicators.

use atlas_core::error::IndicatorError;
use atlas_core::traits::StreamingIndicator;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

/// Moving average flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaType {
    #[default]
    #[serde(alias = "sma")]
    Simple,
    #[serde(alias = "ema")]
    Exponential,
}

impl fmt::Display for MaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaType::Simple => write!(f, "SMA"),
            MaType::Exponential => write!(f, "EMA"),
        }
    }
}

impl FromStr for MaType {
    type Err = IndicatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "simple" | "sma" => Ok(MaType::Simple),
            "exponential" | "ema" => Ok(MaType::Exponential),
            other => Err(IndicatorError::InvalidParameter(format!(
                "unknown moving average type: {}",
                other
            ))),
        }
    }
}

fn check_period(period: usize) -> Result<(), IndicatorError> {
    if period == 0 {
        return Err(IndicatorError::InvalidParameter(
            "Period must be greater than 0".into(),
        ));
    }
    Ok(())
}

/// Simple Moving Average (SMA).
///
/// Arithmetic mean of the last N values, kept as a rolling sum.
#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    window: VecDeque<Decimal>,
    sum: Decimal,
}

impl Sma {
    /// Create a new SMA with the specified period.
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        check_period(period)?;
        Ok(Self {
            period,
            window: VecDeque::with_capacity(period + 1),
            sum: Decimal::ZERO,
        })
    }
}

impl StreamingIndicator for Sma {
    type Input = Decimal;
    type Output = Decimal;

    fn update(&mut self, value: &Decimal) -> Option<Decimal> {
        self.window.push_back(*value);
        self.sum += *value;
        if self.window.len() > self.period {
            if let Some(old) = self.window.pop_front() {
                self.sum -= old;
            }
        }
        self.current()
    }

    fn current(&self) -> Option<Decimal> {
        (self.window.len() == self.period).then(|| self.sum / Decimal::from(self.period))
    }

    fn reset(&mut self) {
        self.window.clear();
        self.sum = Decimal::ZERO;
    }

    fn period(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "SMA"
    }
}

/// Exponential Moving Average (EMA).
///
/// `ema = prev + k * (value - prev)` with `k = 2 / (period + 1)`, seeded with
/// the SMA of the first `period` values.
#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    multiplier: Decimal,
    current: Option<Decimal>,
    count: usize,
    sum: Decimal,
}

impl Ema {
    /// Create a new EMA with the specified period.
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        check_period(period)?;
        Ok(Self {
            period,
            multiplier: Decimal::TWO / Decimal::from(period + 1),
            current: None,
            count: 0,
            sum: Decimal::ZERO,
        })
    }

    /// Smoothing factor `k`.
    pub fn multiplier(&self) -> Decimal {
        self.multiplier
    }
}

impl StreamingIndicator for Ema {
    type Input = Decimal;
    type Output = Decimal;

    fn update(&mut self, value: &Decimal) -> Option<Decimal> {
        self.count += 1;

        match self.current {
            Some(prev) => {
                self.current = Some(prev + self.multiplier * (*value - prev));
            }
            None => {
                // Accumulating for the seed SMA
                self.sum += *value;
                if self.count == self.period {
                    self.current = Some(self.sum / Decimal::from(self.period));
                }
            }
        }
        self.current
    }

    fn current(&self) -> Option<Decimal> {
        self.current
    }

    fn reset(&mut self) {
        self.current = None;
        self.count = 0;
        self.sum = Decimal::ZERO;
    }

    fn period(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "EMA"
    }
}

/// Either moving average, selected at runtime.
#[derive(Debug, Clone)]
pub enum MovingAverage {
    Simple(Sma),
    Exponential(Ema),
}

impl MovingAverage {
    /// Create a moving average of the given type and period.
    pub fn new(ma_type: MaType, period: usize) -> Result<Self, IndicatorError> {
        Ok(match ma_type {
            MaType::Simple => MovingAverage::Simple(Sma::new(period)?),
            MaType::Exponential => MovingAverage::Exponential(Ema::new(period)?),
        })
    }

    pub fn ma_type(&self) -> MaType {
        match self {
            MovingAverage::Simple(_) => MaType::Simple,
            MovingAverage::Exponential(_) => MaType::Exponential,
        }
    }
}

impl StreamingIndicator for MovingAverage {
    type Input = Decimal;
    type Output = Decimal;

    fn update(&mut self, value: &Decimal) -> Option<Decimal> {
        match self {
            MovingAverage::Simple(ma) => ma.update(value),
            MovingAverage::Exponential(ma) => ma.update(value),
        }
    }

    fn current(&self) -> Option<Decimal> {
        match self {
            MovingAverage::Simple(ma) => ma.current(),
            MovingAverage::Exponential(ma) => ma.current(),
        }
    }

    fn reset(&mut self) {
        match self {
            MovingAverage::Simple(ma) => ma.reset(),
            MovingAverage::Exponential(ma) => ma.reset(),
        }
    }

    fn period(&self) -> usize {
        match self {
            MovingAverage::Simple(ma) => ma.period(),
            MovingAverage::Exponential(ma) => ma.period(),
        }
    }

    fn name(&self) -> &str {
        match self {
            MovingAverage::Simple(ma) => ma.name(),
            MovingAverage::Exponential(ma) => ma.name(),
        }
    }
}
