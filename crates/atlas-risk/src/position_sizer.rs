//! Position sizing algorithms.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Position sizing method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum PositionSizingMethod {
    /// Fixed number of shares
    Fixed { shares: Decimal },
    /// Fraction of current equity committed to the position
    CapitalFraction { fraction: Decimal },
    /// Fraction of current equity lost if the stop is hit
    RiskBased { risk_fraction: Decimal },
}

impl Default for PositionSizingMethod {
    fn default() -> Self {
        PositionSizingMethod::Fixed {
            shares: Decimal::ONE_HUNDRED,
        }
    }
}

impl PositionSizingMethod {
    /// Check the method's parameters.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            PositionSizingMethod::Fixed { shares } if *shares <= Decimal::ZERO => {
                Err(format!("fixed share count must be positive, got {}", shares))
            }
            PositionSizingMethod::CapitalFraction { fraction }
                if *fraction <= Decimal::ZERO || *fraction > Decimal::ONE =>
            {
                Err(format!("capital fraction must be in (0, 1], got {}", fraction))
            }
            PositionSizingMethod::RiskBased { risk_fraction }
                if *risk_fraction <= Decimal::ZERO || *risk_fraction >= Decimal::ONE =>
            {
                Err(format!("risk fraction must be in (0, 1), got {}", risk_fraction))
            }
            _ => Ok(()),
        }
    }
}

/// Position sizer calculates the appropriate position size.
///
/// Sizes are floored to whole shares. Affordability is not checked here;
/// the order manager rejects entries it cannot fund.
#[derive(Debug, Clone, Default)]
pub struct PositionSizer {
    method: PositionSizingMethod,
    max_shares: Option<Decimal>,
}

impl PositionSizer {
    /// Create a new position sizer.
    pub fn new(method: PositionSizingMethod) -> Self {
        Self {
            method,
            max_shares: None,
        }
    }

    /// Set maximum shares per position.
    pub fn with_max_shares(mut self, max: Decimal) -> Self {
        self.max_shares = Some(max);
        self
    }

    pub fn method(&self) -> &PositionSizingMethod {
        &self.method
    }

    /// Calculate position size.
    ///
    /// `stop_price` is the planned protective stop, used by risk-based
    /// sizing; without one, risk-based sizing commits `risk_fraction` of
    /// equity instead.
    pub fn calculate(
        &self,
        equity: Decimal,
        price: Decimal,
        stop_price: Option<Decimal>,
    ) -> Decimal {
        if price <= Decimal::ZERO {
            return Decimal::ZERO;
        }

        let size = match &self.method {
            PositionSizingMethod::Fixed { shares } => *shares,

            PositionSizingMethod::CapitalFraction { fraction } => equity * *fraction / price,

            PositionSizingMethod::RiskBased { risk_fraction } => {
                let risk_amount = equity * *risk_fraction;
                match stop_price.map(|stop| (price - stop).abs()) {
                    Some(per_share) if per_share > Decimal::ZERO => risk_amount / per_share,
                    Some(_) => Decimal::ZERO,
                    None => risk_amount / price,
                }
            }
        };

        let size = match self.max_shares {
            Some(max) => size.min(max),
            None => size,
        };

        size.max(Decimal::ZERO).floor()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_fixed_shares() {
        let sizer = PositionSizer::new(PositionSizingMethod::Fixed { shares: dec!(100) });
        assert_eq!(sizer.calculate(dec!(100000), dec!(50), None), dec!(100));
        // Fixed sizing ignores equity
        assert_eq!(sizer.calculate(dec!(10), dec!(50), None), dec!(100));
    }

    #[test]
    fn test_capital_fraction() {
        let sizer = PositionSizer::new(PositionSizingMethod::CapitalFraction {
            fraction: dec!(0.05),
        });
        // 5% of 100000 = 5000, at $100/share = 50 shares
        assert_eq!(sizer.calculate(dec!(100000), dec!(100), None), dec!(50));
        // Floors to whole shares
        assert_eq!(sizer.calculate(dec!(100000), dec!(30), None), dec!(166));
    }

    #[test]
    fn test_risk_based() {
        let sizer = PositionSizer::new(PositionSizingMethod::RiskBased {
            risk_fraction: dec!(0.01),
        });
        // Risk $1000 with $2 per share at risk = 500 shares
        assert_eq!(sizer.calculate(dec!(100000), dec!(100), Some(dec!(98))), dec!(500));
        // No stop: commit 1% of equity
        assert_eq!(sizer.calculate(dec!(100000), dec!(100), None), dec!(10));
        // Stop at the entry price cannot be sized
        assert_eq!(sizer.calculate(dec!(100000), dec!(100), Some(dec!(100))), dec!(0));
    }

    #[test]
    fn test_max_shares() {
        let sizer = PositionSizer::new(PositionSizingMethod::CapitalFraction { fraction: dec!(1) })
            .with_max_shares(dec!(25));
        assert_eq!(sizer.calculate(dec!(100000), dec!(10), None), dec!(25));
    }

    #[test]
    fn test_validate() {
        assert!(PositionSizingMethod::default().validate().is_ok());
        assert!(PositionSizingMethod::Fixed { shares: dec!(0) }.validate().is_err());
        assert!(PositionSizingMethod::CapitalFraction { fraction: dec!(1.5) }
            .validate()
            .is_err());
        assert!(PositionSizingMethod::RiskBased { risk_fraction: dec!(0.02) }
            .validate()
            .is_ok());
    }

    #[test]
    fn test_serde_tagged() {
        let method: PositionSizingMethod =
            serde_json::from_str(r#"{"method":"capital_fraction","fraction":"0.1"}"#).unwrap();
        assert_eq!(
            method,
            PositionSizingMethod::CapitalFraction { fraction: dec!(0.1) }
        );
    }
}
