//! Bracket stop-loss and take-profit levels.

use atlas_core::types::PositionSide;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Percentage offsets of the contingent exits from the entry fill price.
///
/// Longs stop below and take profit above the entry; shorts the reverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketLevels {
    pub stop_loss_pct: Decimal,
    pub take_profit_pct: Decimal,
    /// Decimal places prices are rounded to
    #[serde(default = "default_precision")]
    pub precision: u32,
}

fn default_precision() -> u32 {
    4
}

impl Default for BracketLevels {
    fn default() -> Self {
        Self {
            stop_loss_pct: Decimal::new(2, 2),
            take_profit_pct: Decimal::new(3, 2),
            precision: default_precision(),
        }
    }
}

impl BracketLevels {
    /// Create levels from fractional offsets (0.02 = 2%).
    pub fn new(stop_loss_pct: Decimal, take_profit_pct: Decimal) -> Self {
        Self {
            stop_loss_pct,
            take_profit_pct,
            precision: default_precision(),
        }
    }

    /// Check both offsets lie in (0, 1).
    pub fn validate(&self) -> Result<(), String> {
        let in_range = |p: Decimal| p > Decimal::ZERO && p < Decimal::ONE;
        if !in_range(self.stop_loss_pct) {
            return Err(format!("stop_loss_pct must be in (0, 1), got {}", self.stop_loss_pct));
        }
        if !in_range(self.take_profit_pct) {
            return Err(format!(
                "take_profit_pct must be in (0, 1), got {}",
                self.take_profit_pct
            ));
        }
        Ok(())
    }

    /// Protective stop for a position entered at `entry`.
    pub fn stop_price(&self, entry: Decimal, side: PositionSide) -> Option<Decimal> {
        let price = match side {
            PositionSide::Long => entry * (Decimal::ONE - self.stop_loss_pct),
            PositionSide::Short => entry * (Decimal::ONE + self.stop_loss_pct),
            PositionSide::Flat => return None,
        };
        Some(price.round_dp(self.precision))
    }

    /// Profit target for a position entered at `entry`.
    pub fn target_price(&self, entry: Decimal, side: PositionSide) -> Option<Decimal> {
        let price = match side {
            PositionSide::Long => entry * (Decimal::ONE + self.take_profit_pct),
            PositionSide::Short => entry * (Decimal::ONE - self.take_profit_pct),
            PositionSide::Flat => return None,
        };
        Some(price.round_dp(self.precision))
    }

    /// `(stop, target)` for a position entered at `entry`.
    pub fn levels(&self, entry: Decimal, side: PositionSide) -> Option<(Decimal, Decimal)> {
        Some((self.stop_price(entry, side)?, self.target_price(entry, side)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_long_levels() {
        let levels = BracketLevels::new(dec!(0.02), dec!(0.03));
        assert_eq!(
            levels.levels(dec!(50), PositionSide::Long),
            Some((dec!(49), dec!(51.5)))
        );
    }

    #[test]
    fn test_short_levels() {
        let levels = BracketLevels::new(dec!(0.02), dec!(0.03));
        assert_eq!(
            levels.levels(dec!(100), PositionSide::Short),
            Some((dec!(102), dec!(97)))
        );
        assert_eq!(levels.levels(dec!(100), PositionSide::Flat), None);
    }

    #[test]
    fn test_rounding() {
        let levels = BracketLevels::new(dec!(0.02), dec!(0.03));
        // 123.4567 * 0.98 = 120.987566
        assert_eq!(
            levels.stop_price(dec!(123.4567), PositionSide::Long),
            Some(dec!(120.9876))
        );
    }

    #[test]
    fn test_validate() {
        assert!(BracketLevels::default().validate().is_ok());
        assert!(BracketLevels::new(dec!(0), dec!(0.03)).validate().is_err());
        assert!(BracketLevels::new(dec!(0.02), dec!(1)).validate().is_err());
    }
}
