//! Commission and slippage model.

use atlas_core::types::{Bar, Side};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Per-fill trading costs. Zero by default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostModel {
    /// Flat commission charged on every fill
    #[serde(default)]
    pub commission: Decimal,
    /// Adverse slippage in basis points of the fill price
    #[serde(default)]
    pub slippage_bps: Decimal,
}

impl CostModel {
    pub fn new(commission: Decimal, slippage_bps: Decimal) -> Self {
        Self {
            commission,
            slippage_bps,
        }
    }

    /// Costs of nothing.
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.commission < Decimal::ZERO {
            return Err(format!("commission must not be negative, got {}", self.commission));
        }
        if self.slippage_bps < Decimal::ZERO {
            return Err(format!(
                "slippage_bps must not be negative, got {}",
                self.slippage_bps
            ));
        }
        Ok(())
    }

    /// Move `price` against the order side, staying inside the bar's range.
    ///
    /// Buys pay more and sells receive less.
    pub fn slip(&self, price: Decimal, side: Side, bar: &Bar) -> Decimal {
        if self.slippage_bps.is_zero() {
            return price;
        }
        let offset = price * self.slippage_bps / Decimal::from(10_000);
        bar.clamp(price + offset * side.sign())
    }

    /// Commission for one fill.
    pub fn commission(&self) -> Decimal {
        self.commission
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atlas_core::types::Timeframe;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn bar() -> Bar {
        Bar::new(
            "QQQ",
            Timeframe::MINUTE_1,
            Utc.with_ymd_and_hms(2024, 1, 2, 15, 0, 0).unwrap(),
            dec!(100),
            dec!(101),
            dec!(99),
            dec!(100.5),
            dec!(1000),
        )
    }

    #[test]
    fn test_zero_costs() {
        let costs = CostModel::zero();
        assert_eq!(costs.slip(dec!(100), Side::Buy, &bar()), dec!(100));
        assert_eq!(costs.commission(), dec!(0));
    }

    #[test]
    fn test_slippage_is_adverse() {
        let costs = CostModel::new(dec!(1), dec!(10));
        // 10 bps of 100 = 0.1
        assert_eq!(costs.slip(dec!(100), Side::Buy, &bar()), dec!(100.1));
        assert_eq!(costs.slip(dec!(100), Side::Sell, &bar()), dec!(99.9));
    }

    #[test]
    fn test_slippage_clamped_to_range() {
        let costs = CostModel::new(dec!(0), dec!(500));
        assert_eq!(costs.slip(dec!(100.9), Side::Buy, &bar()), dec!(101));
        assert_eq!(costs.slip(dec!(99.2), Side::Sell, &bar()), dec!(99));
    }

    #[test]
    fn test_validate() {
        assert!(CostModel::zero().validate().is_ok());
        assert!(CostModel::new(dec!(-1), dec!(0)).validate().is_err());
        assert!(CostModel::new(dec!(0), dec!(-5)).validate().is_err());
    }
}
