//! Position types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::Side;

/// Direction of a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionSide {
    #[default]
    Flat,
    Long,
    Short,
}

impl PositionSide {
    /// +1 for long, -1 for short, 0 when flat.
    pub fn sign(&self) -> Decimal {
        match self {
            PositionSide::Flat => Decimal::ZERO,
            PositionSide::Long => Decimal::ONE,
            PositionSide::Short => -Decimal::ONE,
        }
    }

    /// Order side that opens a position in this direction.
    pub fn entry_side(&self) -> Option<Side> {
        match self {
            PositionSide::Flat => None,
            PositionSide::Long => Some(Side::Buy),
            PositionSide::Short => Some(Side::Sell),
        }
    }

    /// Order side that closes a position in this direction.
    pub fn exit_side(&self) -> Option<Side> {
        self.entry_side().map(|s| s.opposite())
    }
}

impl fmt::Display for PositionSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionSide::Flat => write!(f, "FLAT"),
            PositionSide::Long => write!(f, "LONG"),
            PositionSide::Short => write!(f, "SHORT"),
        }
    }
}

/// An open position in a single security.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// Symbol
    pub symbol: String,
    /// Long or short
    pub side: PositionSide,
    /// Number of shares (always positive)
    pub quantity: Decimal,
    /// Entry fill price
    pub entry_price: Decimal,
    /// Entry fill time
    pub entry_time: DateTime<Utc>,
    /// Protective stop price, if bracketed
    pub stop_price: Option<Decimal>,
    /// Profit target price, if bracketed
    pub target_price: Option<Decimal>,
    /// Commission paid on entry
    pub entry_commission: Decimal,
    /// Last price the position was marked at
    pub last_price: Decimal,
}

impl Position {
    /// Create a new position from an entry fill.
    pub fn open(
        symbol: impl Into<String>,
        side: PositionSide,
        quantity: Decimal,
        entry_price: Decimal,
        entry_time: DateTime<Utc>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            quantity,
            entry_price,
            entry_time,
            stop_price: None,
            target_price: None,
            entry_commission: Decimal::ZERO,
            last_price: entry_price,
        }
    }

    /// Check if this is a long position.
    pub fn is_long(&self) -> bool {
        self.side == PositionSide::Long
    }

    /// Check if this is a short position.
    pub fn is_short(&self) -> bool {
        self.side == PositionSide::Short
    }

    /// Gross P&L if closed at `price`.
    pub fn pnl_at(&self, price: Decimal) -> Decimal {
        (price - self.entry_price) * self.quantity * self.side.sign()
    }

    /// Unrealized P&L at the last marked price.
    pub fn unrealized_pnl(&self) -> Decimal {
        self.pnl_at(self.last_price)
    }

    /// Update the mark price.
    pub fn mark(&mut self, price: Decimal) {
        self.last_price = price;
    }

    /// Notional value at entry.
    pub fn cost_basis(&self) -> Decimal {
        self.entry_price * self.quantity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 15, 0, 0).unwrap()
    }

    #[test]
    fn test_long_pnl() {
        let mut pos = Position::open("AAPL", PositionSide::Long, dec!(100), dec!(150), t0());
        assert!(pos.is_long());
        pos.mark(dec!(155));
        assert_eq!(pos.unrealized_pnl(), dec!(500));
        assert_eq!(pos.cost_basis(), dec!(15000));
    }

    #[test]
    fn test_short_pnl() {
        let mut pos = Position::open("AAPL", PositionSide::Short, dec!(100), dec!(150), t0());
        pos.mark(dec!(155));
        assert_eq!(pos.unrealized_pnl(), dec!(-500));
        assert_eq!(pos.pnl_at(dec!(140)), dec!(1000));
    }

    #[test]
    fn test_position_sides() {
        assert_eq!(PositionSide::Long.entry_side(), Some(Side::Buy));
        assert_eq!(PositionSide::Short.exit_side(), Some(Side::Buy));
        assert_eq!(PositionSide::Flat.entry_side(), None);
        assert_eq!(PositionSide::Flat.sign(), Decimal::ZERO);
    }
}
