//! Closed round-trip trades.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Position, PositionSide};

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
    Signal,
    EndOfRun,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExitReason::StopLoss => "stop_loss",
            ExitReason::TakeProfit => "take_profit",
            ExitReason::Signal => "signal",
            ExitReason::EndOfRun => "end_of_run",
        };
        f.write_str(s)
    }
}

/// A closed round trip. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub symbol: String,
    pub side: PositionSide,
    pub entry_time: DateTime<Utc>,
    pub entry_price: Decimal,
    pub exit_time: DateTime<Utc>,
    pub exit_price: Decimal,
    pub quantity: Decimal,
    /// Entry and exit commissions
    pub costs: Decimal,
    /// Net P&L after costs
    pub pnl: Decimal,
    pub exit_reason: ExitReason,
}

impl Trade {
    /// Close `position` at `exit_price`.
    ///
    /// `pnl = (exit - entry) * quantity * sign(side) - costs`
    pub fn close(
        position: &Position,
        exit_price: Decimal,
        exit_time: DateTime<Utc>,
        exit_commission: Decimal,
        exit_reason: ExitReason,
    ) -> Self {
        let costs = position.entry_commission + exit_commission;
        Self {
            symbol: position.symbol.clone(),
            side: position.side,
            entry_time: position.entry_time,
            entry_price: position.entry_price,
            exit_time,
            exit_price,
            quantity: position.quantity,
            costs,
            pnl: position.pnl_at(exit_price) - costs,
            exit_reason,
        }
    }

    /// Gross P&L before costs.
    pub fn gross_pnl(&self) -> Decimal {
        self.pnl + self.costs
    }

    pub fn is_winner(&self) -> bool {
        self.pnl > Decimal::ZERO
    }

    /// Return on the entry notional, as a fraction.
    pub fn return_pct(&self) -> Decimal {
        let basis = self.entry_price * self.quantity;
        if basis.is_zero() {
            Decimal::ZERO
        } else {
            self.pnl / basis
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    #[test]
    fn test_trade_pnl_identity() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 2, 15, 0, 0).unwrap();
        let mut pos = Position::open("QQQ", PositionSide::Short, dec!(10), dec!(50), t0);
        pos.entry_commission = dec!(1);

        let trade = Trade::close(&pos, dec!(48), t0, dec!(1), ExitReason::TakeProfit);
        assert_eq!(trade.costs, dec!(2));
        assert_eq!(trade.pnl, (dec!(48) - dec!(50)) * dec!(10) * dec!(-1) - dec!(2));
        assert_eq!(trade.pnl, dec!(18));
        assert_eq!(trade.gross_pnl(), dec!(20));
        assert!(trade.is_winner());
        assert_eq!(trade.exit_reason.to_string(), "take_profit");
    }
}
