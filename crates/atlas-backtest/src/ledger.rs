//! Run ledger: equity curve and closed trades.

use atlas_core::types::Trade;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Account equity at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: DateTime<Utc>,
    pub equity: Decimal,
}

/// Summary metrics of a ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub starting_equity: Decimal,
    pub final_equity: Decimal,
    /// Net P&L over starting equity, in percent
    pub total_return_pct: Decimal,
    pub net_pnl: Decimal,
    pub total_costs: Decimal,
    pub trade_count: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    /// Winners over all trades, in percent
    pub win_rate_pct: Decimal,
    pub avg_win: Decimal,
    /// Average loss as a positive amount
    pub avg_loss: Decimal,
    /// Gross profit over gross loss; `None` without losing trades
    pub profit_factor: Option<Decimal>,
    /// Largest peak-to-trough decline of the equity curve, in percent
    pub max_drawdown_pct: Decimal,
}

/// Append-only record of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunLedger {
    starting_equity: Decimal,
    equity_curve: Vec<EquityPoint>,
    trades: Vec<Trade>,
    peak_equity: Decimal,
    max_drawdown_pct: Decimal,
}

impl RunLedger {
    pub fn new(starting_equity: Decimal) -> Self {
        Self {
            starting_equity,
            equity_curve: Vec::new(),
            trades: Vec::new(),
            peak_equity: starting_equity,
            max_drawdown_pct: Decimal::ZERO,
        }
    }

    /// Record equity at `timestamp`.
    ///
    /// Points are kept in time order: a second point at the same timestamp
    /// replaces the first, and an earlier timestamp is refused.
    pub fn record_equity(&mut self, timestamp: DateTime<Utc>, equity: Decimal) -> bool {
        match self.equity_curve.last_mut() {
            Some(last) if timestamp < last.timestamp => {
                warn!(
                    at = %timestamp,
                    last = %last.timestamp,
                    "Equity point earlier than the curve, ignored"
                );
                return false;
            }
            Some(last) if timestamp == last.timestamp => last.equity = equity,
            _ => self.equity_curve.push(EquityPoint { timestamp, equity }),
        }

        if equity > self.peak_equity {
            self.peak_equity = equity;
        }
        if self.peak_equity > Decimal::ZERO {
            let drawdown = (self.peak_equity - equity) / self.peak_equity * dec!(100);
            if drawdown > self.max_drawdown_pct {
                self.max_drawdown_pct = drawdown;
            }
        }
        true
    }

    /// Record a closed round trip.
    pub fn record_trade(&mut self, trade: Trade) {
        self.trades.push(trade);
    }

    pub fn starting_equity(&self) -> Decimal {
        self.starting_equity
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn equity_curve(&self) -> &[EquityPoint] {
        &self.equity_curve
    }

    /// Last recorded equity, or the starting equity.
    pub fn current_equity(&self) -> Decimal {
        self.equity_curve
            .last()
            .map(|p| p.equity)
            .unwrap_or(self.starting_equity)
    }

    /// Compute summary metrics.
    pub fn snapshot(&self) -> LedgerSnapshot {
        let final_equity = self.current_equity();
        let total_return_pct = if self.starting_equity > Decimal::ZERO {
            (final_equity - self.starting_equity) / self.starting_equity * dec!(100)
        } else {
            Decimal::ZERO
        };

        let (mut winners, mut losers) = (0usize, 0usize);
        let (mut gross_profit, mut gross_loss) = (Decimal::ZERO, Decimal::ZERO);
        let mut total_costs = Decimal::ZERO;
        let mut net_pnl = Decimal::ZERO;

        for trade in &self.trades {
            net_pnl += trade.pnl;
            total_costs += trade.costs;
            if trade.pnl > Decimal::ZERO {
                winners += 1;
                gross_profit += trade.pnl;
            } else if trade.pnl < Decimal::ZERO {
                losers += 1;
                gross_loss += trade.pnl.abs();
            }
        }

        let trade_count = self.trades.len();
        let average = |total: Decimal, n: usize| {
            if n > 0 {
                total / Decimal::from(n)
            } else {
                Decimal::ZERO
            }
        };

        LedgerSnapshot {
            starting_equity: self.starting_equity,
            final_equity,
            total_return_pct,
            net_pnl,
            total_costs,
            trade_count,
            winning_trades: winners,
            losing_trades: losers,
            win_rate_pct: average(Decimal::from(winners * 100), trade_count),
            avg_win: average(gross_profit, winners),
            avg_loss: average(gross_loss, losers),
            profit_factor: (gross_loss > Decimal::ZERO).then(|| gross_profit / gross_loss),
            max_drawdown_pct: self.max_drawdown_pct,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atlas_core::types::{ExitReason, Position, PositionSide};
    use chrono::{Duration, TimeZone};

    fn t(i: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 15, 0, 0).unwrap() + Duration::minutes(i)
    }

    fn trade(entry: Decimal, exit: Decimal) -> Trade {
        let pos = Position::open("QQQ", PositionSide::Long, dec!(10), entry, t(0));
        Trade::close(&pos, exit, t(1), Decimal::ZERO, ExitReason::Signal)
    }

    #[test]
    fn test_drawdown_peak_to_trough() {
        let mut ledger = RunLedger::new(dec!(1000));
        for (i, eq) in [dec!(1000), dec!(1200), dec!(900), dec!(1100), dec!(1300)]
            .into_iter()
            .enumerate()
        {
            ledger.record_equity(t(i as i64), eq);
        }
        let snap = ledger.snapshot();
        // (1200 - 900) / 1200
        assert_eq!(snap.max_drawdown_pct, dec!(25));
        assert_eq!(snap.final_equity, dec!(1300));
        assert_eq!(snap.total_return_pct, dec!(30));
    }

    #[test]
    fn test_equity_points_monotonic() {
        let mut ledger = RunLedger::new(dec!(1000));
        assert!(ledger.record_equity(t(2), dec!(1000)));
        assert!(ledger.record_equity(t(2), dec!(1010)));
        assert!(!ledger.record_equity(t(1), dec!(990)));
        assert_eq!(ledger.equity_curve().len(), 1);
        assert_eq!(ledger.current_equity(), dec!(1010));
    }

    #[test]
    fn test_trade_statistics() {
        let mut ledger = RunLedger::new(dec!(1000));
        ledger.record_trade(trade(dec!(10), dec!(12)));
        ledger.record_trade(trade(dec!(10), dec!(9)));
        ledger.record_trade(trade(dec!(10), dec!(13)));
        ledger.record_trade(trade(dec!(10), dec!(10)));

        let snap = ledger.snapshot();
        assert_eq!(snap.trade_count, 4);
        assert_eq!(snap.winning_trades, 2);
        assert_eq!(snap.losing_trades, 1);
        assert_eq!(snap.win_rate_pct, dec!(50));
        assert_eq!(snap.avg_win, dec!(25));
        assert_eq!(snap.avg_loss, dec!(10));
        assert_eq!(snap.profit_factor, Some(dec!(5)));
        assert_eq!(snap.net_pnl, dec!(40));
    }

    #[test]
    fn test_empty_ledger() {
        let snap = RunLedger::new(dec!(1000)).snapshot();
        assert_eq!(snap.trade_count, 0);
        assert_eq!(snap.win_rate_pct, dec!(0));
        assert_eq!(snap.profit_factor, None);
        assert_eq!(snap.final_equity, dec!(1000));
    }
}
