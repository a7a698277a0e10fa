//! Linked stop-loss / take-profit pair.

use atlas_core::types::OrderId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which leg wins when both could fill inside the same bar.
///
/// Bars carry no intrabar path, so a same-bar tie is resolved by policy.
/// `StopFirst` assumes the adverse outcome; live fills may differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    #[default]
    StopFirst,
    TakeProfitFirst,
}

impl fmt::Display for TieBreak {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TieBreak::StopFirst => write!(f, "stop_first"),
            TieBreak::TakeProfitFirst => write!(f, "take_profit_first"),
        }
    }
}

/// One leg of a bracket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BracketLeg {
    StopLoss,
    TakeProfit,
}

/// Lifecycle of a bracket pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BracketState {
    /// Both legs working
    #[default]
    Open,
    /// One leg filled; the other was cancelled
    Settled(BracketLeg),
    /// Both legs cancelled (position closed by another order, or run stopped)
    Cancelled,
}

/// Mutually cancelling exit orders protecting one position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketPair {
    pub entry: OrderId,
    pub stop_loss: OrderId,
    pub take_profit: OrderId,
    state: BracketState,
}

impl BracketPair {
    pub fn new(entry: OrderId, stop_loss: OrderId, take_profit: OrderId) -> Self {
        Self {
            entry,
            stop_loss,
            take_profit,
            state: BracketState::Open,
        }
    }

    pub fn state(&self) -> BracketState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == BracketState::Open
    }

    /// Order ID of a leg.
    pub fn order(&self, leg: BracketLeg) -> OrderId {
        match leg {
            BracketLeg::StopLoss => self.stop_loss,
            BracketLeg::TakeProfit => self.take_profit,
        }
    }

    /// Order ID of the other leg.
    pub fn sibling(&self, leg: BracketLeg) -> OrderId {
        match leg {
            BracketLeg::StopLoss => self.take_profit,
            BracketLeg::TakeProfit => self.stop_loss,
        }
    }

    /// Leg that `order_id` belongs to.
    pub fn leg_of(&self, order_id: OrderId) -> Option<BracketLeg> {
        if order_id == self.stop_loss {
            Some(BracketLeg::StopLoss)
        } else if order_id == self.take_profit {
            Some(BracketLeg::TakeProfit)
        } else {
            None
        }
    }

    /// Pick the leg that fills given which legs triggered in a bar.
    ///
    /// Returns `None` if neither triggered or the pair is no longer open.
    /// The pair is not settled until [`settle`](Self::settle) is called.
    ///
    /// Only whether each leg triggered is considered, not where the bar
    /// opened: a bar that gaps through one level but also reaches the
    /// other still goes to `tie`.
    pub fn resolve(&self, stop_hit: bool, take_profit_hit: bool, tie: TieBreak) -> Option<BracketLeg> {
        if !self.is_open() {
            return None;
        }
        match (stop_hit, take_profit_hit) {
            (true, true) => Some(match tie {
                TieBreak::StopFirst => BracketLeg::StopLoss,
                TieBreak::TakeProfitFirst => BracketLeg::TakeProfit,
            }),
            (true, false) => Some(BracketLeg::StopLoss),
            (false, true) => Some(BracketLeg::TakeProfit),
            (false, false) => None,
        }
    }

    /// Record that `leg` filled. Returns the sibling to cancel, once.
    pub fn settle(&mut self, leg: BracketLeg) -> Option<OrderId> {
        if !self.is_open() {
            return None;
        }
        self.state = BracketState::Settled(leg);
        Some(self.sibling(leg))
    }

    /// Cancel both legs. Returns their IDs if the pair was still open.
    pub fn cancel(&mut self) -> Option<[OrderId; 2]> {
        if !self.is_open() {
            return None;
        }
        self.state = BracketState::Cancelled;
        Some([self.stop_loss, self.take_profit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> BracketPair {
        BracketPair::new(OrderId(1), OrderId(2), OrderId(3))
    }

    #[test]
    fn test_tie_break_stop_first_by_default() {
        let p = pair();
        assert_eq!(
            p.resolve(true, true, TieBreak::default()),
            Some(BracketLeg::StopLoss)
        );
        assert_eq!(
            p.resolve(true, true, TieBreak::TakeProfitFirst),
            Some(BracketLeg::TakeProfit)
        );
        assert_eq!(p.resolve(false, false, TieBreak::StopFirst), None);
        assert_eq!(
            p.resolve(false, true, TieBreak::StopFirst),
            Some(BracketLeg::TakeProfit)
        );
    }

    #[test]
    fn test_settle_once() {
        let mut p = pair();
        assert_eq!(p.settle(BracketLeg::StopLoss), Some(OrderId(3)));
        assert_eq!(p.state(), BracketState::Settled(BracketLeg::StopLoss));
        // A settled pair never yields a second winner
        assert_eq!(p.settle(BracketLeg::TakeProfit), None);
        assert_eq!(p.resolve(true, true, TieBreak::StopFirst), None);
        assert_eq!(p.cancel(), None);
    }

    #[test]
    fn test_cancel() {
        let mut p = pair();
        assert_eq!(p.cancel(), Some([OrderId(2), OrderId(3)]));
        assert_eq!(p.state(), BracketState::Cancelled);
        assert_eq!(p.settle(BracketLeg::StopLoss), None);
    }

    #[test]
    fn test_leg_lookup() {
        let p = pair();
        assert_eq!(p.leg_of(OrderId(2)), Some(BracketLeg::StopLoss));
        assert_eq!(p.leg_of(OrderId(3)), Some(BracketLeg::TakeProfit));
        assert_eq!(p.leg_of(OrderId(1)), None);
        assert_eq!(p.sibling(BracketLeg::TakeProfit), OrderId(2));
        assert_eq!(TieBreak::TakeProfitFirst.to_string(), "take_profit_first");
    }
}
