//! Order and position lifecycle.
//!
//! [`OrderManager`] simulates orders against bars for one symbol. Fill
//! rules, costs and the bracket pair live in their own modules;
//! [`PaperBroker`] is the in-process collaborator used in paper mode.

mod bracket;
mod costs;
pub mod fill;
mod paper;
mod simulator;

pub use bracket::{BracketLeg, BracketPair, BracketState, TieBreak};
pub use costs::CostModel;
pub use paper::PaperBroker;
pub use simulator::{OrderManager, OrderManagerConfig};
