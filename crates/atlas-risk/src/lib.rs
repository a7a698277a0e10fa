//! Risk parameters for new positions.
//!
//! Provides position sizing and bracket stop-loss/take-profit levels.

mod brackets;
mod position_sizer;

pub use brackets::BracketLevels;
pub use position_sizer::{PositionSizer, PositionSizingMethod};
