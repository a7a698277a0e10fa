//! Core data types for the strategy engine.

mod bar;
mod indicator_state;
mod intent;
mod order;
mod position;
mod timeframe;
mod trade;

pub use bar::{Bar, BarSeries};
pub use indicator_state::{IndicatorState, SuperTrendValue, TrendDirection};
pub use intent::{Intent, IntentAction};
pub use order::{Fill, Order, OrderId, OrderRole, OrderStatus, OrderType, Side};
pub use position::{Position, PositionSide};
pub use timeframe::Timeframe;
pub use trade::{ExitReason, Trade};
