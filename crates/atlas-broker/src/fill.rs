//! Bar-based fill rules.
//!
//! Every price returned here lies within `[bar.low, bar.high]`.

use atlas_core::types::{Bar, Order, OrderType, Side};
use rust_decimal::Decimal;

/// Price at which `order` fills against `bar`, or `None` if it does not.
///
/// - Market orders fill at the open.
/// - Limit orders fill when the range reaches the limit, at the limit.
/// - Stops fill when the range reaches the trigger, at the trigger; a bar
///   that opens through the stop fills at the open.
/// - Take-profits fill when the range reaches the target, at the target,
///   never better.
pub fn fill_price(order: &Order, bar: &Bar) -> Option<Decimal> {
    match order.order_type {
        OrderType::Market => Some(bar.open),
        OrderType::Limit => {
            let limit = order.limit_price?;
            touches_favourable(order.side, limit, bar).then(|| bar.clamp(limit))
        }
        OrderType::TakeProfit => {
            let target = order.stop_price?;
            touches_favourable(order.side, target, bar).then(|| bar.clamp(target))
        }
        OrderType::Stop => {
            let trigger = order.stop_price?;
            let gapped = match order.side {
                Side::Buy => bar.open >= trigger,
                Side::Sell => bar.open <= trigger,
            };
            if gapped {
                Some(bar.open)
            } else {
                touches_adverse(order.side, trigger, bar).then(|| bar.clamp(trigger))
            }
        }
    }
}

/// Buy at or below `price`, or sell at or above it.
fn touches_favourable(side: Side, price: Decimal, bar: &Bar) -> bool {
    match side {
        Side::Buy => bar.low <= price,
        Side::Sell => bar.high >= price,
    }
}

/// Buy stop above the market, or sell stop below it.
fn touches_adverse(side: Side, price: Decimal, bar: &Bar) -> bool {
    match side {
        Side::Buy => bar.high >= price,
        Side::Sell => bar.low <= price,
    }
}
