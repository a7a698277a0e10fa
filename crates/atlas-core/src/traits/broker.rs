//! Broker trait definition.

use crate::error::BrokerError;
use crate::types::{Order, OrderId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Acknowledgement returned by a broker for an accepted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAck {
    /// Engine-side order ID
    pub order_id: OrderId,
    /// Broker-side reference
    pub broker_order_id: String,
    pub accepted_at: DateTime<Utc>,
}

/// Trait for broker integrations used in live/paper mode.
///
/// Backtests never call a broker; fills are simulated from bars.
#[async_trait]
pub trait Broker: Send + Sync {
    /// Place an order.
    ///
    /// # Returns
    /// An acknowledgement, or `BrokerError::OrderRejected` /
    /// `BrokerError::InsufficientFunds` if the broker refuses it.
    async fn place_order(&self, order: &Order) -> Result<OrderAck, BrokerError>;

    /// Cancel a working order. Order IDs are unique per symbol.
    async fn cancel_order(&self, symbol: &str, order_id: OrderId) -> Result<(), BrokerError>;

    /// Cancel every working order. Returns how many were cancelled.
    async fn cancel_all_orders(&self) -> Result<usize, BrokerError>;

    /// Get the broker name.
    fn name(&self) -> &str;
}
