//! Order types and structures.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Order side (buy or sell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Get the opposite side.
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    /// Get the sign for position calculations (+1 for buy, -1 for sell).
    pub fn sign(&self) -> Decimal {
        match self {
            Side::Buy => Decimal::ONE,
            Side::Sell => -Decimal::ONE,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// Order type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    /// Fills at the next available open
    Market,
    /// Fills only when the bar trades through the limit price
    Limit,
    /// Protective stop; fills when the bar trades through the trigger
    Stop,
    /// Profit target; fills when the bar trades through the trigger
    TakeProfit,
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderType::Market => write!(f, "MARKET"),
            OrderType::Limit => write!(f, "LIMIT"),
            OrderType::Stop => write!(f, "STOP"),
            OrderType::TakeProfit => write!(f, "TAKE_PROFIT"),
        }
    }
}

/// Order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Working, may still fill
    Pending,
    /// Completely filled
    Filled,
    /// Cancelled before filling
    Cancelled,
    /// Refused at placement
    Rejected,
}

impl OrderStatus {
    /// Check if the order is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }

    /// Check if the order is active (can still be filled).
    pub fn is_active(&self) -> bool {
        matches!(self, OrderStatus::Pending)
    }
}

/// What an order does for the position it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderRole {
    /// Opens a position
    Entry,
    /// Contingent protective exit of a bracket
    StopLoss,
    /// Contingent profit exit of a bracket
    TakeProfit,
    /// Strategy-driven flatten
    Exit,
}

/// Sequential order identifier, unique within one symbol's run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub u64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A fill represents the complete execution of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fill {
    /// Order ID this fill belongs to
    pub order_id: OrderId,
    /// Symbol traded
    pub symbol: String,
    /// Buy or sell
    pub side: Side,
    /// Quantity filled
    pub quantity: Decimal,
    /// Price at which the fill occurred
    pub price: Decimal,
    /// Commission charged
    pub commission: Decimal,
    /// Timestamp of the fill
    pub timestamp: DateTime<Utc>,
}

impl Fill {
    /// Signed notional of the fill (positive for buys).
    pub fn notional(&self) -> Decimal {
        self.price * self.quantity * self.side.sign()
    }
}

/// Complete order with status and fill information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Order ID
    pub id: OrderId,
    /// Symbol traded
    pub symbol: String,
    /// Buy or sell
    pub side: Side,
    /// Type of order
    pub order_type: OrderType,
    /// What the order does for the position
    pub role: OrderRole,
    /// Quantity
    pub quantity: Decimal,
    /// Limit price (limit orders)
    pub limit_price: Option<Decimal>,
    /// Trigger price (stop and take-profit orders)
    pub stop_price: Option<Decimal>,
    /// Entry order this contingent order belongs to
    pub parent: Option<OrderId>,
    /// Current status
    pub status: OrderStatus,
    /// When the order was created (bar time, not wall clock)
    pub created_at: DateTime<Utc>,
    /// When the order was filled
    pub filled_at: Option<DateTime<Utc>>,
    /// Fill price
    pub fill_price: Option<Decimal>,
    /// Commission charged on the fill
    pub commission: Decimal,
    /// Reason for cancellation or rejection
    pub reason: Option<String>,
}

impl Order {
    fn new(
        id: OrderId,
        symbol: impl Into<String>,
        side: Side,
        order_type: OrderType,
        role: OrderRole,
        quantity: Decimal,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            symbol: symbol.into(),
            side,
            order_type,
            role,
            quantity,
            limit_price: None,
            stop_price: None,
            parent: None,
            status: OrderStatus::Pending,
            created_at,
            filled_at: None,
            fill_price: None,
            commission: Decimal::ZERO,
            reason: None,
        }
    }

    /// Create a market order.
    pub fn market(
        id: OrderId,
        symbol: impl Into<String>,
        side: Side,
        quantity: Decimal,
        role: OrderRole,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self::new(id, symbol, side, OrderType::Market, role, quantity, created_at)
    }

    /// Create a limit order.
    pub fn limit(
        id: OrderId,
        symbol: impl Into<String>,
        side: Side,
        quantity: Decimal,
        limit_price: Decimal,
        role: OrderRole,
        created_at: DateTime<Utc>,
    ) -> Self {
        let mut order = Self::new(id, symbol, side, OrderType::Limit, role, quantity, created_at);
        order.limit_price = Some(limit_price);
        order
    }

    /// Create a contingent stop-loss order.
    pub fn stop(
        id: OrderId,
        symbol: impl Into<String>,
        side: Side,
        quantity: Decimal,
        stop_price: Decimal,
        created_at: DateTime<Utc>,
    ) -> Self {
        let mut order = Self::new(
            id,
            symbol,
            side,
            OrderType::Stop,
            OrderRole::StopLoss,
            quantity,
            created_at,
        );
        order.stop_price = Some(stop_price);
        order
    }

    /// Create a contingent take-profit order.
    pub fn take_profit(
        id: OrderId,
        symbol: impl Into<String>,
        side: Side,
        quantity: Decimal,
        target_price: Decimal,
        created_at: DateTime<Utc>,
    ) -> Self {
        let mut order = Self::new(
            id,
            symbol,
            side,
            OrderType::TakeProfit,
            OrderRole::TakeProfit,
            quantity,
            created_at,
        );
        order.stop_price = Some(target_price);
        order
    }

    /// Attach the order to its parent entry.
    pub fn with_parent(mut self, parent: OrderId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Check if the order is working.
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Check if the order is completely filled.
    pub fn is_filled(&self) -> bool {
        self.status == OrderStatus::Filled
    }

    /// Mark the order filled.
    pub fn fill(&mut self, price: Decimal, commission: Decimal, at: DateTime<Utc>) -> Fill {
        self.status = OrderStatus::Filled;
        self.fill_price = Some(price);
        self.filled_at = Some(at);
        self.commission = commission;
        Fill {
            order_id: self.id,
            symbol: self.symbol.clone(),
            side: self.side,
            quantity: self.quantity,
            price,
            commission,
            timestamp: at,
        }
    }

    /// Cancel a working order. Returns false if it was already terminal.
    pub fn cancel(&mut self, reason: impl Into<String>) -> bool {
        if !self.is_active() {
            return false;
        }
        self.status = OrderStatus::Cancelled;
        self.reason = Some(reason.into());
        true
    }

    /// Mark the order rejected.
    pub fn reject(&mut self, reason: impl Into<String>) {
        self.status = OrderStatus::Rejected;
        self.reason = Some(reason.into());
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {}",
            self.id, self.order_type, self.side, self.quantity, self.symbol
        )?;
        if let Some(price) = self.limit_price.or(self.stop_price) {
            write!(f, " @ {}", price)?;
        }
        Ok(())
    }
}
