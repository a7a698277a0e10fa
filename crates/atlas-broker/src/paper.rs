//! In-process paper broker for live-mode runs.

use async_trait::async_trait;
use atlas_core::error::BrokerError;
use atlas_core::traits::{Broker, OrderAck};
use atlas_core::types::{Order, OrderId, OrderStatus};
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Clone)]
struct PaperOrder {
    broker_order_id: String,
    symbol: String,
    status: OrderStatus,
}

/// Paper broker that acknowledges orders without routing them anywhere.
///
/// Fills in paper mode are simulated from bars by the order manager; this
/// broker only records what was placed and cancelled. It can be told to
/// refuse every order to exercise rejection handling.
#[derive(Debug, Clone, Default)]
pub struct PaperBroker {
    orders: Arc<Mutex<HashMap<(String, OrderId), PaperOrder>>>,
    reject_reason: Option<String>,
}

impl PaperBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse every order with `reason`.
    pub fn rejecting(reason: impl Into<String>) -> Self {
        Self {
            orders: Arc::default(),
            reject_reason: Some(reason.into()),
        }
    }

    /// Number of orders acknowledged so far.
    pub async fn accepted_count(&self) -> usize {
        self.orders.lock().await.len()
    }

    /// Orders still working at the broker.
    pub async fn open_orders(&self) -> Vec<(String, OrderId)> {
        let orders = self.orders.lock().await;
        let mut open: Vec<_> = orders
            .iter()
            .filter(|(_, o)| o.status.is_active())
            .map(|(key, _)| key.clone())
            .collect();
        open.sort();
        open
    }
}

#[async_trait]
impl Broker for PaperBroker {
    async fn place_order(&self, order: &Order) -> Result<OrderAck, BrokerError> {
        if let Some(reason) = &self.reject_reason {
            return Err(BrokerError::OrderRejected(reason.clone()));
        }
        if order.quantity <= Decimal::ZERO {
            return Err(BrokerError::OrderRejected(format!(
                "quantity must be positive, got {}",
                order.quantity
            )));
        }

        let broker_order_id = Uuid::new_v4().to_string();
        let mut orders = self.orders.lock().await;
        orders.insert(
            (order.symbol.clone(), order.id),
            PaperOrder {
                broker_order_id: broker_order_id.clone(),
                symbol: order.symbol.clone(),
                status: OrderStatus::Pending,
            },
        );
        debug!(order = %order, broker_order_id = %broker_order_id, "Paper order accepted");

        Ok(OrderAck {
            order_id: order.id,
            broker_order_id,
            accepted_at: Utc::now(),
        })
    }

    async fn cancel_order(&self, symbol: &str, order_id: OrderId) -> Result<(), BrokerError> {
        let mut orders = self.orders.lock().await;
        let order = orders
            .get_mut(&(symbol.to_string(), order_id))
            .ok_or_else(|| BrokerError::OrderNotFound(format!("{} {}", symbol, order_id)))?;

        if order.status.is_terminal() {
            return Err(BrokerError::OrderRejected(format!(
                "order {} already {:?}",
                order.broker_order_id, order.status
            )));
        }
        order.status = OrderStatus::Cancelled;
        debug!(symbol = %order.symbol, order_id = %order_id, "Paper order cancelled");
        Ok(())
    }

    async fn cancel_all_orders(&self) -> Result<usize, BrokerError> {
        let mut orders = self.orders.lock().await;
        let mut count = 0;
        for order in orders.values_mut().filter(|o| o.status.is_active()) {
            order.status = OrderStatus::Cancelled;
            count += 1;
        }
        if count > 0 {
            info!(count, "Paper orders cancelled");
        }
        Ok(count)
    }

    fn name(&self) -> &str {
        "paper"
    }
}
