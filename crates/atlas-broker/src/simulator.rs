//! Simulated order and position lifecycle for one symbol.

use atlas_core::error::BrokerError;
use atlas_core::types::{
    Bar, ExitReason, Intent, IntentAction, Order, OrderId, OrderRole, OrderType, Position,
    PositionSide, Side, Trade,
};
use atlas_risk::{BracketLevels, PositionSizer};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::bracket::{BracketLeg, BracketPair, TieBreak};
use crate::costs::CostModel;
use crate::fill;

/// Order manager configuration.
#[derive(Debug, Clone)]
pub struct OrderManagerConfig {
    pub starting_equity: Decimal,
    pub sizer: PositionSizer,
    /// Bracket offsets; `None` disables contingent exits
    pub brackets: Option<BracketLevels>,
    /// Market entries when true, limit entries at the reference price otherwise
    pub place_market_orders: bool,
    pub costs: CostModel,
    pub tie_break: TieBreak,
}

impl Default for OrderManagerConfig {
    fn default() -> Self {
        Self {
            starting_equity: Decimal::from(100_000),
            sizer: PositionSizer::default(),
            brackets: Some(BracketLevels::default()),
            place_market_orders: true,
            costs: CostModel::zero(),
            tie_break: TieBreak::default(),
        }
    }
}

/// Owns the orders, position and cash of one symbol.
///
/// Orders are simulated against bars: intents become pending orders, and
/// `on_bar` fills whatever the bar allows. A market order therefore fills
/// at the open of the bar after the decision, never on the deciding bar.
///
/// Cash is starting equity plus realized gross P&L minus commissions;
/// equity adds the open position's unrealized P&L.
#[derive(Debug, Clone)]
pub struct OrderManager {
    symbol: String,
    config: OrderManagerConfig,
    /// Indexed by `OrderId - 1`
    orders: Vec<Order>,
    position: Option<Position>,
    bracket: Option<BracketPair>,
    cash: Decimal,
}

impl OrderManager {
    pub fn new(symbol: impl Into<String>, config: OrderManagerConfig) -> Self {
        let cash = config.starting_equity;
        Self {
            symbol: symbol.into(),
            config,
            orders: Vec::new(),
            position: None,
            bracket: None,
            cash,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn config(&self) -> &OrderManagerConfig {
        &self.config
    }

    /// Every order placed so far, in placement order.
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    /// Orders placed after `last`; all orders when `last` is `None`.
    pub fn orders_after(&self, last: Option<OrderId>) -> &[Order] {
        let start = last.map(|id| id.0 as usize).unwrap_or(0);
        self.orders.get(start..).unwrap_or(&[])
    }

    pub fn order(&self, id: OrderId) -> Option<&Order> {
        self.index(id).map(|i| &self.orders[i])
    }

    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    pub fn bracket(&self) -> Option<&BracketPair> {
        self.bracket.as_ref()
    }

    pub fn cash(&self) -> Decimal {
        self.cash
    }

    /// Cash plus unrealized P&L of the open position.
    pub fn equity(&self) -> Decimal {
        self.cash
            + self
                .position
                .as_ref()
                .map(|p| p.unrealized_pnl())
                .unwrap_or(Decimal::ZERO)
    }

    /// Position side the strategy should assume.
    ///
    /// A pending entry counts as its target side and a pending exit as flat,
    /// so a decision is never issued twice while its order is working.
    pub fn exposure(&self) -> PositionSide {
        if self.working(OrderRole::Exit).is_some() {
            return PositionSide::Flat;
        }
        if let Some(position) = &self.position {
            return position.side;
        }
        match self.working(OrderRole::Entry).map(|i| self.orders[i].side) {
            Some(Side::Buy) => PositionSide::Long,
            Some(Side::Sell) => PositionSide::Short,
            None => PositionSide::Flat,
        }
    }

    /// Turn a strategy intent into orders.
    ///
    /// Entries are sized from current equity and rejected when the account
    /// cannot fund them; the rejected order is kept for reporting. Bracket
    /// exits are created when the entry fills, since their prices derive
    /// from the fill price.
    pub fn on_intent(&mut self, intent: &Intent) -> Result<Vec<Order>, BrokerError> {
        if intent.symbol != self.symbol {
            return Err(BrokerError::OrderRejected(format!(
                "order manager for {} received intent for {}",
                self.symbol, intent.symbol
            )));
        }

        match intent.action {
            IntentAction::EnterLong | IntentAction::EnterShort => self.enter(intent),
            IntentAction::Exit => self.exit(intent),
        }
    }

    fn enter(&mut self, intent: &Intent) -> Result<Vec<Order>, BrokerError> {
        if self.position.is_some() || self.working(OrderRole::Entry).is_some() {
            return Err(BrokerError::OrderRejected(format!(
                "{} already has a position or pending entry",
                self.symbol
            )));
        }
        if self.working(OrderRole::Exit).is_some() {
            return Err(BrokerError::OrderRejected(format!(
                "{} exit still pending",
                self.symbol
            )));
        }

        let target = intent.action.target_side();
        let Some(side) = target.entry_side() else {
            return Err(BrokerError::OrderRejected("entry without a direction".into()));
        };

        let price = intent.reference_price;
        let planned_stop = self
            .config
            .brackets
            .and_then(|levels| levels.stop_price(price, target));
        let equity = self.equity();
        let quantity = self.config.sizer.calculate(equity, price, planned_stop);

        let id = self.next_id();
        let mut order = if self.config.place_market_orders {
            Order::market(id, &self.symbol, side, quantity, OrderRole::Entry, intent.timestamp)
        } else {
            Order::limit(
                id,
                &self.symbol,
                side,
                quantity,
                price,
                OrderRole::Entry,
                intent.timestamp,
            )
        };

        let required = quantity * price + self.config.costs.commission();
        let rejection = if quantity <= Decimal::ZERO {
            Some(BrokerError::OrderRejected(format!(
                "sized to zero shares at {}",
                price
            )))
        } else if required > equity {
            Some(BrokerError::InsufficientFunds {
                required,
                available: equity,
            })
        } else {
            None
        };

        if let Some(err) = rejection {
            order.reject(err.to_string());
            warn!(symbol = %self.symbol, order = %order, error = %err, "Entry rejected");
            self.orders.push(order);
            return Err(err);
        }

        info!(symbol = %self.symbol, order = %order, "Entry order placed");
        self.orders.push(order.clone());
        Ok(vec![order])
    }

    fn exit(&mut self, intent: &Intent) -> Result<Vec<Order>, BrokerError> {
        // An unfilled entry is simply withdrawn.
        if let Some(i) = self.working(OrderRole::Entry) {
            self.orders[i].cancel("exit before entry filled");
            debug!(symbol = %self.symbol, order = %self.orders[i], "Pending entry cancelled");
            return Ok(vec![self.orders[i].clone()]);
        }
        if self.working(OrderRole::Exit).is_some() {
            return Err(BrokerError::OrderRejected(format!(
                "{} exit already pending",
                self.symbol
            )));
        }
        let Some((side, quantity)) = self
            .position
            .as_ref()
            .and_then(|p| p.side.exit_side().map(|s| (s, p.quantity)))
        else {
            return Err(BrokerError::OrderRejected(format!(
                "{} has no open position to exit",
                self.symbol
            )));
        };

        let id = self.next_id();
        let order = Order::market(id, &self.symbol, side, quantity, OrderRole::Exit, intent.timestamp);
        info!(symbol = %self.symbol, order = %order, "Exit order placed");
        self.orders.push(order.clone());
        Ok(vec![order])
    }

    /// Simulate fills for one closed base bar, then mark to market.
    ///
    /// Pending entries and exits are tried first. Bracket legs of the
    /// position, including legs created by an entry filled on this bar,
    /// are tried after that.
    pub fn on_bar(&mut self, bar: &Bar) -> Option<Trade> {
        if bar.symbol != self.symbol {
            return None;
        }

        let mut trade = None;

        for role in [OrderRole::Exit, OrderRole::Entry] {
            let Some(i) = self.working(role) else {
                continue;
            };
            let order = &self.orders[i];
            if let Some(price) = fill::fill_price(order, bar) {
                let price = self.slipped(order, price, bar);
                let id = order.id;
                match self.on_fill(id, price, bar.open_time) {
                    Ok(closed) => trade = trade.or(closed),
                    Err(e) => warn!(symbol = %self.symbol, error = %e, "Fill failed"),
                }
            }
        }

        if trade.is_none() {
            trade = self.check_bracket(bar);
        }

        if let Some(position) = self.position.as_mut() {
            position.mark(bar.close);
        }
        trade
    }

    fn check_bracket(&mut self, bar: &Bar) -> Option<Trade> {
        let pair = self.bracket.as_ref().filter(|p| p.is_open())?;
        let stop = self.order(pair.stop_loss)?;
        let target = self.order(pair.take_profit)?;

        let stop_price = fill::fill_price(stop, bar);
        let target_price = fill::fill_price(target, bar);
        let leg = pair.resolve(
            stop_price.is_some(),
            target_price.is_some(),
            self.config.tie_break,
        )?;

        let (id, price) = match leg {
            BracketLeg::StopLoss => (pair.stop_loss, stop_price?),
            BracketLeg::TakeProfit => (pair.take_profit, target_price?),
        };
        if stop_price.is_some() && target_price.is_some() {
            debug!(
                symbol = %self.symbol,
                winner = ?leg,
                policy = %self.config.tie_break,
                "Both bracket legs reachable in one bar"
            );
        }

        let price = match self.order(id) {
            Some(order) => self.slipped(order, price, bar),
            None => price,
        };
        match self.on_fill(id, price, bar.open_time) {
            Ok(trade) => trade,
            Err(e) => {
                warn!(symbol = %self.symbol, error = %e, "Bracket fill failed");
                None
            }
        }
    }

    /// Apply a fill reported for `order_id` at `price`.
    ///
    /// An entry fill opens the position and places its bracket. An exit
    /// fill closes the position, cancels any remaining bracket leg and
    /// returns the completed trade.
    pub fn on_fill(
        &mut self,
        order_id: OrderId,
        price: Decimal,
        at: DateTime<Utc>,
    ) -> Result<Option<Trade>, BrokerError> {
        self.apply_fill(order_id, price, at, None)
    }

    fn apply_fill(
        &mut self,
        order_id: OrderId,
        price: Decimal,
        at: DateTime<Utc>,
        reason: Option<ExitReason>,
    ) -> Result<Option<Trade>, BrokerError> {
        let i = self
            .index(order_id)
            .ok_or_else(|| BrokerError::OrderNotFound(order_id.to_string()))?;
        if !self.orders[i].is_active() {
            return Err(BrokerError::OrderRejected(format!(
                "order {} is {:?}",
                order_id, self.orders[i].status
            )));
        }

        let commission = self.config.costs.commission();
        let role = self.orders[i].role;
        let fill = self.orders[i].fill(price, commission, at);

        match role {
            OrderRole::Entry => {
                let side = match fill.side {
                    Side::Buy => PositionSide::Long,
                    Side::Sell => PositionSide::Short,
                };
                let mut position = Position::open(&self.symbol, side, fill.quantity, price, at);
                position.entry_commission = commission;
                self.cash -= commission;

                info!(
                    symbol = %self.symbol,
                    side = %side,
                    quantity = %fill.quantity,
                    price = %price,
                    "Position opened"
                );

                if let Some((stop, target)) =
                    self.config.brackets.and_then(|l| l.levels(price, side))
                {
                    position.stop_price = Some(stop);
                    position.target_price = Some(target);
                    self.place_bracket(order_id, fill.side.opposite(), fill.quantity, stop, target, at);
                }
                self.position = Some(position);
                Ok(None)
            }
            OrderRole::StopLoss | OrderRole::TakeProfit | OrderRole::Exit => {
                let Some(position) = self.position.take() else {
                    return Err(BrokerError::OrderRejected(format!(
                        "exit {} filled without a position",
                        order_id
                    )));
                };
                let reason = reason.unwrap_or(match role {
                    OrderRole::StopLoss => ExitReason::StopLoss,
                    OrderRole::TakeProfit => ExitReason::TakeProfit,
                    _ => ExitReason::Signal,
                });

                self.settle_bracket(order_id, at);

                let trade = Trade::close(&position, price, at, commission, reason);
                self.cash += trade.pnl + position.entry_commission;

                info!(
                    symbol = %self.symbol,
                    side = %trade.side,
                    entry = %trade.entry_price,
                    exit = %trade.exit_price,
                    pnl = %trade.pnl,
                    reason = %trade.exit_reason,
                    "Position closed"
                );
                Ok(Some(trade))
            }
        }
    }

    fn place_bracket(
        &mut self,
        entry: OrderId,
        side: Side,
        quantity: Decimal,
        stop: Decimal,
        target: Decimal,
        at: DateTime<Utc>,
    ) {
        let stop_id = self.next_id();
        self.orders
            .push(Order::stop(stop_id, &self.symbol, side, quantity, stop, at).with_parent(entry));
        let target_id = self.next_id();
        self.orders.push(
            Order::take_profit(target_id, &self.symbol, side, quantity, target, at)
                .with_parent(entry),
        );
        debug!(
            symbol = %self.symbol,
            stop = %stop,
            target = %target,
            "Bracket placed"
        );
        self.bracket = Some(BracketPair::new(entry, stop_id, target_id));
    }

    /// Cancel whatever bracket legs did not fill.
    fn settle_bracket(&mut self, filled: OrderId, at: DateTime<Utc>) {
        let Some(pair) = self.bracket.as_mut() else {
            return;
        };
        let to_cancel: Vec<OrderId> = match pair.leg_of(filled) {
            Some(leg) => pair.settle(leg).into_iter().collect(),
            None => pair.cancel().map(Vec::from).unwrap_or_default(),
        };
        for id in to_cancel {
            if let Some(i) = self.index(id) {
                if self.orders[i].cancel("bracket sibling filled") {
                    debug!(symbol = %self.symbol, order = %self.orders[i], at = %at, "Order cancelled");
                }
            }
        }
    }

    /// Mark a working order rejected by an external broker.
    ///
    /// A rejected bracket leg leaves the position without that protection,
    /// so the pair is dissolved and its other leg cancelled.
    pub fn reject_order(&mut self, order_id: OrderId, reason: &str) -> Result<(), BrokerError> {
        let i = self
            .index(order_id)
            .ok_or_else(|| BrokerError::OrderNotFound(order_id.to_string()))?;
        if !self.orders[i].is_active() {
            return Ok(());
        }
        self.orders[i].reject(reason);
        warn!(symbol = %self.symbol, order = %self.orders[i], reason, "Order rejected");

        let sibling = self
            .bracket
            .as_mut()
            .filter(|p| p.leg_of(order_id).is_some())
            .and_then(|p| p.cancel())
            .into_iter()
            .flatten()
            .filter(|id| *id != order_id);
        for id in sibling.collect::<Vec<_>>() {
            if let Some(j) = self.index(id) {
                self.orders[j].cancel("bracket sibling rejected");
            }
        }
        Ok(())
    }

    /// Cancel every working order. Returns the cancelled orders.
    ///
    /// The position, if any, stays open.
    pub fn cancel_pending(&mut self, reason: &str) -> Vec<Order> {
        if let Some(pair) = self.bracket.as_mut() {
            pair.cancel();
        }
        let cancelled: Vec<Order> = self
            .orders
            .iter_mut()
            .filter_map(|o| o.cancel(reason).then(|| o.clone()))
            .collect();
        if !cancelled.is_empty() {
            info!(symbol = %self.symbol, count = cancelled.len(), reason, "Working orders cancelled");
        }
        cancelled
    }

    /// Close any open position at `bar`'s close.
    ///
    /// Working orders are cancelled first.
    pub fn flatten(&mut self, bar: &Bar, reason: ExitReason) -> Option<Trade> {
        self.cancel_pending("flattening");
        let (side, quantity) = self
            .position
            .as_ref()
            .and_then(|p| p.side.exit_side().map(|s| (s, p.quantity)))?;

        let id = self.next_id();
        let order = Order::market(id, &self.symbol, side, quantity, OrderRole::Exit, bar.close_time());
        let price = self.config.costs.slip(bar.close, side, bar);
        self.orders.push(order);

        match self.apply_fill(id, price, bar.close_time(), Some(reason)) {
            Ok(trade) => trade,
            Err(e) => {
                warn!(symbol = %self.symbol, error = %e, "Flatten failed");
                None
            }
        }
    }

    fn slipped(&self, order: &Order, price: Decimal, bar: &Bar) -> Decimal {
        match order.order_type {
            // Limit and target prices are guaranteed
            OrderType::Limit | OrderType::TakeProfit => price,
            _ => self.config.costs.slip(price, order.side, bar),
        }
    }

    fn working(&self, role: OrderRole) -> Option<usize> {
        self.orders
            .iter()
            .rposition(|o| o.role == role && o.is_active())
    }

    fn index(&self, id: OrderId) -> Option<usize> {
        let i = usize::try_from(id.0).ok()?.checked_sub(1)?;
        (i < self.orders.len()).then_some(i)
    }

    fn next_id(&self) -> OrderId {
        OrderId(self.orders.len() as u64 + 1)
    }
}
