//! Order manager façade
//!
//! Sits above the matching engine: validates every submission against the
//! current risk limits, tracks the per-trader active-order index, and folds
//! the execution stream into positions, daily PnL, and drawdown.
//!
//! Lock order is manager → engine → book. The manager lock is held across
//! `submit_order` so the engine's status callbacks (which also take the
//! manager lock) can never observe an order before it is indexed; the
//! engine dispatches callbacks with no engine/book lock held, so this
//! cannot deadlock.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, warn};

use matching_engine::{EngineStats, MatchingEngine, OrderBook};
use types::errors::EngineError;
use types::execution::Execution;
use types::order::{Order, OrderStatus};
use types::position::Position;
use types::risk::RiskLimits;

use crate::events::ManagerCallbacks;
use crate::risk;

/// State guarded by the manager lock
#[derive(Default)]
struct ManagerState {
    /// trader_id → order_id → last seen order state
    active_orders: HashMap<String, HashMap<u64, Order>>,
    positions: HashMap<String, Position>,
    risk_limits: RiskLimits,
    daily_pnl: f64,
    peak_equity: f64,
    max_drawdown: f64,
}

impl ManagerState {
    /// Fold one execution into positions and PnL counters.
    ///
    /// Returns a snapshot of the mutated position for fanout.
    fn apply_execution(&mut self, execution: &Execution) -> Position {
        let position = self
            .positions
            .entry(execution.symbol.clone())
            .or_insert_with(|| Position::new(&execution.symbol));

        let realized =
            position.apply_execution(execution.side, execution.quantity, execution.price);
        self.daily_pnl += realized;
        let snapshot = position.clone();

        self.refresh_drawdown();
        snapshot
    }

    /// Track peak equity and the worst fractional decline from it
    fn refresh_drawdown(&mut self) {
        let equity: f64 = self.positions.values().map(Position::total_pnl).sum();
        if equity > self.peak_equity {
            self.peak_equity = equity;
        }
        if self.peak_equity > 0.0 {
            let drawdown = (self.peak_equity - equity) / self.peak_equity;
            if drawdown > self.max_drawdown {
                self.max_drawdown = drawdown;
            }
        }
    }

    /// Mirror engine status updates into the active-order index.
    ///
    /// Terminal orders leave the index; unknown ids (orders placed around
    /// the manager) are ignored.
    fn record_status(&mut self, order: &Order) {
        let Some(orders) = self.active_orders.get_mut(&order.trader_id) else {
            return;
        };
        if order.status.is_terminal() {
            orders.remove(&order.id);
        } else if orders.contains_key(&order.id) {
            orders.insert(order.id, order.clone());
        }
    }
}

/// Risk gate, position ledger, and notification hub above the engine
pub struct OrderManager {
    engine: Arc<MatchingEngine>,
    state: Arc<Mutex<ManagerState>>,
    callbacks: Arc<ManagerCallbacks>,
}

impl OrderManager {
    /// Create a manager with its own engine, wired for execution and
    /// order-status feedback. The engine is not started yet.
    pub fn new() -> Self {
        let engine = Arc::new(MatchingEngine::new());
        let state = Arc::new(Mutex::new(ManagerState::default()));
        let callbacks = Arc::new(ManagerCallbacks::new());

        let execution_state = Arc::clone(&state);
        let execution_callbacks = Arc::clone(&callbacks);
        engine.subscribe_executions(move |execution| {
            let snapshot = execution_state.lock().apply_execution(execution);
            execution_callbacks.emit_execution(execution);
            execution_callbacks.emit_position(&snapshot);
        });

        let status_state = Arc::clone(&state);
        engine.subscribe_order_status(move |order| {
            status_state.lock().record_status(order);
        });

        Self {
            engine,
            state,
            callbacks,
        }
    }

    // ── Lifecycle ──

    /// Start the underlying matching worker
    pub fn start(&self) {
        self.engine.start();
    }

    /// Stop the matching worker; queued intents are discarded
    pub fn stop(&self) {
        self.engine.stop();
    }

    pub fn is_running(&self) -> bool {
        self.engine.is_running()
    }

    /// Idempotent symbol registration
    pub fn add_symbol(&self, symbol: &str) {
        self.engine.add_symbol(symbol);
    }

    /// The engine this manager fronts
    pub fn engine(&self) -> &MatchingEngine {
        &self.engine
    }

    // ── Order management ──

    /// Run the risk gate; on pass submit to the engine and index the order.
    ///
    /// Returns the engine-assigned id, or 0 on rejection (with an optional
    /// risk-alert callback carrying the reason).
    pub fn place_order(&self, order: Order) -> u64 {
        let rejection = {
            let state = self.state.lock();
            let position = state
                .positions
                .get(&order.symbol)
                .cloned()
                .unwrap_or_else(|| Position::new(&order.symbol));
            risk::validate_order(&order, &position, &state.risk_limits, state.daily_pnl).err()
        };

        if let Some(violation) = rejection {
            warn!(
                trader_id = %order.trader_id,
                symbol = %order.symbol,
                %violation,
                "order rejected by risk"
            );
            self.callbacks.emit_risk_alert(&violation.to_string());
            return 0;
        }

        let mut state = self.state.lock();
        let id = self.engine.submit_order(order.clone());
        if id == 0 {
            debug!("engine refused submission (not running)");
            return 0;
        }

        let mut tracked = order;
        tracked.id = id;
        tracked.status = OrderStatus::Pending;
        state
            .active_orders
            .entry(tracked.trader_id.clone())
            .or_default()
            .insert(id, tracked);
        id
    }

    /// Pass-through cancel; prunes the active index on success
    pub fn cancel_order(&self, order_id: u64, trader_id: &str) -> bool {
        let cancelled = self.engine.cancel_order(order_id, trader_id);
        if cancelled {
            if let Some(orders) = self.state.lock().active_orders.get_mut(trader_id) {
                orders.remove(&order_id);
            }
        }
        cancelled
    }

    /// Pass-through modify; mirrors the change into the active index
    pub fn modify_order(
        &self,
        order_id: u64,
        new_price: f64,
        new_quantity: u32,
        trader_id: &str,
    ) -> bool {
        let modified = self
            .engine
            .modify_order(order_id, new_price, new_quantity, trader_id);
        if modified {
            if let Some(order) = self
                .state
                .lock()
                .active_orders
                .get_mut(trader_id)
                .and_then(|orders| orders.get_mut(&order_id))
            {
                order.price = new_price;
                order.quantity = new_quantity;
            }
        }
        modified
    }

    /// Orders currently tracked for a trader
    pub fn get_active_orders(&self, trader_id: &str) -> Vec<Order> {
        self.state
            .lock()
            .active_orders
            .get(trader_id)
            .map(|orders| orders.values().cloned().collect())
            .unwrap_or_default()
    }

    // ── Positions and PnL ──

    /// Snapshot of the position for a symbol (flat if never traded)
    pub fn get_position(&self, symbol: &str) -> Position {
        self.state
            .lock()
            .positions
            .get(symbol)
            .cloned()
            .unwrap_or_else(|| Position::new(symbol))
    }

    /// Snapshot of every position
    pub fn get_all_positions(&self) -> Vec<Position> {
        self.state.lock().positions.values().cloned().collect()
    }

    /// Refresh a position's unrealized PnL against a reference price
    pub fn mark_price(&self, symbol: &str, price: f64) {
        let snapshot = {
            let mut state = self.state.lock();
            let Some(position) = state.positions.get_mut(symbol) else {
                return;
            };
            position.mark_to_market(price);
            let snapshot = position.clone();
            state.refresh_drawdown();
            snapshot
        };
        self.callbacks.emit_position(&snapshot);
    }

    /// Σ(realized + unrealized) across positions
    pub fn get_total_pnl(&self) -> f64 {
        self.state
            .lock()
            .positions
            .values()
            .map(Position::total_pnl)
            .sum()
    }

    /// Realized PnL accumulated today
    pub fn get_daily_pnl(&self) -> f64 {
        self.state.lock().daily_pnl
    }

    /// Worst peak-to-trough equity decline seen, as a fraction
    pub fn get_max_drawdown(&self) -> f64 {
        self.state.lock().max_drawdown
    }

    // ── Risk ──

    /// Atomic replace; subsequent checks use the new limits
    pub fn set_risk_limits(&self, limits: RiskLimits) {
        self.state.lock().risk_limits = limits;
    }

    pub fn get_risk_limits(&self) -> RiskLimits {
        self.state.lock().risk_limits.clone()
    }

    // ── Callbacks ──

    pub fn subscribe_executions(&self, callback: impl Fn(&Execution) + Send + Sync + 'static) {
        self.callbacks.add_execution(callback);
    }

    pub fn subscribe_positions(&self, callback: impl Fn(&Position) + Send + Sync + 'static) {
        self.callbacks.add_position(callback);
    }

    pub fn subscribe_risk_alerts(&self, callback: impl Fn(&str) + Send + Sync + 'static) {
        self.callbacks.add_risk_alert(callback);
    }

    // ── Market data access ──

    /// Borrow a book by symbol; errors on unregistered symbols
    pub fn get_order_book(&self, symbol: &str) -> Result<Arc<OrderBook>, EngineError> {
        self.engine.get_order_book(symbol)
    }

    /// Engine totals
    pub fn stats(&self) -> EngineStats {
        self.engine.stats()
    }

    /// Test/simulation hook: block until the engine has drained its queue
    pub fn wait_until_idle(&self, timeout: Duration) -> bool {
        self.engine.wait_until_idle(timeout)
    }
}

impl Default for OrderManager {
    fn default() -> Self {
        Self::new()
    }
}
