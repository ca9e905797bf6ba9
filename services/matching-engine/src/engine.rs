//! Matching engine core
//!
//! Owns one order book per symbol and serializes every submitted intent
//! through a single matching worker. Callers may submit from any thread;
//! `submit_order` stamps a monotonic id and timestamp, enqueues, signals
//! the worker, and returns the id synchronously. The worker dequeues,
//! applies the intent to the target book, runs the matching cycle, and
//! fans out executions and order-status updates with no lock held.
//!
//! Lock order is engine state → book state; callbacks run lock-free, so a
//! subscriber may re-enter `submit_order` without deadlocking.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use types::errors::EngineError;
use types::execution::Execution;
use types::order::{Order, OrderStatus, OrderType};

use crate::book::OrderBook;
use crate::clock::MonotonicClock;
use crate::events::{self, Subscribers, SubscriptionId};
use crate::matching::{self, ExecutionFactory};

/// Running totals for the engine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineStats {
    /// Orders accepted by `submit_order`
    pub total_orders: u64,
    /// Executions emitted
    pub total_executions: u64,
    /// Sum of execution notionals
    pub total_volume: f64,
}

/// State guarded by the engine lock: the intent queue and the symbol map.
/// The run flag lives here too so the worker's condvar predicate and the
/// stop signal share one mutex and wakeups cannot be lost.
struct EngineState {
    queue: VecDeque<Order>,
    books: HashMap<String, Arc<OrderBook>>,
    next_order_id: u64,
    in_flight: bool,
    running: bool,
}

struct EngineShared {
    state: Mutex<EngineState>,
    /// Wakes the matching worker when intents arrive or the engine stops
    work_cv: Condvar,
    /// Wakes `wait_until_idle` callers when the queue drains
    idle_cv: Condvar,
    executions: ExecutionFactory,
    clock: MonotonicClock,
    execution_subs: Mutex<Subscribers<dyn Fn(&Execution) + Send + Sync>>,
    status_subs: Mutex<Subscribers<dyn Fn(&Order) + Send + Sync>>,
    stats: Mutex<EngineStats>,
}

/// Order matching engine: one matching worker, one book per symbol
pub struct MatchingEngine {
    shared: Arc<EngineShared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl MatchingEngine {
    /// Create a stopped engine with no symbols
    pub fn new() -> Self {
        Self {
            shared: Arc::new(EngineShared {
                state: Mutex::new(EngineState {
                    queue: VecDeque::new(),
                    books: HashMap::new(),
                    next_order_id: 0,
                    in_flight: false,
                    running: false,
                }),
                work_cv: Condvar::new(),
                idle_cv: Condvar::new(),
                executions: ExecutionFactory::new(),
                clock: MonotonicClock::new(),
                execution_subs: Mutex::new(Subscribers::new()),
                status_subs: Mutex::new(Subscribers::new()),
                stats: Mutex::new(EngineStats::default()),
            }),
            worker: Mutex::new(None),
        }
    }

    /// Spawn the matching worker. Idempotent.
    pub fn start(&self) {
        {
            let mut state = self.shared.state.lock();
            if state.running {
                return;
            }
            state.running = true;
        }

        let shared = Arc::clone(&self.shared);
        let handle = std::thread::Builder::new()
            .name("matching-worker".to_string())
            .spawn(move || shared.worker_loop())
            .expect("failed to spawn matching worker");
        *self.worker.lock() = Some(handle);
        info!("matching engine started");
    }

    /// Stop the worker and join it. Idempotent.
    ///
    /// Intents still queued at stop time are discarded.
    pub fn stop(&self) {
        {
            let mut state = self.shared.state.lock();
            if !state.running {
                return;
            }
            state.running = false;
        }
        self.shared.work_cv.notify_all();

        if let Some(handle) = self.worker.lock().take() {
            let _ = handle.join();
        }

        let mut state = self.shared.state.lock();
        let discarded = state.queue.len();
        state.queue.clear();
        state.in_flight = false;
        drop(state);
        self.shared.idle_cv.notify_all();

        info!(discarded, "matching engine stopped");
    }

    /// Check if the worker is running
    pub fn is_running(&self) -> bool {
        self.shared.state.lock().running
    }

    /// Idempotent symbol registration; creates an empty book
    pub fn add_symbol(&self, symbol: &str) {
        let mut state = self.shared.state.lock();
        state
            .books
            .entry(symbol.to_string())
            .or_insert_with(|| Arc::new(OrderBook::new(symbol)));
    }

    /// Symbols with registered books
    pub fn symbols(&self) -> Vec<String> {
        self.shared.state.lock().books.keys().cloned().collect()
    }

    /// Borrow a book by symbol
    pub fn get_order_book(&self, symbol: &str) -> Result<Arc<OrderBook>, EngineError> {
        self.shared
            .state
            .lock()
            .books
            .get(symbol)
            .cloned()
            .ok_or_else(|| EngineError::UnknownSymbol {
                symbol: symbol.to_string(),
            })
    }

    /// Stamp id and timestamp, enqueue, signal the worker.
    ///
    /// Returns the assigned id, or 0 when the engine is not running —
    /// a lost worker must surface as fast failure, not a silent queue.
    pub fn submit_order(&self, mut order: Order) -> u64 {
        let id = {
            let mut state = self.shared.state.lock();
            if !state.running {
                return 0;
            }
            state.next_order_id += 1;
            let id = state.next_order_id;
            order.id = id;
            order.timestamp = self.shared.clock.now_nanos();
            order.status = OrderStatus::Pending;
            state.queue.push_back(order);
            id
        };
        self.shared.work_cv.notify_one();
        self.shared.stats.lock().total_orders += 1;
        id
    }

    /// Best-effort cancel: the queue first (trader-id matched), then every
    /// book. A race with matching may find the order already filled.
    pub fn cancel_order(&self, order_id: u64, trader_id: &str) -> bool {
        let from_queue = {
            let mut state = self.shared.state.lock();
            let index = state
                .queue
                .iter()
                .position(|o| o.id == order_id && o.trader_id == trader_id);
            index.and_then(|index| state.queue.remove(index))
        };
        if let Some(mut order) = from_queue {
            order.status = OrderStatus::Cancelled;
            self.shared.dispatch_status(&order);
            return true;
        }

        for book in self.book_handles() {
            if let Some(mut order) = book.remove_order(order_id) {
                order.status = OrderStatus::Cancelled;
                self.shared.dispatch_status(&order);
                return true;
            }
        }
        false
    }

    /// Modify in the queue if still pending (keeps queue position), else
    /// cancel-and-replace in the owning book (loses time priority).
    pub fn modify_order(
        &self,
        order_id: u64,
        new_price: f64,
        new_quantity: u32,
        trader_id: &str,
    ) -> bool {
        {
            let mut state = self.shared.state.lock();
            if let Some(order) = state
                .queue
                .iter_mut()
                .find(|o| o.id == order_id && o.trader_id == trader_id)
            {
                order.price = new_price;
                order.quantity = new_quantity;
                return true;
            }
        }

        self.book_handles()
            .iter()
            .any(|book| book.modify_order(order_id, new_price, new_quantity))
    }

    /// Register an execution subscriber
    pub fn subscribe_executions(
        &self,
        callback: impl Fn(&Execution) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.shared.execution_subs.lock().add(Arc::new(callback))
    }

    /// Remove an execution subscriber
    pub fn unsubscribe_executions(&self, id: SubscriptionId) -> bool {
        self.shared.execution_subs.lock().remove(id)
    }

    /// Register an order-status subscriber
    pub fn subscribe_order_status(
        &self,
        callback: impl Fn(&Order) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.shared.status_subs.lock().add(Arc::new(callback))
    }

    /// Remove an order-status subscriber
    pub fn unsubscribe_order_status(&self, id: SubscriptionId) -> bool {
        self.shared.status_subs.lock().remove(id)
    }

    /// Running totals
    pub fn stats(&self) -> EngineStats {
        self.shared.stats.lock().clone()
    }

    /// Block until the queue is drained and the worker is between intents,
    /// or the timeout elapses. Returns true when idle was reached.
    ///
    /// Must not be called from inside a subscriber callback.
    pub fn wait_until_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.shared.state.lock();
        while !state.queue.is_empty() || state.in_flight {
            if self
                .shared
                .idle_cv
                .wait_until(&mut state, deadline)
                .timed_out()
            {
                return state.queue.is_empty() && !state.in_flight;
            }
        }
        true
    }

    fn book_handles(&self) -> Vec<Arc<OrderBook>> {
        self.shared.state.lock().books.values().cloned().collect()
    }
}

impl EngineShared {
    fn worker_loop(&self) {
        loop {
            let (order, book) = {
                let mut state = self.state.lock();
                while state.queue.is_empty() && state.running {
                    self.work_cv.wait(&mut state);
                }
                if !state.running {
                    return;
                }
                let order = match state.queue.pop_front() {
                    Some(order) => order,
                    None => continue,
                };
                let book = state.books.get(&order.symbol).cloned();
                state.in_flight = true;
                (order, book)
            };

            match book {
                Some(book) if valid_intent(&order) => self.process(&book, order),
                Some(_) => {
                    debug!(order_id = order.id, "dropping invalid intent");
                }
                None => {
                    warn!(
                        order_id = order.id,
                        symbol = %order.symbol,
                        "dropping intent for unknown symbol"
                    );
                }
            }

            let mut state = self.state.lock();
            state.in_flight = false;
            if state.queue.is_empty() {
                drop(state);
                self.idle_cv.notify_all();
            }
        }
    }

    /// Apply one intent to its book and fan out the results
    fn process(&self, book: &OrderBook, order: Order) {
        let is_sweep = matches!(order.order_type, OrderType::Market | OrderType::Stop);

        let (result, price_change) = {
            let mut state = book.lock_state();
            let before = (state.best_bid, state.best_ask);
            let result = if is_sweep {
                matching::run_market_cycle(&mut state, order, &self.executions, &self.clock)
            } else {
                matching::run_limit_cycle(&mut state, order, &self.executions, &self.clock)
            };
            let change = book.price_change(&state, before);
            (result, change)
        };

        if !result.executions.is_empty() {
            let mut stats = self.stats.lock();
            stats.total_executions += result.executions.len() as u64;
            stats.total_volume += result.executions.iter().map(Execution::notional).sum::<f64>();
        }

        for execution in &result.executions {
            self.dispatch_execution(execution);
        }
        for maker in &result.maker_updates {
            self.dispatch_status(maker);
        }
        self.dispatch_status(&result.taker);
        book.emit_price_update(price_change);
    }

    fn dispatch_execution(&self, execution: &Execution) {
        // Bind the snapshot first so the subscriber lock is released
        // before any callback runs
        let callbacks = self.execution_subs.lock().snapshot();
        for callback in callbacks {
            events::run_isolated("execution", || callback(execution));
        }
    }

    fn dispatch_status(&self, order: &Order) {
        let callbacks = self.status_subs.lock().snapshot();
        for callback in callbacks {
            events::run_isolated("order_status", || callback(order));
        }
    }
}

impl Default for MatchingEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for MatchingEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Intents that slip past the manager are dropped silently by the worker
fn valid_intent(order: &Order) -> bool {
    if order.quantity == 0 {
        return false;
    }
    match order.order_type {
        OrderType::Market | OrderType::Stop => true,
        OrderType::Limit | OrderType::StopLimit => {
            order.price.is_finite() && order.price > 0.0
        }
    }
}
