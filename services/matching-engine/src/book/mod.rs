//! Order book infrastructure
//!
//! One `OrderBook` per symbol: a bid side and an ask side of FIFO price
//! levels, cached best prices, and an optional price-update callback. The
//! book does not match — crossing is driven by the engine — but exposes the
//! mutation surface the matching worker needs.
//!
//! Every public operation holds the book's exclusive lock; callbacks fire
//! after the lock is released so subscribers can re-enter the book.

pub mod ask_book;
pub mod bid_book;
pub mod price_level;

pub use ask_book::AskBook;
pub use bid_book::BidBook;
pub use price_level::PriceLevel;

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};
use types::order::{Order, Side};

use crate::events;
use crate::matching::crossing;

/// Map key for price levels.
///
/// Finite non-negative f64 prices map monotonically onto their IEEE-754 bit
/// patterns, so BTreeMap key order coincides with numeric order and equal
/// prices land on the same level under strict `==`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct PriceKey(u64);

impl PriceKey {
    pub(crate) fn new(price: f64) -> Self {
        Self(price.to_bits())
    }

    pub(crate) fn price(self) -> f64 {
        f64::from_bits(self.0)
    }
}

/// Aggregated view of one price level, best for depth queries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelSnapshot {
    pub price: f64,
    /// Sum of resting remainders at this price
    pub quantity: u32,
    /// Resting orders, head (earliest) first
    pub orders: Vec<Order>,
}

impl LevelSnapshot {
    pub(crate) fn from_level(level: &PriceLevel) -> Self {
        Self {
            price: level.price(),
            quantity: level.total_quantity(),
            orders: level.orders().cloned().collect(),
        }
    }
}

/// Callback fired on observable best-price changes: (symbol, bid, ask)
pub type PriceUpdateCallback = Box<dyn Fn(&str, f64, f64) + Send + Sync>;

type SharedPriceCallback = Arc<dyn Fn(&str, f64, f64) + Send + Sync>;

/// Mutable book state guarded by the book lock
#[derive(Debug, Default)]
pub(crate) struct BookState {
    pub(crate) bids: BidBook,
    pub(crate) asks: AskBook,
    pub(crate) best_bid: f64,
    pub(crate) best_ask: f64,
    pub(crate) last_price: f64,
    pub(crate) sequence_number: u64,
}

impl BookState {
    /// Insert a resting order on its side.
    ///
    /// Orders arriving without an id (direct adds) get the next book-local
    /// sequence id; engine-stamped ids are preserved so cancels by engine id
    /// keep working. The sequence number advances either way, acting as a
    /// book revision counter.
    pub(crate) fn insert(&mut self, mut order: Order) -> u64 {
        self.sequence_number += 1;
        if order.id == 0 {
            order.id = self.sequence_number;
        }
        let id = order.id;
        match order.side {
            Side::Buy => self.bids.insert(order),
            Side::Sell => self.asks.insert(order),
        }
        id
    }

    /// Remove a resting order by id from either side
    pub(crate) fn remove(&mut self, order_id: u64) -> Option<Order> {
        self.bids
            .remove_by_id(order_id)
            .or_else(|| self.asks.remove_by_id(order_id))
    }

    /// Best prices when the book is crossed, None otherwise
    pub(crate) fn crossed_pair(&self) -> Option<(f64, f64)> {
        let bid = self.bids.best_price()?;
        let ask = self.asks.best_price()?;
        crossing::can_match(bid, ask).then_some((bid, ask))
    }

    /// Recompute cached best prices; refresh last price from the touch
    /// when both sides are populated.
    pub(crate) fn refresh_best(&mut self) {
        self.best_bid = self.bids.best_price().unwrap_or(0.0);
        self.best_ask = self.asks.best_price().unwrap_or(0.0);
        if self.best_bid > 0.0 && self.best_ask > 0.0 {
            self.last_price = (self.best_bid + self.best_ask) / 2.0;
        }
    }
}

/// Per-symbol limit order book with price-time priority
pub struct OrderBook {
    symbol: String,
    state: Mutex<BookState>,
    price_callback: Mutex<Option<SharedPriceCallback>>,
}

impl OrderBook {
    /// Create an empty book for a symbol
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            state: Mutex::new(BookState::default()),
            price_callback: Mutex::new(None),
        }
    }

    /// Symbol this book trades
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Rest an order at the tail of its price level.
    ///
    /// Does not cross against the opposite side; crossing is the engine's
    /// responsibility. Returns the (possibly book-assigned) order id.
    pub fn add_order(&self, order: Order) -> u64 {
        let (id, change) = {
            let mut state = self.state.lock();
            let before = (state.best_bid, state.best_ask);
            let id = state.insert(order);
            state.refresh_best();
            (id, self.price_change(&state, before))
        };
        self.emit_price_update(change);
        id
    }

    /// Cancel a resting order. No-op when the id is absent.
    pub fn cancel_order(&self, order_id: u64) -> bool {
        self.remove_order(order_id).is_some()
    }

    /// Remove a resting order, returning it for status fanout
    pub(crate) fn remove_order(&self, order_id: u64) -> Option<Order> {
        let (removed, change) = {
            let mut state = self.state.lock();
            let before = (state.best_bid, state.best_ask);
            let removed = state.remove(order_id);
            state.refresh_best();
            (removed, self.price_change(&state, before))
        };
        self.emit_price_update(change);
        removed
    }

    /// Cancel-and-replace: the replacement goes to the tail of its new
    /// level, losing time priority even at the same price.
    pub fn modify_order(&self, order_id: u64, new_price: f64, new_quantity: u32) -> bool {
        let (found, change) = {
            let mut state = self.state.lock();
            let before = (state.best_bid, state.best_ask);
            let found = match state.remove(order_id) {
                Some(mut order) => {
                    order.price = new_price;
                    order.quantity = new_quantity;
                    order.filled_quantity = order.filled_quantity.min(new_quantity);
                    if !order.is_filled() {
                        state.insert(order);
                    }
                    true
                }
                None => false,
            };
            state.refresh_best();
            (found, self.price_change(&state, before))
        };
        self.emit_price_update(change);
        found
    }

    /// Best bid, 0 when the bid side is empty
    pub fn best_bid(&self) -> f64 {
        self.state.lock().best_bid
    }

    /// Best ask, 0 when the ask side is empty
    pub fn best_ask(&self) -> f64 {
        self.state.lock().best_ask
    }

    /// Midpoint of the touch, falling back to the last price
    pub fn mid_price(&self) -> f64 {
        let state = self.state.lock();
        if state.best_bid > 0.0 && state.best_ask > 0.0 {
            (state.best_bid + state.best_ask) / 2.0
        } else {
            state.last_price
        }
    }

    /// Best ask minus best bid, 0 unless both sides are populated
    pub fn spread(&self) -> f64 {
        let state = self.state.lock();
        if state.best_bid > 0.0 && state.best_ask > 0.0 {
            state.best_ask - state.best_bid
        } else {
            0.0
        }
    }

    /// Last traded / seeded reference price
    pub fn last_price(&self) -> f64 {
        self.state.lock().last_price
    }

    /// Snapshot of up to `depth` bid levels, best first
    pub fn bid_levels(&self, depth: usize) -> Vec<LevelSnapshot> {
        self.state.lock().bids.depth_snapshot(depth)
    }

    /// Snapshot of up to `depth` ask levels, best first
    pub fn ask_levels(&self, depth: usize) -> Vec<LevelSnapshot> {
        self.state.lock().asks.depth_snapshot(depth)
    }

    /// Administrative: seed the reference price and refresh quote caches
    pub fn set_last_price(&self, price: f64) {
        let (bid, ask) = {
            let mut state = self.state.lock();
            state.last_price = price;
            state.refresh_best();
            (state.best_bid, state.best_ask)
        };
        self.emit_price_update(Some((bid, ask)));
    }

    /// Empty both sides and zero the quote caches
    pub fn clear_book(&self) {
        let change = {
            let mut state = self.state.lock();
            let before = (state.best_bid, state.best_ask);
            state.bids.clear();
            state.asks.clear();
            state.refresh_best();
            self.price_change(&state, before)
        };
        self.emit_price_update(change);
    }

    /// Register the price-update notifier, replacing any previous one
    pub fn set_price_update_callback(&self, callback: PriceUpdateCallback) {
        *self.price_callback.lock() = Some(Arc::from(callback));
    }

    /// Exclusive access to book state for the matching worker
    pub(crate) fn lock_state(&self) -> MutexGuard<'_, BookState> {
        self.state.lock()
    }

    /// Compare cached best prices against a prior reading
    pub(crate) fn price_change(
        &self,
        state: &BookState,
        before: (f64, f64),
    ) -> Option<(f64, f64)> {
        let after = (state.best_bid, state.best_ask);
        (after != before).then_some(after)
    }

    /// Fire the price callback with no lock held — the handle is cloned
    /// out first so a subscriber may mutate this book re-entrantly
    pub(crate) fn emit_price_update(&self, change: Option<(f64, f64)>) {
        let Some((bid, ask)) = change else { return };
        let callback = self.price_callback.lock().clone();
        if let Some(callback) = callback {
            events::run_isolated("price_update", || callback(&self.symbol, bid, ask));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use types::order::{Order, Side};

    fn limit(side: Side, price: f64, quantity: u32) -> Order {
        Order::limit("AAPL", side, price, quantity, "t1")
    }

    #[test]
    fn test_price_key_orders_like_f64() {
        let prices = [0.01, 1.0, 99.99, 100.0, 100.01, 150.5, 10_000.0];
        for pair in prices.windows(2) {
            assert!(PriceKey::new(pair[0]) < PriceKey::new(pair[1]));
        }
        assert_eq!(PriceKey::new(150.5).price(), 150.5);
    }

    #[test]
    fn test_add_updates_best_prices() {
        let book = OrderBook::new("AAPL");
        book.add_order(limit(Side::Buy, 149.5, 100));
        book.add_order(limit(Side::Sell, 150.5, 100));

        assert_eq!(book.best_bid(), 149.5);
        assert_eq!(book.best_ask(), 150.5);
        assert_eq!(book.mid_price(), 150.0);
        assert_eq!(book.spread(), 1.0);
    }

    #[test]
    fn test_empty_book_queries() {
        let book = OrderBook::new("AAPL");
        assert_eq!(book.best_bid(), 0.0);
        assert_eq!(book.best_ask(), 0.0);
        assert_eq!(book.spread(), 0.0);
        assert_eq!(book.mid_price(), 0.0); // falls back to last_price
    }

    #[test]
    fn test_mid_price_falls_back_to_last() {
        let book = OrderBook::new("AAPL");
        book.set_last_price(150.0);
        assert_eq!(book.mid_price(), 150.0);
    }

    #[test]
    fn test_direct_add_stamps_book_local_id() {
        let book = OrderBook::new("AAPL");
        let first = book.add_order(limit(Side::Buy, 149.0, 10));
        let second = book.add_order(limit(Side::Buy, 149.0, 10));
        assert!(first > 0);
        assert!(second > first);
    }

    #[test]
    fn test_engine_stamped_id_is_preserved() {
        let book = OrderBook::new("AAPL");
        let mut order = limit(Side::Buy, 149.0, 10);
        order.id = 777;
        assert_eq!(book.add_order(order), 777);
        assert!(book.cancel_order(777));
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let book = OrderBook::new("AAPL");
        let id = book.add_order(limit(Side::Buy, 149.0, 10));

        assert!(book.cancel_order(id));
        assert!(!book.cancel_order(id));
        assert_eq!(book.best_bid(), 0.0);
    }

    #[test]
    fn test_cancel_keeps_level_order() {
        let book = OrderBook::new("AAPL");
        let a = book.add_order(limit(Side::Sell, 150.0, 10));
        let b = book.add_order(limit(Side::Sell, 150.0, 20));
        let c = book.add_order(limit(Side::Sell, 150.0, 30));

        assert!(book.cancel_order(b));

        let levels = book.ask_levels(1);
        let ids: Vec<u64> = levels[0].orders.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![a, c]);
        assert_eq!(levels[0].quantity, 40);
    }

    #[test]
    fn test_modify_moves_to_tail() {
        let book = OrderBook::new("AAPL");
        let a = book.add_order(limit(Side::Buy, 150.0, 10));
        let b = book.add_order(limit(Side::Buy, 150.0, 20));

        // Same price, same quantity: still loses time priority
        assert!(book.modify_order(a, 150.0, 10));

        let levels = book.bid_levels(1);
        let ids: Vec<u64> = levels[0].orders.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![b, a]);
    }

    #[test]
    fn test_modify_changes_price_level() {
        let book = OrderBook::new("AAPL");
        let id = book.add_order(limit(Side::Buy, 150.0, 10));

        assert!(book.modify_order(id, 151.0, 25));
        assert_eq!(book.best_bid(), 151.0);

        let levels = book.bid_levels(1);
        assert_eq!(levels[0].quantity, 25);
    }

    #[test]
    fn test_modify_unknown_returns_false() {
        let book = OrderBook::new("AAPL");
        assert!(!book.modify_order(404, 150.0, 10));
    }

    #[test]
    fn test_clear_book_zeroes_caches() {
        let book = OrderBook::new("AAPL");
        book.add_order(limit(Side::Buy, 149.0, 10));
        book.add_order(limit(Side::Sell, 151.0, 10));

        book.clear_book();
        assert_eq!(book.best_bid(), 0.0);
        assert_eq!(book.best_ask(), 0.0);
        assert!(book.bid_levels(10).is_empty());
        assert!(book.ask_levels(10).is_empty());
    }

    #[test]
    fn test_price_callback_fires_on_best_change_only() {
        let book = OrderBook::new("AAPL");
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        book.set_price_update_callback(Box::new(move |_, _, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        book.add_order(limit(Side::Buy, 149.0, 10)); // best bid changes
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        book.add_order(limit(Side::Buy, 148.0, 10)); // behind the best: no change
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        book.add_order(limit(Side::Buy, 150.0, 10)); // new best
        assert_eq!(fired.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_callback_can_reenter_book() {
        // A subscriber that reads the book back must not deadlock
        let book = Arc::new(OrderBook::new("AAPL"));
        let reentrant = Arc::clone(&book);
        let observed = Arc::new(AtomicUsize::new(0));
        let sink = Arc::clone(&observed);
        book.set_price_update_callback(Box::new(move |_, _, _| {
            let _ = reentrant.best_bid();
            sink.fetch_add(1, Ordering::SeqCst);
        }));

        book.add_order(limit(Side::Buy, 149.0, 10));
        assert_eq!(observed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_level_quantity_matches_order_remainders() {
        let book = OrderBook::new("AAPL");
        book.add_order(limit(Side::Sell, 150.0, 10));
        book.add_order(limit(Side::Sell, 150.0, 25));
        book.add_order(limit(Side::Sell, 151.0, 40));

        for level in book.ask_levels(10) {
            let sum: u32 = level.orders.iter().map(|o| o.remaining()).sum();
            assert_eq!(level.quantity, sum);
            assert!(level.quantity > 0);
        }
    }
}
