//! Ask (sell-side) order book
//!
//! Maintains sell orders sorted by price ascending (best ask first).
//! Uses BTreeMap keyed by `PriceKey`; the best ask is the first key in
//! ascending map order.

use std::collections::BTreeMap;
use types::order::Order;

use super::price_level::PriceLevel;
use super::{LevelSnapshot, PriceKey};

/// Ask (sell) side order book
///
/// Orders are sorted by price ascending, so the lowest ask is first.
/// At each price level, orders are maintained in FIFO order.
#[derive(Debug, Clone, Default)]
pub struct AskBook {
    levels: BTreeMap<PriceKey, PriceLevel>,
}

impl AskBook {
    /// Create a new empty ask book
    pub fn new() -> Self {
        Self {
            levels: BTreeMap::new(),
        }
    }

    /// Insert an order at the tail of its price level
    pub fn insert(&mut self, order: Order) {
        let key = PriceKey::new(order.price);
        self.levels
            .entry(key)
            .or_insert_with(|| PriceLevel::new(order.price))
            .push_back(order);
    }

    /// Remove an order by id, scanning levels best-first
    pub fn remove_by_id(&mut self, order_id: u64) -> Option<Order> {
        let mut hit = None;
        for (key, level) in self.levels.iter_mut() {
            if let Some(order) = level.remove(order_id) {
                hit = Some((*key, order));
                break;
            }
        }
        let (key, order) = hit?;
        if self.levels.get(&key).is_some_and(|l| l.is_empty()) {
            self.levels.remove(&key);
        }
        Some(order)
    }

    /// Best ask (lowest price), or None when empty
    pub fn best_price(&self) -> Option<f64> {
        self.levels.keys().next().map(|k| k.price())
    }

    /// Remaining quantity of the earliest order at the best level
    pub fn best_front_remaining(&self) -> Option<u32> {
        self.levels
            .values()
            .next()
            .and_then(|level| level.front().map(|o| o.remaining()))
    }

    /// Fill the head of the best level, dropping the level when emptied.
    ///
    /// Returns a snapshot of the head order after the fill.
    pub fn fill_best(&mut self, quantity: u32) -> Option<Order> {
        let (key, level) = self.levels.iter_mut().next()?;
        let key = *key;
        let snapshot = level.fill_front(quantity)?;
        if level.is_empty() {
            self.levels.remove(&key);
        }
        Some(snapshot)
    }

    /// Depth snapshot: top `depth` levels, best price first
    pub fn depth_snapshot(&self, depth: usize) -> Vec<LevelSnapshot> {
        self.levels
            .values()
            .take(depth)
            .map(LevelSnapshot::from_level)
            .collect()
    }

    /// Check if the ask book is empty
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Number of populated price levels
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Remove every level
    pub fn clear(&mut self) {
        self.levels.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::order::{Order, Side};

    fn ask(id: u64, price: f64, quantity: u32) -> Order {
        let mut order = Order::limit("AAPL", Side::Sell, price, quantity, "t1");
        order.id = id;
        order
    }

    #[test]
    fn test_best_ask_is_lowest_price() {
        let mut book = AskBook::new();
        book.insert(ask(1, 151.0, 10));
        book.insert(ask(2, 150.0, 20));
        book.insert(ask(3, 152.0, 15));

        assert_eq!(book.best_price(), Some(150.0));
        assert_eq!(book.best_front_remaining(), Some(20));
    }

    #[test]
    fn test_depth_snapshot_best_first() {
        let mut book = AskBook::new();
        book.insert(ask(1, 151.0, 10));
        book.insert(ask(2, 150.0, 20));
        book.insert(ask(3, 152.0, 15));

        let depth = book.depth_snapshot(2);
        assert_eq!(depth.len(), 2);
        assert_eq!(depth[0].price, 150.0);
        assert_eq!(depth[1].price, 151.0);
    }

    #[test]
    fn test_fill_best_walks_upward() {
        let mut book = AskBook::new();
        book.insert(ask(1, 101.0, 10));
        book.insert(ask(2, 102.0, 30));

        let first = book.fill_best(10).unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(book.best_price(), Some(102.0));
    }

    #[test]
    fn test_remove_drops_empty_level() {
        let mut book = AskBook::new();
        book.insert(ask(1, 150.0, 10));
        book.insert(ask(2, 151.0, 10));

        assert!(book.remove_by_id(1).is_some());
        assert_eq!(book.level_count(), 1);
        assert_eq!(book.best_price(), Some(151.0));
    }
}
