//! Momentum strategy — rolling-window trend following
//!
//! Keeps a rolling window of mid prices per symbol. When the move across
//! the window breaks the threshold, the bot sends a market order in the
//! direction of the move and resets the window, so each signal fires once.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use order_manager::OrderManager;
use types::execution::Execution;
use types::order::{Order, Side};

use crate::strategy::Strategy;

/// Configuration for the momentum strategy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MomentumConfig {
    /// Mid prices per signal window
    pub window: usize,
    /// Fractional move across the window that triggers an order
    pub threshold: f64,
    /// Market order size per signal
    pub order_quantity: u32,
}

impl Default for MomentumConfig {
    fn default() -> Self {
        Self {
            window: 10,
            threshold: 0.002,
            order_quantity: 100,
        }
    }
}

/// Trend-following bot firing market orders on threshold breaks
pub struct Momentum {
    name: String,
    trader_id: String,
    manager: Arc<OrderManager>,
    config: MomentumConfig,
    history: HashMap<String, VecDeque<f64>>,
    signals_fired: u64,
    fills_seen: u64,
}

impl Momentum {
    pub fn new(
        name: impl Into<String>,
        trader_id: impl Into<String>,
        manager: Arc<OrderManager>,
        config: MomentumConfig,
    ) -> Self {
        Self {
            name: name.into(),
            trader_id: trader_id.into(),
            manager,
            config,
            history: HashMap::new(),
            signals_fired: 0,
            fills_seen: 0,
        }
    }

    pub fn signals_fired(&self) -> u64 {
        self.signals_fired
    }

    pub fn fills_seen(&self) -> u64 {
        self.fills_seen
    }

    /// Return across the full window, or None until it is warm
    fn window_return(&self, symbol: &str) -> Option<f64> {
        let history = self.history.get(symbol)?;
        if history.len() < self.config.window {
            return None;
        }
        let first = *history.front()?;
        let last = *history.back()?;
        if first <= 0.0 {
            return None;
        }
        Some((last - first) / first)
    }
}

impl Strategy for Momentum {
    fn name(&self) -> &str {
        &self.name
    }

    fn trader_id(&self) -> &str {
        &self.trader_id
    }

    fn on_market_data(&mut self, symbol: &str, bid: f64, ask: f64) {
        if bid <= 0.0 || ask <= 0.0 {
            return;
        }
        let mid = (bid + ask) / 2.0;

        let history = self.history.entry(symbol.to_string()).or_default();
        history.push_back(mid);
        while history.len() > self.config.window {
            history.pop_front();
        }

        let Some(window_return) = self.window_return(symbol) else {
            return;
        };

        let side = if window_return > self.config.threshold {
            Side::Buy
        } else if window_return < -self.config.threshold {
            Side::Sell
        } else {
            return;
        };

        let id = self.manager.place_order(Order::market(
            symbol,
            side,
            self.config.order_quantity,
            &self.trader_id,
        ));
        if id != 0 {
            self.signals_fired += 1;
            debug!(
                strategy = %self.name,
                symbol,
                window_return,
                ?side,
                "momentum signal"
            );
        }

        // One shot per window: rebuild from scratch
        self.history.remove(symbol);
    }

    fn on_execution(&mut self, _execution: &Execution) {
        self.fills_seen += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const IDLE: Duration = Duration::from_secs(2);

    fn started_manager() -> Arc<OrderManager> {
        let manager = Arc::new(OrderManager::new());
        manager.add_symbol("AAPL");
        manager.start();
        manager
    }

    fn bot(manager: &Arc<OrderManager>, window: usize, threshold: f64) -> Momentum {
        Momentum::new(
            "momo",
            "momo-1",
            Arc::clone(manager),
            MomentumConfig {
                window,
                threshold,
                order_quantity: 50,
            },
        )
    }

    #[test]
    fn test_no_signal_until_window_warm() {
        let manager = started_manager();
        let mut momentum = bot(&manager, 5, 0.001);

        for i in 0..4 {
            let px = 150.0 + f64::from(i);
            momentum.on_market_data("AAPL", px - 0.05, px + 0.05);
        }
        assert_eq!(momentum.signals_fired(), 0);
    }

    #[test]
    fn test_uptrend_fires_buy() {
        let manager = started_manager();
        // Seed an ask for the market order to hit
        let book = manager.get_order_book("AAPL").unwrap();
        book.add_order(Order::limit("AAPL", Side::Sell, 160.0, 500, "seed"));

        let mut momentum = bot(&manager, 3, 0.001);
        momentum.on_market_data("AAPL", 150.0, 150.1);
        momentum.on_market_data("AAPL", 151.0, 151.1);
        momentum.on_market_data("AAPL", 152.0, 152.1);
        assert_eq!(momentum.signals_fired(), 1);
        assert!(manager.wait_until_idle(IDLE));

        // The market buy consumed part of the seeded ask
        assert_eq!(book.ask_levels(1)[0].quantity, 450);
    }

    #[test]
    fn test_downtrend_fires_sell() {
        let manager = started_manager();
        let book = manager.get_order_book("AAPL").unwrap();
        book.add_order(Order::limit("AAPL", Side::Buy, 140.0, 500, "seed"));

        let mut momentum = bot(&manager, 3, 0.001);
        momentum.on_market_data("AAPL", 152.0, 152.1);
        momentum.on_market_data("AAPL", 151.0, 151.1);
        momentum.on_market_data("AAPL", 150.0, 150.1);
        assert_eq!(momentum.signals_fired(), 1);
        assert!(manager.wait_until_idle(IDLE));

        assert_eq!(book.bid_levels(1)[0].quantity, 450);
    }

    #[test]
    fn test_flat_market_is_quiet() {
        let manager = started_manager();
        let mut momentum = bot(&manager, 3, 0.01);

        for _ in 0..10 {
            momentum.on_market_data("AAPL", 150.0, 150.1);
        }
        assert_eq!(momentum.signals_fired(), 0);
    }

    #[test]
    fn test_window_resets_after_signal() {
        let manager = started_manager();
        let book = manager.get_order_book("AAPL").unwrap();
        book.add_order(Order::limit("AAPL", Side::Sell, 160.0, 10_000, "seed"));

        let mut momentum = bot(&manager, 3, 0.001);
        momentum.on_market_data("AAPL", 150.0, 150.1);
        momentum.on_market_data("AAPL", 151.0, 151.1);
        momentum.on_market_data("AAPL", 152.0, 152.1);
        assert_eq!(momentum.signals_fired(), 1);

        // Window was cleared: the next two ticks are not enough on their own
        momentum.on_market_data("AAPL", 153.0, 153.1);
        momentum.on_market_data("AAPL", 154.0, 154.1);
        assert_eq!(momentum.signals_fired(), 1);
    }
}
