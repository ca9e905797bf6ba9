//! Trading session orchestrator
//!
//! Wires the order manager, the synthetic feed, and a set of strategies:
//! price updates fan out to every strategy, executions are routed to the
//! strategy whose trader id matches the taker, and rejections land in the
//! session metrics.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::info;

use market_data::{FeedConfig, MarketDataFeed};
use order_manager::OrderManager;

use crate::metrics::SessionMetrics;
use crate::strategy::Strategy;

/// Configuration for a session run
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Symbols to trade with their initial prices
    pub symbols: Vec<(String, f64)>,
    pub feed: FeedConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            symbols: vec![("AAPL".to_string(), 150.0)],
            feed: FeedConfig::default(),
        }
    }
}

/// Manager + feed + strategies, runnable stepwise or threaded
pub struct TradingSession {
    manager: Arc<OrderManager>,
    feed: MarketDataFeed,
    strategies: Arc<Mutex<Vec<Box<dyn Strategy>>>>,
    metrics: Arc<Mutex<SessionMetrics>>,
}

impl TradingSession {
    /// Build the session: seed symbols, register routing callbacks
    pub fn new(config: SessionConfig) -> Self {
        let manager = Arc::new(OrderManager::new());
        let feed = MarketDataFeed::new(Arc::clone(&manager), config.feed);
        let strategies: Arc<Mutex<Vec<Box<dyn Strategy>>>> = Arc::new(Mutex::new(Vec::new()));
        let metrics = Arc::new(Mutex::new(SessionMetrics::new()));

        for (symbol, initial_price) in &config.symbols {
            feed.add_symbol(symbol, *initial_price);
        }

        // Executions go to the owning strategy (taker trader id) and the
        // session counters
        let execution_strategies = Arc::clone(&strategies);
        let execution_metrics = Arc::clone(&metrics);
        manager.subscribe_executions(move |execution| {
            execution_metrics.lock().record_execution(execution);
            let mut strategies = execution_strategies.lock();
            for strategy in strategies.iter_mut() {
                if strategy.trader_id() == execution.trader_id {
                    strategy.on_execution(execution);
                }
            }
        });

        let rejection_metrics = Arc::clone(&metrics);
        manager.subscribe_risk_alerts(move |_| {
            rejection_metrics.lock().record_rejected();
        });

        // Best-price changes fan out to every strategy. A strategy's own
        // cancels re-fire this callback on the same thread while the list
        // is locked; those echoes are skipped instead of deadlocking.
        for (symbol, _) in &config.symbols {
            if let Ok(book) = manager.get_order_book(symbol) {
                let price_strategies = Arc::clone(&strategies);
                book.set_price_update_callback(Box::new(move |symbol, bid, ask| {
                    if let Some(mut strategies) = price_strategies.try_lock() {
                        for strategy in strategies.iter_mut() {
                            strategy.on_market_data(symbol, bid, ask);
                        }
                    }
                }));
            }
        }

        Self {
            manager,
            feed,
            strategies,
            metrics,
        }
    }

    /// Add a strategy to the routing table
    pub fn add_strategy(&self, strategy: Box<dyn Strategy>) {
        info!(name = strategy.name(), "strategy added");
        self.strategies.lock().push(strategy);
    }

    /// Deterministic mode: run `ticks` feed steps, settling the engine
    /// after each one.
    pub fn run(&self, ticks: u64) {
        self.manager.start();
        for _ in 0..ticks {
            self.feed.step();
            self.manager.wait_until_idle(Duration::from_secs(5));
        }
        info!(ticks, "session run complete");
    }

    /// Threaded mode: start the engine and the feed thread
    pub fn start(&self) {
        self.manager.start();
        self.feed.start();
    }

    /// Stop the feed, settle, stop the engine
    pub fn stop(&self) {
        self.feed.stop();
        self.manager.wait_until_idle(Duration::from_secs(5));
        self.manager.stop();
    }

    /// The manager this session trades through
    pub fn manager(&self) -> &Arc<OrderManager> {
        &self.manager
    }

    /// Session counters, with accepted orders taken from engine totals
    pub fn metrics(&self) -> SessionMetrics {
        let mut metrics = self.metrics.lock().clone();
        metrics.orders_accepted = self.manager.stats().total_orders;
        metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bots::{MarketMaker, MarketMakerConfig};

    #[test]
    fn test_session_builds_books() {
        let session = TradingSession::new(SessionConfig::default());
        let book = session.manager().get_order_book("AAPL").unwrap();
        assert!(book.best_bid() > 0.0);
        assert!(book.best_ask() > book.best_bid());
    }

    #[test]
    fn test_run_generates_flow() {
        let session = TradingSession::new(SessionConfig {
            feed: FeedConfig {
                order_probability: 1.0,
                ..FeedConfig::default()
            },
            ..SessionConfig::default()
        });
        session.run(20);

        let metrics = session.metrics();
        assert!(metrics.orders_accepted > 0, "{}", metrics.summary());
    }

    #[test]
    fn test_strategy_receives_market_data() {
        let session = TradingSession::new(SessionConfig {
            feed: FeedConfig {
                order_probability: 1.0,
                ..FeedConfig::default()
            },
            ..SessionConfig::default()
        });
        session.add_strategy(Box::new(MarketMaker::new(
            "mm",
            "mm-1",
            Arc::clone(session.manager()),
            MarketMakerConfig::default(),
        )));
        session.run(10);

        // The maker reacted to price updates by posting quotes
        assert!(!session.manager().get_active_orders("mm-1").is_empty());
    }
}
