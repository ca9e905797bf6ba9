//! Synthetic feed worker
//!
//! Each tick perturbs every symbol's reference price by a bounded random
//! factor and, with configured probability, submits a limit order near the
//! new price through the order manager. Seeding a symbol plants an initial
//! bid/ask pair directly on the book so mid-price queries work from the
//! first tick.
//!
//! `step()` advances exactly one tick synchronously; `start()` runs the
//! same step on a background thread at the configured interval. Two feeds
//! built with the same seed generate identical order flow.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use parking_lot::Mutex;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use order_manager::OrderManager;
use types::order::{Order, Side};

/// Configuration for the synthetic feed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Wall-clock delay between ticks in threaded mode
    pub tick_interval: Duration,
    /// Maximum fractional price move per tick (e.g. 0.001 = 10 bps)
    pub volatility: f64,
    /// Probability of emitting an order per symbol per tick
    pub order_probability: f64,
    pub min_order_size: u32,
    pub max_order_size: u32,
    /// RNG seed; equal seeds produce equal flow
    pub seed: u64,
    /// Trader id stamped on synthetic flow
    pub trader_id: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(100),
            volatility: 0.001,
            order_probability: 0.3,
            min_order_size: 100,
            max_order_size: 1_000,
            seed: 42,
            trader_id: "feed".to_string(),
        }
    }
}

struct FeedState {
    rng: ChaCha8Rng,
    reference_prices: HashMap<String, f64>,
}

/// Random-walk order-flow generator over the manager's symbols
pub struct MarketDataFeed {
    manager: Arc<OrderManager>,
    config: FeedConfig,
    state: Arc<Mutex<FeedState>>,
    running: Arc<AtomicBool>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl MarketDataFeed {
    pub fn new(manager: Arc<OrderManager>, config: FeedConfig) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Self {
            manager,
            config,
            state: Arc::new(Mutex::new(FeedState {
                rng,
                reference_prices: HashMap::new(),
            })),
            running: Arc::new(AtomicBool::new(false)),
            worker: Mutex::new(None),
        }
    }

    /// Register a symbol and seed resting liquidity around the initial
    /// price: one bid at the price, one ask a cent above.
    pub fn add_symbol(&self, symbol: &str, initial_price: f64) {
        self.manager.add_symbol(symbol);

        if let Ok(book) = self.manager.get_order_book(symbol) {
            book.set_last_price(initial_price);
            book.add_order(Order::limit(
                symbol,
                Side::Buy,
                round_to_cents(initial_price),
                1_000,
                &self.config.trader_id,
            ));
            book.add_order(Order::limit(
                symbol,
                Side::Sell,
                round_to_cents(initial_price + 0.01),
                1_000,
                &self.config.trader_id,
            ));
        }

        self.state
            .lock()
            .reference_prices
            .insert(symbol.to_string(), initial_price);
        info!(symbol, initial_price, "feed symbol seeded");
    }

    /// Advance one tick synchronously: perturb every reference price and
    /// maybe emit an order per symbol.
    pub fn step(&self) {
        Self::step_inner(&self.manager, &self.config, &self.state);
    }

    fn step_inner(manager: &OrderManager, config: &FeedConfig, state: &Mutex<FeedState>) {
        // Draw everything under the lock, submit after releasing it
        let orders: Vec<Order> = {
            let mut state = state.lock();
            let mut symbols: Vec<String> = state.reference_prices.keys().cloned().collect();
            symbols.sort(); // deterministic draw order

            let mut pending = Vec::new();
            for symbol in symbols {
                let drift: f64 = state
                    .rng
                    .gen_range(-config.volatility..=config.volatility);
                let price = {
                    let reference = state.reference_prices.get_mut(&symbol);
                    let Some(reference) = reference else { continue };
                    *reference *= 1.0 + drift;
                    *reference
                };

                if state.rng.gen_bool(config.order_probability) {
                    let side = if state.rng.gen_bool(0.5) {
                        Side::Buy
                    } else {
                        Side::Sell
                    };
                    let quantity = state
                        .rng
                        .gen_range(config.min_order_size..=config.max_order_size);
                    pending.push(Order::limit(
                        &symbol,
                        side,
                        round_to_cents(price),
                        quantity,
                        &config.trader_id,
                    ));
                }
            }
            pending
        };

        for order in orders {
            let symbol = order.symbol.clone();
            if manager.place_order(order) == 0 {
                debug!(symbol = %symbol, "synthetic order rejected");
            }
        }
    }

    /// Spawn the feed thread. Idempotent.
    pub fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }

        let manager = Arc::clone(&self.manager);
        let config = self.config.clone();
        let state = Arc::clone(&self.state);
        let running = Arc::clone(&self.running);

        let handle = std::thread::Builder::new()
            .name("market-data-feed".to_string())
            .spawn(move || {
                while running.load(Ordering::SeqCst) {
                    Self::step_inner(&manager, &config, &state);
                    std::thread::sleep(config.tick_interval);
                }
            })
            .expect("failed to spawn feed thread");
        *self.worker.lock() = Some(handle);
        info!("market data feed started");
    }

    /// Stop and join the feed thread. Idempotent.
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Some(handle) = self.worker.lock().take() {
            let _ = handle.join();
        }
        info!("market data feed stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Current reference price for a symbol
    pub fn reference_price(&self, symbol: &str) -> Option<f64> {
        self.state.lock().reference_prices.get(symbol).copied()
    }
}

impl Drop for MarketDataFeed {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Clamp sub-tick noise: quote prices land on whole cents
fn round_to_cents(price: f64) -> f64 {
    (price * 100.0).round() / 100.0
}
