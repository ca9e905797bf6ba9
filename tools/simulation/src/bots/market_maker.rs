//! Market maker strategy — spread quoting with inventory management
//!
//! Quotes both sides of the touch around the mid price. Every market-data
//! tick the old quotes are cancelled and replaced; inventory accumulated
//! through taker fills skews which side keeps quoting so the bot drifts
//! back toward flat.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use order_manager::OrderManager;
use types::execution::Execution;
use types::order::{Order, Side};

use crate::strategy::Strategy;

/// Configuration for the market maker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketMakerConfig {
    /// Fraction of the observed spread to quote inside (1.0 = match it)
    pub spread_multiplier: f64,
    /// Floor for the quoted spread
    pub min_spread: f64,
    /// Size of each quote
    pub base_quantity: u32,
    /// Absolute net inventory at which a side stops quoting
    pub max_inventory: i64,
}

impl Default for MarketMakerConfig {
    fn default() -> Self {
        Self {
            spread_multiplier: 0.5,
            min_spread: 0.02,
            base_quantity: 100,
            max_inventory: 1_000,
        }
    }
}

/// Two-sided quoting bot
pub struct MarketMaker {
    name: String,
    trader_id: String,
    manager: Arc<OrderManager>,
    config: MarketMakerConfig,
    /// symbol → (bid order id, ask order id) currently working
    active_quotes: HashMap<String, (u64, u64)>,
    net_inventory: i64,
}

impl MarketMaker {
    pub fn new(
        name: impl Into<String>,
        trader_id: impl Into<String>,
        manager: Arc<OrderManager>,
        config: MarketMakerConfig,
    ) -> Self {
        Self {
            name: name.into(),
            trader_id: trader_id.into(),
            manager,
            config,
            active_quotes: HashMap::new(),
            net_inventory: 0,
        }
    }

    /// Signed net inventory from taker fills
    pub fn net_inventory(&self) -> i64 {
        self.net_inventory
    }

    fn quoted_half_spread(&self, bid: f64, ask: f64) -> f64 {
        let observed = ask - bid;
        (observed * self.config.spread_multiplier).max(self.config.min_spread) / 2.0
    }

    fn cancel_stale_quotes(&mut self, symbol: &str) {
        if let Some((bid_id, ask_id)) = self.active_quotes.remove(symbol) {
            if bid_id != 0 {
                self.manager.cancel_order(bid_id, &self.trader_id);
            }
            if ask_id != 0 {
                self.manager.cancel_order(ask_id, &self.trader_id);
            }
        }
    }
}

impl Strategy for MarketMaker {
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

        self.cancel_stale_quotes(symbol);

        let mid = (bid + ask) / 2.0;
        let half = self.quoted_half_spread(bid, ask);

        let mut bid_id = 0;
        let mut ask_id = 0;

        // Long inventory silences the bid, short inventory the ask
        if self.net_inventory < self.config.max_inventory {
            bid_id = self.manager.place_order(Order::limit(
                symbol,
                Side::Buy,
                round_to_cents(mid - half),
                self.config.base_quantity,
                &self.trader_id,
            ));
        }
        if self.net_inventory > -self.config.max_inventory {
            ask_id = self.manager.place_order(Order::limit(
                symbol,
                Side::Sell,
                round_to_cents(mid + half),
                self.config.base_quantity,
                &self.trader_id,
            ));
        }

        if bid_id != 0 || ask_id != 0 {
            self.active_quotes
                .insert(symbol.to_string(), (bid_id, ask_id));
        }
    }

    fn on_execution(&mut self, execution: &Execution) {
        match execution.side {
            Side::Buy => self.net_inventory += i64::from(execution.quantity),
            Side::Sell => self.net_inventory -= i64::from(execution.quantity),
        }
        debug!(
            strategy = %self.name,
            inventory = self.net_inventory,
            "market maker fill"
        );
    }
}

fn round_to_cents(price: f64) -> f64 {
    (price * 100.0).round() / 100.0
}
