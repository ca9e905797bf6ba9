//! Matching Engine Service
//!
//! Order matching core for the simulator: one limit order book per symbol
//! under price-time priority, a single matching worker that serializes all
//! submitted intents, and execution/order-status fanout to subscribers.
//!
//! **Key invariants:**
//! - Price-time priority strictly enforced (best price, then FIFO)
//! - No crossed book once a matching cycle completes
//! - Order ids and execution ids strictly increasing
//! - Level totals equal the sum of resting remainders
//! - Callbacks always dispatched with no core lock held

pub mod book;
pub mod clock;
pub mod engine;
pub mod events;
pub mod matching;

pub use book::{LevelSnapshot, OrderBook};
pub use engine::{EngineStats, MatchingEngine};
pub use events::SubscriptionId;
