//! Simulation framework
//!
//! Wires the order manager, the synthetic feed, and strategy bots into a
//! runnable trading session.
//!
//! # Modules
//! - `strategy` — Subscriber capability set strategies implement
//! - `bots` — Market maker and momentum strategies
//! - `metrics` — Session counters
//! - `session` — Orchestrator tying the pieces together

pub mod bots;
pub mod metrics;
pub mod session;
pub mod strategy;

pub use session::{SessionConfig, TradingSession};
pub use strategy::Strategy;
