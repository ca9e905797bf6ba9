//! Execution records
//!
//! One `Execution` is emitted per successful crossing. Records are tagged
//! with the taker — the incoming order that consumed resting liquidity —
//! and are never mutated after creation.

use crate::order::Side;
use serde::{Deserialize, Serialize};

/// A single fill produced by the matching engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Execution {
    /// Monotonic id, strictly increasing per engine
    pub execution_id: u64,
    /// Id of the taker order
    pub order_id: u64,
    pub symbol: String,
    /// Taker side
    pub side: Side,
    pub price: f64,
    pub quantity: u32,
    /// Nanoseconds on the engine's monotonic clock
    pub timestamp: u64,
    /// Trader that owns the taker order
    pub trader_id: String,
}

impl Execution {
    /// Traded value (price × quantity)
    pub fn notional(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }
}
