//! Execution construction with monotonic sequencing
//!
//! All executions for an engine flow through one factory so execution ids
//! are strictly increasing regardless of which cycle produced them.

use std::sync::atomic::{AtomicU64, Ordering};
use types::execution::Execution;
use types::order::Side;

/// Builds `Execution` records with a monotonic id sequence
#[derive(Debug, Default)]
pub struct ExecutionFactory {
    counter: AtomicU64,
}

impl ExecutionFactory {
    /// Create a factory; the first execution gets id 1
    pub fn new() -> Self {
        Self {
            counter: AtomicU64::new(0),
        }
    }

    /// Build the next execution, tagged with the taker order
    #[allow(clippy::too_many_arguments)]
    pub fn build(
        &self,
        symbol: &str,
        taker_order_id: u64,
        taker_side: Side,
        taker_trader_id: &str,
        price: f64,
        quantity: u32,
        timestamp: u64,
    ) -> Execution {
        let execution_id = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        Execution {
            execution_id,
            order_id: taker_order_id,
            symbol: symbol.to_string(),
            side: taker_side,
            price,
            quantity,
            timestamp,
            trader_id: taker_trader_id.to_string(),
        }
    }
}
