//! Strategy capability set
//!
//! A strategy is a client of the order manager: it consumes market-data and
//! execution callbacks and submits orders back through the manager it was
//! constructed with. The session owns strategies and drives these hooks;
//! both may be called from the matching worker thread, with no core lock
//! held, so handlers are free to place, cancel, or modify orders inline.

use types::execution::Execution;

/// Subscriber interface the session routes callbacks through
pub trait Strategy: Send {
    /// Display name for logs and metrics
    fn name(&self) -> &str;

    /// Trader id this strategy submits under; executions whose taker
    /// matches this id are routed to `on_execution`
    fn trader_id(&self) -> &str;

    /// Best bid/ask changed for a symbol
    fn on_market_data(&mut self, symbol: &str, bid: f64, ask: f64);

    /// One of this strategy's orders took liquidity
    fn on_execution(&mut self, execution: &Execution);
}
