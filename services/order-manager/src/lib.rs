//! Order Manager Service
//!
//! Façade above the matching engine: every submission passes the pre-trade
//! risk gate first, executions flow back into positions and PnL, and
//! collaborators observe the stream through position / execution /
//! risk-alert callbacks.
//!
//! Rejections are surfaced by returning order id `0`; the engine is never
//! touched by an order that fails risk, so a rejected call leaves books,
//! positions, and the active-order index untouched.

pub mod events;
pub mod manager;
pub mod risk;

pub use manager::OrderManager;
