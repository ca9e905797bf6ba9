//! Market Data Service
//!
//! Synthetic market-data generator: perturbs each symbol's reference price
//! with a bounded random walk and pushes limit order flow through the order
//! manager, giving strategies a moving market to trade against.
//!
//! All randomness comes from a per-instance seeded generator, so a run is
//! reproducible from its seed — there is no global RNG state anywhere.

pub mod feed;

pub use feed::{FeedConfig, MarketDataFeed};
