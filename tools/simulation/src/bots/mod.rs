//! Strategy bot implementations
//!
//! Contains the market maker and momentum strategies.

pub mod market_maker;
pub mod momentum;

pub use market_maker::{MarketMaker, MarketMakerConfig};
pub use momentum::{Momentum, MomentumConfig};
