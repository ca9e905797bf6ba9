//! Risk limits and rejection taxonomy
//!
//! Limits are owned by the order manager and replaced atomically via
//! `set_risk_limits`; every pre-trade check reads the current set.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Pre-trade risk limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskLimits {
    /// Maximum quantity of a single order; also caps the projected position
    pub max_order_size: u32,
    /// Maximum notional value of a single order
    pub max_position_value: f64,
    /// Daily loss floor: submissions stop once daily PnL ≤ −max_daily_loss
    pub max_daily_loss: f64,
    /// Peak-to-trough equity decline tolerated, as a fraction
    pub max_drawdown: f64,
    pub max_leverage: f64,
}

impl Default for RiskLimits {
    fn default() -> Self {
        Self {
            max_order_size: 10_000,
            max_position_value: 1_000_000.0,
            max_daily_loss: 50_000.0,
            max_drawdown: 0.1,
            max_leverage: 2.0,
        }
    }
}

/// Reason a submission was rejected before reaching the engine
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum RiskViolation {
    #[error("empty symbol")]
    EmptySymbol,

    #[error("invalid quantity: {0}")]
    InvalidQuantity(u32),

    #[error("invalid price: {0}")]
    InvalidPrice(f64),

    #[error("order size {requested} exceeds limit {limit}")]
    OrderTooLarge { limit: u32, requested: u32 },

    #[error("projected position {projected} exceeds limit {limit}")]
    PositionLimitExceeded { limit: u32, projected: i64 },

    #[error("order notional {notional:.2} exceeds limit {limit:.2}")]
    NotionalLimitExceeded { limit: f64, notional: f64 },

    #[error("daily loss limit breached: daily pnl {daily_pnl:.2}, floor -{limit:.2}")]
    DailyLossBreached { limit: f64, daily_pnl: f64 },
}
