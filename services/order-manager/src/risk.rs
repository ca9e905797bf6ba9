//! Pre-trade risk validation
//!
//! Pure functions over the current position, limits, and daily PnL.
//! Checks run in order and return the first failure; the manager maps any
//! failure to a returned order id of 0 plus an optional risk alert.

use types::order::{Order, OrderType, Side};
use types::position::Position;
use types::risk::{RiskLimits, RiskViolation};

/// Validate an incoming order against all risk checks.
///
/// Checks performed (in order):
/// 1. Basic validity: symbol, quantity, price
/// 2. Per-order size limit
/// 3. Projected position within the size cap
/// 4. Order notional within the position-value limit
/// 5. Daily loss floor not breached
pub fn validate_order(
    order: &Order,
    position: &Position,
    limits: &RiskLimits,
    daily_pnl: f64,
) -> Result<(), RiskViolation> {
    validate_shape(order)?;

    if order.quantity > limits.max_order_size {
        return Err(RiskViolation::OrderTooLarge {
            limit: limits.max_order_size,
            requested: order.quantity,
        });
    }

    let projected = projected_position(position.quantity, order.side, order.quantity);
    if projected.unsigned_abs() > u64::from(limits.max_order_size) {
        return Err(RiskViolation::PositionLimitExceeded {
            limit: limits.max_order_size,
            projected,
        });
    }

    let notional = order.price * f64::from(order.quantity);
    if notional > limits.max_position_value {
        return Err(RiskViolation::NotionalLimitExceeded {
            limit: limits.max_position_value,
            notional,
        });
    }

    if daily_pnl <= -limits.max_daily_loss {
        return Err(RiskViolation::DailyLossBreached {
            limit: limits.max_daily_loss,
            daily_pnl,
        });
    }

    Ok(())
}

/// Structural checks that do not depend on account state
fn validate_shape(order: &Order) -> Result<(), RiskViolation> {
    if order.symbol.is_empty() {
        return Err(RiskViolation::EmptySymbol);
    }
    if order.quantity == 0 {
        return Err(RiskViolation::InvalidQuantity(0));
    }
    match order.order_type {
        OrderType::Limit | OrderType::StopLimit => {
            if !order.price.is_finite() || order.price < 0.0 {
                return Err(RiskViolation::InvalidPrice(order.price));
            }
        }
        OrderType::Market | OrderType::Stop => {}
    }
    Ok(())
}

/// Signed position after the order would fully fill
fn projected_position(current: i64, side: Side, quantity: u32) -> i64 {
    match side {
        Side::Buy => current + i64::from(quantity),
        Side::Sell => current - i64::from(quantity),
    }
}
