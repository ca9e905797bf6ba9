//! Order lifecycle types
//!
//! Orders are created by callers with `id == 0`; the matching engine stamps
//! the id and timestamp at submission. Only the matching worker mutates an
//! order after that point.

use serde::{Deserialize, Serialize};

/// Order side (buyer or seller)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// Buy order (bid)
    Buy,
    /// Sell order (ask)
    Sell,
}

impl Side {
    /// Get the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// Order type
///
/// Stop and StopLimit orders carry a trigger semantics at the venue edge;
/// once released to the book they behave as Market and Limit respectively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    /// Execute immediately at best available prices
    Market,
    /// Execute only at the given price or better
    Limit,
    /// Market order armed at a trigger price
    Stop,
    /// Limit order armed at a trigger price
    StopLimit,
}

/// Order status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    /// Accepted and awaiting matching
    Pending,
    /// Partially matched
    Partial,
    /// Completely matched (terminal)
    Filled,
    /// Cancelled by the owner (terminal)
    Cancelled,
    /// Failed risk or validity checks (terminal)
    Rejected,
}

impl OrderStatus {
    /// Check if status is terminal (no further transitions possible)
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Cancelled | OrderStatus::Rejected
        )
    }
}

/// Complete order structure
///
/// `quantity` is the original size; `filled_quantity` grows toward it as the
/// order matches. `remaining()` is the live size resting on the book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Monotonic id assigned by the engine; 0 until submitted
    pub id: u64,
    pub symbol: String,
    pub side: Side,
    pub order_type: OrderType,
    /// Limit price; unused for Market orders
    pub price: f64,
    pub quantity: u32,
    pub filled_quantity: u32,
    pub status: OrderStatus,
    /// Nanoseconds on the engine's monotonic clock; 0 until submitted
    pub timestamp: u64,
    pub trader_id: String,
}

impl Order {
    /// Create a new pending order, not yet submitted
    pub fn new(
        symbol: impl Into<String>,
        side: Side,
        order_type: OrderType,
        price: f64,
        quantity: u32,
        trader_id: impl Into<String>,
    ) -> Self {
        Self {
            id: 0,
            symbol: symbol.into(),
            side,
            order_type,
            price,
            quantity,
            filled_quantity: 0,
            status: OrderStatus::Pending,
            timestamp: 0,
            trader_id: trader_id.into(),
        }
    }

    /// Convenience constructor for a limit order
    pub fn limit(
        symbol: impl Into<String>,
        side: Side,
        price: f64,
        quantity: u32,
        trader_id: impl Into<String>,
    ) -> Self {
        Self::new(symbol, side, OrderType::Limit, price, quantity, trader_id)
    }

    /// Convenience constructor for a market order
    pub fn market(
        symbol: impl Into<String>,
        side: Side,
        quantity: u32,
        trader_id: impl Into<String>,
    ) -> Self {
        Self::new(symbol, side, OrderType::Market, 0.0, quantity, trader_id)
    }

    /// Unfilled quantity still working
    pub fn remaining(&self) -> u32 {
        self.quantity - self.filled_quantity
    }

    /// Check if the order is completely filled
    pub fn is_filled(&self) -> bool {
        self.filled_quantity == self.quantity
    }

    /// Check if the order has any fills
    pub fn has_fills(&self) -> bool {
        self.filled_quantity > 0
    }

    /// Record a fill and advance the status machine.
    ///
    /// Fills are clamped to the remaining quantity so a racing over-fill can
    /// never push `filled_quantity` past `quantity`.
    pub fn add_fill(&mut self, fill_quantity: u32) {
        let applied = fill_quantity.min(self.remaining());
        self.filled_quantity += applied;

        if self.is_filled() {
            self.status = OrderStatus::Filled;
        } else if self.has_fills() {
            self.status = OrderStatus::Partial;
        }
    }
}
