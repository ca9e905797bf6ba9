//! Position tracking types
//!
//! One position per symbol per process. Positive quantity is long, negative
//! is short. Positions are mutated only by the order manager's execution
//! subscriber; readers get snapshot copies.

use crate::order::Side;
use serde::{Deserialize, Serialize};

/// Net position for a single symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    /// Signed net quantity: long positive, short negative
    pub quantity: i64,
    /// Last execution price while the position is open (simplified average)
    pub avg_price: f64,
    pub realized_pnl: f64,
    pub unrealized_pnl: f64,
}

impl Position {
    /// Create a flat position for a symbol
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            quantity: 0,
            avg_price: 0.0,
            realized_pnl: 0.0,
            unrealized_pnl: 0.0,
        }
    }

    /// Check if the position is flat
    pub fn is_flat(&self) -> bool {
        self.quantity == 0
    }

    /// Notional exposure at the carried average price
    pub fn notional(&self) -> f64 {
        self.avg_price * self.quantity.unsigned_abs() as f64
    }

    /// Apply one execution to the position.
    ///
    /// Quantity moves by the signed fill size. A fill that reduces or flips
    /// the position realizes PnL against the carried average price; while
    /// the position stays open the average is reset to the execution price.
    ///
    /// Returns the PnL realized by this fill (0 when extending).
    pub fn apply_execution(&mut self, side: Side, quantity: u32, price: f64) -> f64 {
        let signed = match side {
            Side::Buy => i64::from(quantity),
            Side::Sell => -i64::from(quantity),
        };

        let mut realized = 0.0;
        if self.quantity != 0 && (self.quantity > 0) != (signed > 0) {
            let closing = signed.unsigned_abs().min(self.quantity.unsigned_abs());
            let direction = if self.quantity > 0 { 1.0 } else { -1.0 };
            realized = (price - self.avg_price) * closing as f64 * direction;
            self.realized_pnl += realized;
        }

        self.quantity += signed;

        if self.quantity != 0 {
            self.avg_price = price;
        }
        // Average equals the latest print, so open PnL restarts at zero
        self.unrealized_pnl = 0.0;

        realized
    }

    /// Refresh unrealized PnL against a reference price
    pub fn mark_to_market(&mut self, mark_price: f64) {
        if self.quantity == 0 {
            self.unrealized_pnl = 0.0;
        } else {
            self.unrealized_pnl = (mark_price - self.avg_price) * self.quantity as f64;
        }
    }

    /// Realized plus unrealized PnL
    pub fn total_pnl(&self) -> f64 {
        self.realized_pnl + self.unrealized_pnl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_position_is_flat() {
        let position = Position::new("AAPL");
        assert!(position.is_flat());
        assert_eq!(position.total_pnl(), 0.0);
    }

    #[test]
    fn test_buy_then_sell_nets_out() {
        let mut position = Position::new("AAPL");

        position.apply_execution(Side::Buy, 100, 150.0);
        assert_eq!(position.quantity, 100);
        assert_eq!(position.avg_price, 150.0);

        position.apply_execution(Side::Sell, 100, 151.0);
        assert!(position.is_flat());
        assert_eq!(position.realized_pnl, 100.0); // (151 - 150) × 100
    }

    #[test]
    fn test_short_position_realizes_on_buyback() {
        let mut position = Position::new("AAPL");

        position.apply_execution(Side::Sell, 50, 200.0);
        assert_eq!(position.quantity, -50);

        let realized = position.apply_execution(Side::Buy, 50, 195.0);
        assert_eq!(realized, 250.0); // (195 - 200) × 50 × (-1)
        assert!(position.is_flat());
    }

    #[test]
    fn test_extending_does_not_realize() {
        let mut position = Position::new("AAPL");

        let r1 = position.apply_execution(Side::Buy, 100, 150.0);
        let r2 = position.apply_execution(Side::Buy, 100, 152.0);

        assert_eq!(r1, 0.0);
        assert_eq!(r2, 0.0);
        assert_eq!(position.quantity, 200);
        // Simplified average: last execution price
        assert_eq!(position.avg_price, 152.0);
    }

    #[test]
    fn test_flip_realizes_closed_portion_only() {
        let mut position = Position::new("AAPL");

        position.apply_execution(Side::Buy, 100, 150.0);
        let realized = position.apply_execution(Side::Sell, 150, 155.0);

        // 100 closed at +5 each; the remaining 50 open a short
        assert_eq!(realized, 500.0);
        assert_eq!(position.quantity, -50);
        assert_eq!(position.avg_price, 155.0);
    }

    #[test]
    fn test_mark_to_market() {
        let mut position = Position::new("AAPL");
        position.apply_execution(Side::Buy, 100, 150.0);

        position.mark_to_market(153.0);
        assert_eq!(position.unrealized_pnl, 300.0);

        position.mark_to_market(149.0);
        assert_eq!(position.unrealized_pnl, -100.0);
    }

    #[test]
    fn test_mark_flat_position_is_zero() {
        let mut position = Position::new("AAPL");
        position.mark_to_market(150.0);
        assert_eq!(position.unrealized_pnl, 0.0);
    }
}
