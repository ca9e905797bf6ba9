//! Crossing detection and execution pricing
//!
//! A bid and an ask cross when both prices are positive and the bid is at
//! or above the ask.
//!
//! Execution price policy: limit–limit crosses print at the midpoint of the
//! crossing level prices; market orders take liquidity at the resting
//! (maker) price. Both policies are fixed here so the matching loops and
//! the test suite agree.

/// Check if a bid and ask can match at the given prices
pub fn can_match(bid_price: f64, ask_price: f64) -> bool {
    bid_price > 0.0 && ask_price > 0.0 && bid_price >= ask_price
}

/// Execution price for a limit–limit cross: midpoint of the level prices
pub fn limit_cross_price(bid_price: f64, ask_price: f64) -> f64 {
    (bid_price + ask_price) / 2.0
}
