//! Price-time priority matching cycles
//!
//! The matching worker calls into this module with the book lock held.
//! Cycles mutate book state and return the produced executions plus order
//! snapshots; all callback dispatch happens afterwards, lock-free, in the
//! worker.

pub mod crossing;
pub mod executor;

pub use crossing::can_match;
pub use executor::ExecutionFactory;

use crate::book::BookState;
use crate::clock::MonotonicClock;
use types::execution::Execution;
use types::order::{Order, Side};

/// Outcome of one matching cycle
#[derive(Debug)]
pub(crate) struct CycleResult {
    /// Fills produced, in match order
    pub executions: Vec<Execution>,
    /// Resting orders whose status changed (Partial/Filled)
    pub maker_updates: Vec<Order>,
    /// Final snapshot of the incoming order
    pub taker: Order,
}

/// Rest a limit order, then cross the book while the touch overlaps.
///
/// Heads of the best bid and ask queues match one pair at a time so FIFO
/// priority is preserved within a level. Each pair produces one execution
/// at the midpoint of the crossing level prices, tagged with the taker.
pub(crate) fn run_limit_cycle(
    state: &mut BookState,
    taker: Order,
    executions: &ExecutionFactory,
    clock: &MonotonicClock,
) -> CycleResult {
    let taker_id = taker.id;
    let taker_side = taker.side;
    let symbol = taker.symbol.clone();
    let trader_id = taker.trader_id.clone();

    let mut result = CycleResult {
        executions: Vec::new(),
        maker_updates: Vec::new(),
        taker: taker.clone(),
    };

    state.insert(taker);

    while let Some((bid_price, ask_price)) = state.crossed_pair() {
        let (Some(bid_remaining), Some(ask_remaining)) = (
            state.bids.best_front_remaining(),
            state.asks.best_front_remaining(),
        ) else {
            break;
        };

        let trade_quantity = bid_remaining.min(ask_remaining);
        let price = crossing::limit_cross_price(bid_price, ask_price);
        result.executions.push(executions.build(
            &symbol,
            taker_id,
            taker_side,
            &trader_id,
            price,
            trade_quantity,
            clock.now_nanos(),
        ));

        let bid_snapshot = state.bids.fill_best(trade_quantity);
        let ask_snapshot = state.asks.fill_best(trade_quantity);
        for snapshot in [bid_snapshot, ask_snapshot].into_iter().flatten() {
            if snapshot.id == taker_id {
                result.taker = snapshot;
            } else {
                result.maker_updates.push(snapshot);
            }
        }
    }

    state.refresh_best();
    result
}

/// Sweep a market order against the opposite side.
///
/// Walks outward from the best price, filling head orders at the maker's
/// level price until the incoming quantity is exhausted or the side runs
/// dry. Any unfilled remainder is dropped — market orders never rest.
pub(crate) fn run_market_cycle(
    state: &mut BookState,
    taker: Order,
    executions: &ExecutionFactory,
    clock: &MonotonicClock,
) -> CycleResult {
    let symbol = taker.symbol.clone();
    let trader_id = taker.trader_id.clone();
    let taker_side = taker.side;
    let taker_id = taker.id;

    let mut result = CycleResult {
        executions: Vec::new(),
        maker_updates: Vec::new(),
        taker,
    };

    while result.taker.remaining() > 0 {
        let (maker_price, maker_remaining) = match taker_side {
            Side::Buy => match (state.asks.best_price(), state.asks.best_front_remaining()) {
                (Some(p), Some(r)) => (p, r),
                _ => break,
            },
            Side::Sell => match (state.bids.best_price(), state.bids.best_front_remaining()) {
                (Some(p), Some(r)) => (p, r),
                _ => break,
            },
        };

        let trade_quantity = result.taker.remaining().min(maker_remaining);
        result.executions.push(executions.build(
            &symbol,
            taker_id,
            taker_side,
            &trader_id,
            maker_price,
            trade_quantity,
            clock.now_nanos(),
        ));

        let maker_snapshot = match taker_side {
            Side::Buy => state.asks.fill_best(trade_quantity),
            Side::Sell => state.bids.fill_best(trade_quantity),
        };
        if let Some(snapshot) = maker_snapshot {
            result.maker_updates.push(snapshot);
        }
        result.taker.add_fill(trade_quantity);
    }

    state.refresh_best();
    result
}
