//! Full-session integration runs
//!
//! Same-seed sessions must reproduce each other, multi-symbol sessions
//! must keep every book uncrossed, and strategies must coexist on one
//! manager without deadlocking.

use std::sync::Arc;
use std::time::Duration;

use market_data::FeedConfig;
use simulation::bots::{MarketMaker, MarketMakerConfig, Momentum, MomentumConfig};
use simulation::{SessionConfig, TradingSession};

fn config(seed: u64) -> SessionConfig {
    SessionConfig {
        symbols: vec![
            ("AAPL".to_string(), 150.0),
            ("MSFT".to_string(), 300.0),
        ],
        feed: FeedConfig {
            seed,
            order_probability: 0.8,
            ..FeedConfig::default()
        },
    }
}

#[test]
fn same_seed_sessions_reproduce() {
    let run = |seed: u64| {
        let session = TradingSession::new(config(seed));
        session.run(40);
        let metrics = session.metrics();
        (metrics.orders_accepted, metrics.executions, metrics.volume)
    };

    let first = run(1234);
    let second = run(1234);
    assert_eq!(first, second);
    assert!(first.0 > 0, "seeded run should generate flow");
}

#[test]
fn different_seeds_diverge() {
    let run = |seed: u64| {
        let session = TradingSession::new(config(seed));
        session.run(40);
        session.metrics()
    };

    // Not a hard guarantee for any two seeds, but these diverge
    let a = run(1);
    let b = run(2);
    assert_ne!((a.orders_accepted, a.volume), (b.orders_accepted, b.volume));
}

#[test]
fn books_stay_uncrossed_through_a_session() {
    let session = TradingSession::new(config(77));
    session.run(60);

    for symbol in ["AAPL", "MSFT"] {
        let book = session.manager().get_order_book(symbol).unwrap();
        let (bid, ask) = (book.best_bid(), book.best_ask());
        assert!(
            bid == 0.0 || ask == 0.0 || bid < ask,
            "{symbol} crossed: bid={bid} ask={ask}"
        );
    }
}

#[test]
fn strategies_coexist_without_deadlock() {
    let session = TradingSession::new(SessionConfig {
        symbols: vec![("AAPL".to_string(), 150.0)],
        feed: FeedConfig {
            seed: 55,
            order_probability: 1.0,
            ..FeedConfig::default()
        },
    });

    session.add_strategy(Box::new(MarketMaker::new(
        "mm",
        "mm-1",
        Arc::clone(session.manager()),
        MarketMakerConfig::default(),
    )));
    session.add_strategy(Box::new(Momentum::new(
        "momo",
        "momo-1",
        Arc::clone(session.manager()),
        MomentumConfig {
            window: 5,
            threshold: 0.0005,
            order_quantity: 50,
        },
    )));

    session.run(50);

    let metrics = session.metrics();
    assert!(metrics.orders_accepted > 0);
    // Position arithmetic still reconciles after mixed strategy flow
    let stats = session.manager().stats();
    assert!(stats.total_orders >= metrics.orders_accepted);
}

#[test]
fn threaded_session_starts_and_stops() {
    let session = TradingSession::new(SessionConfig {
        symbols: vec![("AAPL".to_string(), 150.0)],
        feed: FeedConfig {
            tick_interval: Duration::from_millis(5),
            order_probability: 1.0,
            ..FeedConfig::default()
        },
    });

    session.start();
    std::thread::sleep(Duration::from_millis(100));
    session.stop();

    let metrics = session.metrics();
    assert!(metrics.orders_accepted > 0, "{}", metrics.summary());
}
