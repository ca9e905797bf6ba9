//! Session counters
//!
//! Aggregates what happened during a run: accepted and rejected orders,
//! executions, traded volume. Deeper analytics (Sharpe, VaR, histograms)
//! belong to the analytics layer, not here.

use serde::{Deserialize, Serialize};
use types::execution::Execution;

/// Aggregated counters for one session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionMetrics {
    /// Filled in by the session from engine totals when snapshotting
    pub orders_accepted: u64,
    pub orders_rejected: u64,
    pub executions: u64,
    pub volume: f64,
}

impl SessionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_rejected(&mut self) {
        self.orders_rejected += 1;
    }

    pub fn record_execution(&mut self, execution: &Execution) {
        self.executions += 1;
        self.volume += execution.notional();
    }

    /// One-line human summary
    pub fn summary(&self) -> String {
        format!(
            "orders: {} accepted / {} rejected | executions: {} | volume: {:.2}",
            self.orders_accepted, self.orders_rejected, self.executions, self.volume,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::order::Side;

    #[test]
    fn test_record_execution() {
        let mut metrics = SessionMetrics::new();
        metrics.record_execution(&Execution {
            execution_id: 1,
            order_id: 1,
            symbol: "AAPL".to_string(),
            side: Side::Buy,
            price: 150.0,
            quantity: 100,
            timestamp: 1,
            trader_id: "t1".to_string(),
        });

        assert_eq!(metrics.executions, 1);
        assert_eq!(metrics.volume, 15_000.0);
    }

    #[test]
    fn test_summary_mentions_counts() {
        let mut metrics = SessionMetrics::new();
        metrics.orders_accepted = 2;
        metrics.record_rejected();
        let summary = metrics.summary();
        assert!(summary.contains("2 accepted"));
        assert!(summary.contains("1 rejected"));
    }
}
