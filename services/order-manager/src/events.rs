//! Manager-side observability callbacks
//!
//! The manager fans out three streams: executions (pass-through from the
//! engine), position snapshots after each mutation, and human-readable
//! risk alerts on rejections. Dispatch always happens with the manager
//! lock released, and a panicking subscriber is contained and logged.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::error;
use types::execution::Execution;
use types::position::Position;

type ExecutionFn = dyn Fn(&Execution) + Send + Sync;
type PositionFn = dyn Fn(&Position) + Send + Sync;
type AlertFn = dyn Fn(&str) + Send + Sync;

/// Subscriber registry for the order manager
#[derive(Default)]
pub struct ManagerCallbacks {
    executions: Mutex<Vec<Arc<ExecutionFn>>>,
    positions: Mutex<Vec<Arc<PositionFn>>>,
    risk_alerts: Mutex<Vec<Arc<AlertFn>>>,
}

impl ManagerCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_execution(&self, callback: impl Fn(&Execution) + Send + Sync + 'static) {
        self.executions.lock().push(Arc::new(callback));
    }

    pub fn add_position(&self, callback: impl Fn(&Position) + Send + Sync + 'static) {
        self.positions.lock().push(Arc::new(callback));
    }

    pub fn add_risk_alert(&self, callback: impl Fn(&str) + Send + Sync + 'static) {
        self.risk_alerts.lock().push(Arc::new(callback));
    }

    pub fn emit_execution(&self, execution: &Execution) {
        // Clone the handles out first so no registry lock is held while
        // subscriber code runs
        let callbacks = self.executions.lock().clone();
        for callback in callbacks {
            contained("execution", || callback(execution));
        }
    }

    pub fn emit_position(&self, position: &Position) {
        let callbacks = self.positions.lock().clone();
        for callback in callbacks {
            contained("position", || callback(position));
        }
    }

    pub fn emit_risk_alert(&self, message: &str) {
        let callbacks = self.risk_alerts.lock().clone();
        for callback in callbacks {
            contained("risk_alert", || callback(message));
        }
    }
}

fn contained(label: &str, f: impl FnOnce()) {
    if catch_unwind(AssertUnwindSafe(f)).is_err() {
        error!(callback = label, "manager subscriber panicked; continuing");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_alert_fanout() {
        let callbacks = ManagerCallbacks::new();
        let seen = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let seen = Arc::clone(&seen);
            callbacks.add_risk_alert(move |_| {
                seen.fetch_add(1, Ordering::SeqCst);
            });
        }

        callbacks.emit_risk_alert("order size 500 exceeds limit 100");
        assert_eq!(seen.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_panicking_subscriber_is_contained() {
        let callbacks = ManagerCallbacks::new();
        let seen = Arc::new(AtomicUsize::new(0));

        callbacks.add_risk_alert(|_| panic!("subscriber bug"));
        let tail = Arc::clone(&seen);
        callbacks.add_risk_alert(move |_| {
            tail.fetch_add(1, Ordering::SeqCst);
        });

        callbacks.emit_risk_alert("still delivered");
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }
}
