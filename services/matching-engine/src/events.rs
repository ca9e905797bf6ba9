//! Subscriber registration and panic-isolated dispatch
//!
//! Collaborators observe the execution stream through registered callbacks.
//! The engine is the single owner of the data; subscribers get borrowed
//! records during dispatch and no core lock is ever held while user code
//! runs. A panicking subscriber is logged and skipped — it must not take
//! the matching worker down.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::error;
use types::execution::Execution;
use types::order::Order;

/// Execution subscriber: invoked once per fill
pub type ExecutionCallback = Arc<dyn Fn(&Execution) + Send + Sync>;

/// Order-status subscriber: invoked after each status transition
pub type OrderStatusCallback = Arc<dyn Fn(&Order) + Send + Sync>;

/// Handle returned by subscription, used for removal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// A list of subscriber handles with add/remove and snapshot dispatch
pub(crate) struct Subscribers<F: ?Sized> {
    next_id: u64,
    entries: Vec<(SubscriptionId, Arc<F>)>,
}

impl<F: ?Sized> Subscribers<F> {
    pub(crate) fn new() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }

    pub(crate) fn add(&mut self, callback: Arc<F>) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.entries.push((id, callback));
        id
    }

    pub(crate) fn remove(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(sid, _)| *sid != id);
        self.entries.len() != before
    }

    /// Clone out the callback handles so dispatch runs lock-free
    pub(crate) fn snapshot(&self) -> Vec<Arc<F>> {
        self.entries.iter().map(|(_, cb)| Arc::clone(cb)).collect()
    }
}

impl<F: ?Sized> Default for Subscribers<F> {
    fn default() -> Self {
        Self::new()
    }
}

/// Run a subscriber callback, containing any panic
pub(crate) fn run_isolated(label: &str, f: impl FnOnce()) {
    if catch_unwind(AssertUnwindSafe(f)).is_err() {
        error!(callback = label, "subscriber callback panicked; continuing");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_add_and_remove() {
        let mut subs: Subscribers<dyn Fn(u32) + Send + Sync> = Subscribers::new();
        let id = subs.add(Arc::new(|_| {}));
        assert_eq!(subs.snapshot().len(), 1);

        assert!(subs.remove(id));
        assert!(!subs.remove(id));
        assert!(subs.snapshot().is_empty());
    }

    #[test]
    fn test_subscription_ids_are_unique() {
        let mut subs: Subscribers<dyn Fn(u32) + Send + Sync> = Subscribers::new();
        let a = subs.add(Arc::new(|_| {}));
        let b = subs.add(Arc::new(|_| {}));
        assert_ne!(a, b);
    }

    #[test]
    fn test_run_isolated_contains_panic() {
        let calls = AtomicUsize::new(0);
        run_isolated("boom", || panic!("subscriber bug"));
        run_isolated("ok", || {
            calls.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
