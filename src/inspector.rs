//! The inspector hook: an observer chain invoked outside the shard lock
//! after every public operation.

use crate::value::Payload;

/// Which public operation produced an inspector callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Put,
    Get,
    Del,
}

/// The outcome of an operation, as reported to the inspector.
///
/// For `Put`: `Added` is a new key, `Updated` is an existing key,
/// `Evicted` reports the victim of a capacity eviction (the call reports
/// the victim, not the inserter). For `Get`/`Del`, the same two codes
/// double as hit/miss: `Added` (code `1`) is a hit, `Updated` (code `0`)
/// is a miss; `Evicted` never occurs for `Get`/`Del`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// PUT: new key. GET/DEL: hit.
    Added,
    /// PUT: existing key overwritten. GET/DEL: miss.
    Updated,
    /// PUT only: this call reports an evicted victim, not the inserter.
    Evicted,
}

impl Status {
    /// Numeric encoding for observers that want to log or aggregate status
    /// without matching on the enum.
    pub fn code(self) -> i8 {
        match self {
            Status::Added => 1,
            Status::Updated => 0,
            Status::Evicted => -1,
        }
    }
}

/// One inspector invocation: an action, the key (as a formatted key since
/// the cache is generic over the key type), and the payload involved.
pub struct Event<'a, K> {
    pub action: Action,
    pub key: &'a K,
    pub payload: &'a Payload,
    pub status: Status,
}

/// A single observer callback.
pub type Observer<K> = Box<dyn Fn(&Event<'_, K>) + Send + Sync>;

/// A composable chain of observers, invoked in registration order.
///
/// The default chain is empty (a no-op). `register` appends a new
/// observer so it runs after every previously-registered one.
pub struct Inspector<K> {
    observers: Vec<Observer<K>>,
}

impl<K> Default for Inspector<K> {
    fn default() -> Self {
        Self { observers: Vec::new() }
    }
}

impl<K> Inspector<K> {
    /// Registers a new observer to run after all previously-registered ones.
    pub fn register(&mut self, observer: Observer<K>) {
        self.observers.push(observer);
    }

    /// True if no observer is registered — callers may skip building an
    /// `Event` (and cloning the key/payload it borrows) entirely.
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Invokes every observer in registration order.
    ///
    /// Callers MUST invoke this after releasing the shard lock — an
    /// observer that reenters the cache on the same shard would deadlock.
    /// Reentry on a *different* shard is safe but undocumented behavior
    /// callers should not rely on.
    pub fn fire(&self, event: Event<'_, K>) {
        for observer in &self.observers {
            observer(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn observers_run_in_registration_order() {
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut inspector: Inspector<String> = Inspector::default();

        let order_a = order.clone();
        inspector.register(Box::new(move |_event| order_a.lock().unwrap().push('A')));
        let order_b = order.clone();
        inspector.register(Box::new(move |_event| order_b.lock().unwrap().push('B')));

        let payload = Payload::default();
        let key = String::from("k");
        inspector.fire(Event {
            action: Action::Put,
            key: &key,
            payload: &payload,
            status: Status::Added,
        });

        assert_eq!(*order.lock().unwrap(), vec!['A', 'B']);
    }

    #[test]
    fn status_codes_have_the_expected_numeric_encoding() {
        assert_eq!(Status::Added.code(), 1);
        assert_eq!(Status::Updated.code(), 0);
        assert_eq!(Status::Evicted.code(), -1);
    }

    #[test]
    fn default_inspector_is_a_no_op() {
        let inspector: Inspector<i64> = Inspector::default();
        let payload = Payload::default();
        let key = 1i64;
        // Should not panic with zero observers registered.
        inspector.fire(Event {
            action: Action::Get,
            key: &key,
            payload: &payload,
            status: Status::Updated,
        });
    }
}
