//! Ordered delivery recorder.
//!
//! A [`Probe`] stands in for an application-side watcher and remembers
//! every value it was handed, in delivery order, so tests can assert on
//! fan-out order and exactly-once delivery.

use std::sync::{Arc, Mutex};

use serde_json::Value;

/// Records every value delivered to it.
///
/// Clones share the same log, so a probe can be handed to a watcher
/// closure and inspected from the test afterwards.
#[derive(Clone, Debug, Default)]
pub struct Probe {
    seen: Arc<Mutex<Vec<Value>>>,
}

impl Probe {
    pub fn new() -> Self {
        Self::default()
    }

    /// A watcher closure that records into this probe.
    pub fn watcher(&self) -> impl Fn(&Value) + Send + Sync + 'static {
        let seen = Arc::clone(&self.seen);
        move |value: &Value| seen.lock().unwrap().push(value.clone())
    }

    /// Every value seen so far, in delivery order.
    pub fn seen(&self) -> Vec<Value> {
        self.seen.lock().unwrap().clone()
    }

    /// The most recent value, if any.
    pub fn last(&self) -> Option<Value> {
        self.seen.lock().unwrap().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.lock().unwrap().is_empty()
    }

    /// Forget everything seen so far.
    pub fn clear(&self) {
        self.seen.lock().unwrap().clear();
    }
}
