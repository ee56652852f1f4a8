//! Subscriber registry: ordered callback lists per key.
//!
//! Every binding attached to a key registers one callback here; a write
//! to that key invokes each of them with the new value, in registration
//! order, exactly once. Removing the last subscriber for a key never
//! deletes the underlying store entry - entry lifecycle belongs to the
//! scope resolver (isolated mode) or to the process lifetime (shared
//! mode).

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

/// Callback invoked with the new value on every notification pass.
pub type SubscriberFn = dyn Fn(&Value) + Send + Sync;

/// Identifies one subscription so it can be removed later.
///
/// Unknown or already-removed handles unsubscribe as a no-op, which keeps
/// follower unmount idempotent even after an owner reclaimed the whole
/// key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle {
    key: String,
    id: u64,
}

impl SubscriptionHandle {
    /// The key this subscription is attached to.
    pub fn key(&self) -> &str {
        &self.key
    }
}

struct Subscriber {
    id: u64,
    callback: Arc<SubscriberFn>,
}

/// Ordered callback lists per key.
#[derive(Default)]
pub struct SubscriberRegistry {
    subscribers: HashMap<String, Vec<Subscriber>>,
    next_id: u64,
}

impl SubscriberRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback for a key.
    ///
    /// Registration order is delivery order.
    pub fn subscribe(
        &mut self,
        key: impl Into<String>,
        callback: Arc<SubscriberFn>,
    ) -> SubscriptionHandle {
        let key = key.into();
        self.next_id += 1;
        let id = self.next_id;
        self.subscribers
            .entry(key.clone())
            .or_default()
            .push(Subscriber { id, callback });
        SubscriptionHandle { key, id }
    }

    /// Remove one subscription.
    pub fn unsubscribe(&mut self, handle: &SubscriptionHandle) {
        if let Some(list) = self.subscribers.get_mut(&handle.key) {
            list.retain(|subscriber| subscriber.id != handle.id);
            if list.is_empty() {
                self.subscribers.remove(&handle.key);
            }
        }
    }

    /// Remove every subscription for a key at once (owner reclaim).
    pub fn remove_key(&mut self, key: &str) {
        self.subscribers.remove(key);
    }

    /// The current callbacks for a key, in registration order.
    ///
    /// The store front delivers from a snapshot after releasing its table
    /// lock, so callbacks are free to re-enter the store.
    pub fn snapshot(&self, key: &str) -> Vec<Arc<SubscriberFn>> {
        self.subscribers
            .get(key)
            .map(|list| list.iter().map(|s| Arc::clone(&s.callback)).collect())
            .unwrap_or_default()
    }

    /// Invoke every currently-registered callback for `key` with `value`,
    /// in registration order, each exactly once.
    pub fn notify(&self, key: &str, value: &Value) {
        for callback in self.snapshot(key) {
            callback(value);
        }
    }

    /// Number of subscriptions currently attached to a key.
    pub fn count(&self, key: &str) -> usize {
        self.subscribers.get(key).map(Vec::len).unwrap_or(0)
    }

    /// Number of keys with at least one subscription.
    pub fn key_count(&self) -> usize {
        self.subscribers.len()
    }
}
