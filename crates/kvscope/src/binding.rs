//! Bindings: per-consumer handles to one logical key.
//!
//! A binding starts unmounted, holding only a preview value. Mounting
//! runs one ordered sequence: resolve a working key (plus entry seeding
//! for bindings that carry an initial value), subscribe, hydrate from
//! durable state. Unmounting reverses exactly what this binding set up
//! and is idempotent; dropping a mounted binding unmounts it.

use std::sync::{Arc, Mutex, RwLock};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use kvscope_core::{PhysicalKey, SubscriberFn, SubscriptionHandle};

use crate::error::Result;
use crate::store::KvStore;

type WatcherFn = dyn Fn(&Value) + Send + Sync;

/// Result of a [`Binding::set`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetOutcome {
    /// The write was applied and fanned out to `delivered` subscribers.
    Applied {
        /// Number of subscribers the value was delivered to, this
        /// binding included.
        delivered: usize,
    },
    /// The binding has no working key (not mounted); the write was
    /// discarded.
    Dropped,
}

struct Mounted {
    working_key: String,
    subscription: SubscriptionHandle,
    /// Present when this binding holds an isolated owner slot, which it
    /// reclaims on unmount.
    owner_slot: Option<PhysicalKey>,
}

/// One consumer's handle to a logical key.
///
/// Bindings created with an initial value act as owners in an isolated
/// store; bindings without one act as followers. In a shared store the
/// initial value only seeds the entry if absent.
pub struct Binding {
    store: KvStore,
    logical: String,
    initial: Option<Value>,
    cache: Arc<RwLock<Value>>,
    watchers: Arc<Mutex<Vec<Arc<WatcherFn>>>>,
    mounted: Option<Mounted>,
}

impl Binding {
    pub(crate) fn new(store: KvStore, logical: String, initial: Option<Value>) -> Self {
        let preview = initial.clone().unwrap_or(Value::Null);
        Self {
            store,
            logical,
            initial,
            cache: Arc::new(RwLock::new(preview)),
            watchers: Arc::new(Mutex::new(Vec::new())),
            mounted: None,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Mount the binding: resolve a working key, subscribe, hydrate.
    ///
    /// Bindings with an initial value seed the entry before subscribing,
    /// so followers already attached to the working key observe it.
    /// Mounting an already-mounted binding is a no-op.
    pub fn mount(&mut self) {
        if self.mounted.is_some() {
            return;
        }

        let (working_key, owner_slot) = self.resolve();

        if let Some(initial) = &self.initial {
            self.store.seed_entry(&working_key, initial.clone());
        }

        let subscription = self.store.subscribe_at(&working_key, self.delivery_callback());
        self.store.hydrate(&self.logical, &working_key);

        if let Some(current) = self.store.current(&working_key) {
            *self.cache.write().unwrap() = current;
        }

        self.mounted = Some(Mounted {
            working_key,
            subscription,
            owner_slot,
        });
    }

    /// Unmount the binding. Idempotent.
    ///
    /// An isolated owner reclaims its entry, every subscription at its
    /// physical key, and its scope slot; any other binding removes only
    /// its own subscription.
    pub fn unmount(&mut self) {
        let Some(mounted) = self.mounted.take() else {
            return;
        };
        match mounted.owner_slot {
            Some(physical) => self.store.reclaim(&self.logical, &physical),
            None => self.store.unsubscribe(&mounted.subscription),
        }
    }

    /// Whether the binding is currently mounted.
    pub fn is_mounted(&self) -> bool {
        self.mounted.is_some()
    }

    /// The logical key this binding was created for.
    pub fn key(&self) -> &str {
        &self.logical
    }

    /// The working key while mounted: the logical key, or the physical
    /// key resolved for it in an isolated store.
    pub fn working_key(&self) -> Option<&str> {
        self.mounted.as_ref().map(|m| m.working_key.as_str())
    }

    fn resolve(&self) -> (String, Option<PhysicalKey>) {
        if !self.store.is_isolated() {
            return (self.logical.clone(), None);
        }

        if self.initial.is_some() {
            let resolution = self.store.resolve_owner(&self.logical);
            let physical = resolution.physical().clone();
            (physical.to_string(), Some(physical))
        } else {
            let resolution = self.store.resolve_follower(&self.logical);
            (resolution.physical().to_string(), None)
        }
    }

    fn delivery_callback(&self) -> Arc<SubscriberFn> {
        let cache = Arc::clone(&self.cache);
        let watchers = Arc::clone(&self.watchers);
        Arc::new(move |value: &Value| {
            *cache.write().unwrap() = value.clone();

            // Snapshot so a watcher can add watchers without deadlock.
            let snapshot: Vec<Arc<WatcherFn>> = watchers.lock().unwrap().clone();
            for watcher in &snapshot {
                watcher(value);
            }
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Values
    // ─────────────────────────────────────────────────────────────────────────

    /// Write a value through this binding.
    ///
    /// The entry is updated, persisted when the store is durable, then
    /// fanned out to every subscriber of the working key in registration
    /// order, this binding included. An unmounted binding has no working
    /// key, so the write is dropped with a warning.
    pub fn set<T: Serialize>(&self, value: T) -> Result<SetOutcome> {
        let value = serde_json::to_value(value)?;

        let Some(mounted) = &self.mounted else {
            tracing::warn!(key = self.logical.as_str(), "set dropped: binding not mounted");
            return Ok(SetOutcome::Dropped);
        };

        let delivered = self
            .store
            .publish(&self.logical, &mounted.working_key, value);
        Ok(SetOutcome::Applied { delivered })
    }

    /// The binding's current view of the value.
    ///
    /// Before mount this is the preview: the initial value, or `Null`.
    pub fn value(&self) -> Value {
        self.cache.read().unwrap().clone()
    }

    /// Deserialize the current view into a concrete type.
    pub fn value_as<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.value())?)
    }

    /// Observe every delivery to this binding.
    ///
    /// Watchers run after the binding's view updates, in add order, and
    /// only fire while the binding is mounted.
    pub fn watch(&self, watcher: impl Fn(&Value) + Send + Sync + 'static) {
        self.watchers.lock().unwrap().push(Arc::new(watcher));
    }
}

impl Drop for Binding {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kvscope_core::StoreOptions;
    use serde::Deserialize;
    use serde_json::json;

    fn shared_store() -> KvStore {
        KvStore::new(StoreOptions::shared()).unwrap()
    }

    #[test]
    fn test_unmounted_binding_shows_preview_value() {
        let store = shared_store();

        let owner = store.bind_with("k", 7).unwrap();
        assert_eq!(owner.value(), json!(7));
        assert!(!owner.is_mounted());

        let follower = store.bind("k");
        assert_eq!(follower.value(), Value::Null);
    }

    #[test]
    fn test_set_before_mount_is_dropped() {
        let store = shared_store();
        let binding = store.bind_with("k", 1).unwrap();

        assert_eq!(binding.set(2).unwrap(), SetOutcome::Dropped);
        assert_eq!(store.peek("k"), None);
    }

    #[test]
    fn test_mount_set_value_round_trip() {
        let store = shared_store();
        let mut binding = store.bind_with("count", 0).unwrap();
        binding.mount();

        assert_eq!(binding.value(), json!(0));
        assert_eq!(
            binding.set(41).unwrap(),
            SetOutcome::Applied { delivered: 1 }
        );
        assert_eq!(binding.value(), json!(41));
        assert_eq!(store.peek("count"), Some(json!(41)));
    }

    #[test]
    fn test_value_as_deserializes_typed_views() {
        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        struct Prefs {
            theme: String,
            size: u32,
        }

        let store = shared_store();
        let mut binding = store
            .bind_with(
                "prefs",
                Prefs {
                    theme: "dark".into(),
                    size: 3,
                },
            )
            .unwrap();
        binding.mount();

        let prefs: Prefs = binding.value_as().unwrap();
        assert_eq!(
            prefs,
            Prefs {
                theme: "dark".into(),
                size: 3,
            }
        );
    }

    #[test]
    fn test_watchers_fire_after_view_updates_in_add_order() {
        let store = shared_store();
        let mut binding = store.bind_with("k", 0).unwrap();
        binding.mount();

        let log = Arc::new(Mutex::new(Vec::new()));
        for tag in 0..3 {
            let log = Arc::clone(&log);
            binding.watch(move |value| log.lock().unwrap().push((tag, value.clone())));
        }

        binding.set(9).unwrap();
        assert_eq!(
            log.lock().unwrap().as_slice(),
            &[(0, json!(9)), (1, json!(9)), (2, json!(9))]
        );
    }

    #[test]
    fn test_unmount_is_idempotent_and_drop_unmounts() {
        let store = shared_store();

        let mut binding = store.bind_with("k", 1).unwrap();
        binding.mount();
        assert_eq!(store.subscriber_count("k"), 1);

        binding.unmount();
        binding.unmount();
        assert_eq!(store.subscriber_count("k"), 0);

        {
            let mut scoped = store.bind("k");
            scoped.mount();
            assert_eq!(store.subscriber_count("k"), 1);
        }
        assert_eq!(store.subscriber_count("k"), 0);
    }

    #[test]
    fn test_remount_after_unmount_subscribes_again() {
        let store = shared_store();
        let mut binding = store.bind_with("k", 1).unwrap();

        binding.mount();
        binding.unmount();
        binding.mount();

        assert_eq!(store.subscriber_count("k"), 1);
        assert_eq!(binding.set(2).unwrap(), SetOutcome::Applied { delivered: 1 });
    }

    #[test]
    fn test_mount_twice_is_a_no_op() {
        let store = shared_store();
        let mut binding = store.bind_with("k", 1).unwrap();
        binding.mount();
        binding.mount();
        assert_eq!(store.subscriber_count("k"), 1);
    }
}
