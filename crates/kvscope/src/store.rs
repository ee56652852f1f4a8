//! The store front: shared tables behind one cloneable handle.
//!
//! A `KvStore` owns the value registry, the subscriber registry, and the
//! scope table behind a single mutex, plus the persistence port. Every
//! store starts from fresh tables; handles are cheap clones sharing the
//! same tables.
//!
//! Mutations follow one discipline: update the tables and snapshot the
//! affected subscriber list under the lock, then deliver from the
//! snapshot after releasing it. Callbacks are therefore free to re-enter
//! the store without deadlocking.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use serde::Serialize;
use serde_json::Value;

use kvscope_core::{
    FollowerResolution, OwnerResolution, PhysicalKey, ScopeTable, StoreOptions, StoreRegistry,
    SubscriberFn, SubscriberRegistry, SubscriptionHandle,
};
use kvscope_persist::{CookieJar, Medium, PersistencePort, SqliteMedium};

use crate::binding::Binding;
use crate::error::Result;

/// Handle to one value store.
#[derive(Clone)]
pub struct KvStore {
    shared: Arc<StoreShared>,
}

struct StoreShared {
    options: StoreOptions,
    port: PersistencePort,
    tables: Mutex<StoreInner>,
}

/// The shared tables: entries, subscriptions, scope slots.
#[derive(Default)]
struct StoreInner {
    registry: StoreRegistry,
    subscribers: SubscriberRegistry,
    scopes: ScopeTable,
}

impl KvStore {
    // ─────────────────────────────────────────────────────────────────────────
    // Construction
    // ─────────────────────────────────────────────────────────────────────────

    /// Build a store from options.
    ///
    /// A persistent store probes the platform's local data directory for
    /// its channels; inject custom channels through [`KvStore::builder`].
    pub fn new(options: StoreOptions) -> Result<Self> {
        Self::builder(options).build()
    }

    /// Start a builder for a store with injected persistence channels.
    pub fn builder(options: StoreOptions) -> KvStoreBuilder {
        KvStoreBuilder::new(options)
    }

    fn from_parts(options: StoreOptions, port: PersistencePort) -> Self {
        Self {
            shared: Arc::new(StoreShared {
                options,
                port,
                tables: Mutex::new(StoreInner::default()),
            }),
        }
    }

    /// The options this store was built with.
    pub fn options(&self) -> &StoreOptions {
        &self.shared.options
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Bindings
    // ─────────────────────────────────────────────────────────────────────────

    /// Bind a logical key without an initial value.
    ///
    /// In an isolated store this is a follower binding: at mount it
    /// attaches to the current owner's slot, or parks on a pending one.
    pub fn bind(&self, key: impl Into<String>) -> Binding {
        Binding::new(self.clone(), key.into(), None)
    }

    /// Bind a logical key with an initial value.
    ///
    /// In an isolated store this is an owner binding. The initial value
    /// is applied at mount, not at bind.
    pub fn bind_with<T: Serialize>(&self, key: impl Into<String>, initial: T) -> Result<Binding> {
        let initial = serde_json::to_value(initial)?;
        Ok(Binding::new(self.clone(), key.into(), Some(initial)))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Table Operations
    // ─────────────────────────────────────────────────────────────────────────

    fn locked<T>(&self, f: impl FnOnce(&mut StoreInner) -> T) -> T {
        let mut tables = self.shared.tables.lock().unwrap();
        f(&mut tables)
    }

    pub(crate) fn is_isolated(&self) -> bool {
        self.shared.options.isolated
    }

    pub(crate) fn resolve_owner(&self, logical: &str) -> OwnerResolution {
        self.locked(|inner| inner.scopes.resolve_owner(logical))
    }

    pub(crate) fn resolve_follower(&self, logical: &str) -> FollowerResolution {
        self.locked(|inner| inner.scopes.resolve_follower(logical))
    }

    /// Create the entry for a working key unless one already exists,
    /// fanning the seed value out to subscribers already attached.
    ///
    /// Returns whether the entry was created.
    pub(crate) fn seed_entry(&self, working_key: &str, value: Value) -> bool {
        let snapshot = self.locked(|inner| {
            if inner.registry.has(working_key) {
                return None;
            }
            inner.registry.set(working_key, value.clone());
            Some(inner.subscribers.snapshot(working_key))
        });

        match snapshot {
            Some(subscribers) => {
                for callback in &subscribers {
                    callback(&value);
                }
                true
            }
            None => false,
        }
    }

    /// Write a value, persist it under the logical key, then fan out to
    /// every subscriber of the working key in registration order.
    ///
    /// Returns the number of subscribers delivered to.
    pub(crate) fn publish(&self, logical: &str, working_key: &str, value: Value) -> usize {
        let snapshot = self.locked(|inner| {
            inner.registry.set(working_key, value.clone());
            inner.subscribers.snapshot(working_key)
        });

        self.shared.port.save(logical, &value);

        for callback in &snapshot {
            callback(&value);
        }
        snapshot.len()
    }

    /// Bring the entry for a working key in line with durable state.
    ///
    /// One port read per call. A durable value that differs from the
    /// current entry wins and is fanned out; a durable miss seeds the
    /// durable side from the current entry instead.
    pub(crate) fn hydrate(&self, logical: &str, working_key: &str) {
        match self.shared.port.load(logical) {
            Some(durable) => {
                let snapshot = self.locked(|inner| {
                    if inner.registry.get(working_key) == Some(&durable) {
                        return None;
                    }
                    inner.registry.set(working_key, durable.clone());
                    Some(inner.subscribers.snapshot(working_key))
                });

                if let Some(subscribers) = snapshot {
                    for callback in &subscribers {
                        callback(&durable);
                    }
                }
            }
            None => {
                if let Some(current) = self.current(working_key) {
                    self.shared.port.save(logical, &current);
                }
            }
        }
    }

    pub(crate) fn subscribe_at(
        &self,
        working_key: &str,
        callback: Arc<SubscriberFn>,
    ) -> SubscriptionHandle {
        self.locked(|inner| inner.subscribers.subscribe(working_key, callback))
    }

    pub(crate) fn unsubscribe(&self, handle: &SubscriptionHandle) {
        self.locked(|inner| inner.subscribers.unsubscribe(handle));
    }

    /// Owner unmount: drop the entry and every subscription at the
    /// owner's physical key, and release its scope slot if still held.
    pub(crate) fn reclaim(&self, logical: &str, physical: &PhysicalKey) {
        self.locked(|inner| {
            inner.subscribers.remove_key(physical.as_str());
            inner.registry.delete(physical.as_str());
            inner.scopes.release_owner(logical, physical);
        });
    }

    pub(crate) fn current(&self, working_key: &str) -> Option<Value> {
        self.locked(|inner| inner.registry.get(working_key).cloned())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Diagnostics
    // ─────────────────────────────────────────────────────────────────────────

    /// The raw entry stored under a working key.
    pub fn peek(&self, key: &str) -> Option<Value> {
        self.current(key)
    }

    /// Whether an entry exists under a working key.
    pub fn contains_key(&self, key: &str) -> bool {
        self.locked(|inner| inner.registry.has(key))
    }

    /// Number of subscriptions attached to a working key.
    pub fn subscriber_count(&self, key: &str) -> usize {
        self.locked(|inner| inner.subscribers.count(key))
    }

    /// Number of entries currently stored.
    pub fn len(&self) -> usize {
        self.locked(|inner| inner.registry.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Builder for a store with injected persistence channels.
///
/// The `persistent` and `mirror_to_cookies` flags drive ambient probing
/// only; once any channel is injected, the store carries exactly the
/// channels given here.
pub struct KvStoreBuilder {
    options: StoreOptions,
    medium: Option<Arc<dyn Medium>>,
    jar: Option<Arc<dyn CookieJar>>,
    sqlite_path: Option<PathBuf>,
}

impl KvStoreBuilder {
    pub fn new(options: StoreOptions) -> Self {
        Self {
            options,
            medium: None,
            jar: None,
            sqlite_path: None,
        }
    }

    /// Use the given medium as the durable channel.
    pub fn medium(mut self, medium: Arc<dyn Medium>) -> Self {
        self.medium = Some(medium);
        self
    }

    /// Use the given jar as the mirror channel.
    pub fn cookie_jar(mut self, jar: Arc<dyn CookieJar>) -> Self {
        self.jar = Some(jar);
        self
    }

    /// Open a SQLite medium at the given path as the durable channel.
    /// Ignored when an explicit medium is injected.
    pub fn sqlite_at(mut self, path: impl Into<PathBuf>) -> Self {
        self.sqlite_path = Some(path.into());
        self
    }

    /// Validate the options and assemble the store.
    pub fn build(self) -> Result<KvStore> {
        self.options.validate()?;

        let port = if !self.options.persistent {
            PersistencePort::disabled()
        } else if self.medium.is_none() && self.jar.is_none() && self.sqlite_path.is_none() {
            PersistencePort::ambient(
                self.options.namespace.as_str(),
                self.options.mirror_to_cookies,
            )
        } else {
            let mut port = PersistencePort::new(self.options.namespace.as_str());
            if let Some(medium) = self.medium {
                port = port.with_medium(medium);
            } else if let Some(path) = self.sqlite_path {
                port = port.with_medium(Arc::new(SqliteMedium::open(path)?));
            }
            if let Some(jar) = self.jar {
                port = port.with_jar(jar);
            }
            port
        };

        tracing::debug!(
            namespace = self.options.namespace.as_str(),
            durable = port.is_durable(),
            mirror = port.mirrors(),
            "persistence port ready"
        );

        Ok(KvStore::from_parts(self.options, port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kvscope_core::ConfigError;
    use kvscope_persist::MemoryMedium;
    use serde_json::json;

    use crate::error::KvError;

    fn recording(log: &Arc<Mutex<Vec<Value>>>) -> Arc<SubscriberFn> {
        let log = Arc::clone(log);
        Arc::new(move |value: &Value| log.lock().unwrap().push(value.clone()))
    }

    fn memory_store(options: StoreOptions) -> (KvStore, Arc<MemoryMedium>) {
        let medium = Arc::new(MemoryMedium::new());
        let store = KvStore::builder(options)
            .medium(medium.clone())
            .build()
            .unwrap();
        (store, medium)
    }

    #[test]
    fn test_build_rejects_mirror_without_persistence() {
        let options = StoreOptions {
            mirror_to_cookies: true,
            ..StoreOptions::default()
        };
        let result = KvStore::new(options);
        assert!(matches!(
            result,
            Err(KvError::Config(ConfigError::MirrorWithoutPersistence))
        ));
    }

    #[test]
    fn test_each_store_starts_with_fresh_tables() {
        let first = KvStore::new(StoreOptions::shared()).unwrap();
        let second = KvStore::new(StoreOptions::shared()).unwrap();

        first.publish("k", "k", json!(1));
        assert_eq!(first.len(), 1);
        assert!(second.is_empty());
    }

    #[test]
    fn test_clones_share_the_same_tables() {
        let store = KvStore::new(StoreOptions::shared()).unwrap();
        let handle = store.clone();

        handle.publish("k", "k", json!("shared"));
        assert_eq!(store.peek("k"), Some(json!("shared")));
    }

    #[test]
    fn test_seed_entry_only_creates_absent_entries() {
        let store = KvStore::new(StoreOptions::shared()).unwrap();

        assert!(store.seed_entry("k", json!(1)));
        assert!(!store.seed_entry("k", json!(2)));
        assert_eq!(store.peek("k"), Some(json!(1)));
    }

    #[test]
    fn test_seed_entry_reaches_pre_attached_subscribers() {
        let store = KvStore::new(StoreOptions::shared()).unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));
        store.subscribe_at("k", recording(&log));

        store.seed_entry("k", json!("seeded"));
        assert_eq!(log.lock().unwrap().as_slice(), &[json!("seeded")]);
    }

    #[test]
    fn test_publish_persists_and_counts_deliveries() {
        let (store, medium) = memory_store(StoreOptions::persistent().with_namespace("t"));
        let log = Arc::new(Mutex::new(Vec::new()));
        store.subscribe_at("k", recording(&log));
        store.subscribe_at("k", recording(&log));

        let delivered = store.publish("k", "k", json!(3));

        assert_eq!(delivered, 2);
        assert_eq!(log.lock().unwrap().len(), 2);
        assert_eq!(medium.read("t.k").unwrap().as_deref(), Some("3"));
    }

    #[test]
    fn test_hydrate_applies_divergent_durable_value() {
        let (store, medium) = memory_store(StoreOptions::persistent().with_namespace("t"));
        medium.write("t.k", "5").unwrap();

        let log = Arc::new(Mutex::new(Vec::new()));
        store.subscribe_at("k", recording(&log));

        store.hydrate("k", "k");
        assert_eq!(store.peek("k"), Some(json!(5)));
        assert_eq!(log.lock().unwrap().as_slice(), &[json!(5)]);

        // Matching durable state is not re-delivered.
        store.hydrate("k", "k");
        assert_eq!(log.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_hydrate_miss_seeds_durable_from_current_entry() {
        let (store, medium) = memory_store(StoreOptions::persistent().with_namespace("t"));
        store.seed_entry("k", json!("local"));

        store.hydrate("k", "k");
        assert_eq!(medium.read("t.k").unwrap().as_deref(), Some(r#""local""#));
    }

    #[test]
    fn test_non_persistent_store_never_touches_the_medium() {
        let medium = Arc::new(MemoryMedium::new());
        let store = KvStore::builder(StoreOptions::shared())
            .medium(medium.clone())
            .build()
            .unwrap();

        store.publish("k", "k", json!(1));
        store.hydrate("k", "k");
        assert!(medium.is_empty());
    }
}
