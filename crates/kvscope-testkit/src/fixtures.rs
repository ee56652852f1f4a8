//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::sync::Arc;

use serde::Serialize;
use tempfile::TempDir;

use kvscope::{Binding, KvStore, StoreOptions};
use kvscope_persist::{MemoryCookieJar, MemoryMedium};

/// Install a test-friendly tracing subscriber.
///
/// Safe to call from every test; only the first call in the process
/// wins.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A store wired to in-memory persistence channels.
///
/// The medium and jar are kept alongside the store so tests can assert
/// on what actually got written through each channel.
pub struct TestBench {
    pub store: KvStore,
    pub medium: Arc<MemoryMedium>,
    pub jar: Arc<MemoryCookieJar>,
}

impl TestBench {
    /// Bench with both channels active.
    pub fn new() -> Self {
        Self::with_options(StoreOptions::persistent_with_cookies())
    }

    /// Bench over the given options.
    ///
    /// The in-memory channels are always injected; whether the store
    /// uses them follows from the options.
    pub fn with_options(options: StoreOptions) -> Self {
        let medium = Arc::new(MemoryMedium::new());
        let jar = Arc::new(MemoryCookieJar::new());
        let store = KvStore::builder(options)
            .medium(medium.clone())
            .cookie_jar(jar.clone())
            .build()
            .expect("bench options are valid");
        Self { store, medium, jar }
    }

    /// A second store over the same channels, as after a restart.
    pub fn reopen(&self) -> KvStore {
        KvStore::builder(self.store.options().clone())
            .medium(self.medium.clone())
            .cookie_jar(self.jar.clone())
            .build()
            .expect("bench options are valid")
    }

    /// Bind and mount a key with an initial value.
    pub fn mounted<T: Serialize>(&self, key: &str, initial: T) -> Binding {
        let mut binding = self
            .store
            .bind_with(key, initial)
            .expect("initial value serializes");
        binding.mount();
        binding
    }

    /// Bind and mount a follower for a key.
    pub fn follower(&self, key: &str) -> Binding {
        let mut binding = self.store.bind(key);
        binding.mount();
        binding
    }
}

impl Default for TestBench {
    fn default() -> Self {
        Self::new()
    }
}

/// A store backed by a SQLite file inside a temp directory.
///
/// The directory lives as long as the bench, so the file survives
/// [`SqliteBench::reopen`] calls.
pub struct SqliteBench {
    pub store: KvStore,
    dir: TempDir,
}

impl SqliteBench {
    pub fn new(options: StoreOptions) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let store = KvStore::builder(options)
            .sqlite_at(dir.path().join("store.db"))
            .build()
            .expect("open sqlite store");
        Self { store, dir }
    }

    /// A fresh store over the same database file.
    pub fn reopen(&self, options: StoreOptions) -> KvStore {
        KvStore::builder(options)
            .sqlite_at(self.dir.path().join("store.db"))
            .build()
            .expect("reopen sqlite store")
    }
}

/// Mount `count` followers on one key.
pub fn mounted_followers(store: &KvStore, key: &str, count: usize) -> Vec<Binding> {
    (0..count)
        .map(|_| {
            let mut binding = store.bind(key);
            binding.mount();
            binding
        })
        .collect()
}
