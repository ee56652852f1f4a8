//! # kvscope
//!
//! Observable key-value stores with per-owner scope isolation and
//! optional persistence.
//!
//! ## Overview
//!
//! A [`KvStore`] holds JSON values under string keys and fans every
//! write out to the subscribers of that key, in subscription order.
//! Consumers work through [`Binding`]s: mountable handles that observe
//! one key, write through it, and clean up after themselves. Stores can
//! be persistent (SQLite plus an optional cookie mirror) and can isolate
//! same-named keys per owner.
//!
//! ## Key Concepts
//!
//! - **Binding**: one consumer's handle to a key. Unmounted bindings
//!   only preview; mounted bindings observe and write.
//! - **Owner / follower**: a binding with an initial value owns its key
//!   in an isolated store; bindings without one follow whichever owner
//!   is current.
//! - **Working key**: what a binding actually reads and writes - the
//!   logical key, or the per-owner physical key in an isolated store.
//! - **Hydration**: on mount, durable state wins over the in-memory
//!   entry; a durable miss is seeded from the entry.
//!
//! ## Usage
//!
//! ```rust
//! use kvscope::{KvStore, StoreOptions};
//!
//! let store = KvStore::new(StoreOptions::shared()).unwrap();
//!
//! let mut counter = store.bind_with("count", 0).unwrap();
//! counter.mount();
//!
//! let mut mirror = store.bind("count");
//! mirror.mount();
//!
//! counter.set(41).unwrap();
//! assert_eq!(mirror.value(), serde_json::json!(41));
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `kvscope::core` - Tables and the scope protocol
//! - `kvscope::persist` - Durable media, cookie mirror, persistence port

pub mod binding;
pub mod error;
pub mod store;

// Re-export component crates
pub use kvscope_core as core;
pub use kvscope_persist as persist;

// Re-export main types for convenience
pub use binding::{Binding, SetOutcome};
pub use error::{KvError, Result};
pub use store::{KvStore, KvStoreBuilder};

// Re-export commonly used core types
pub use kvscope_core::{ConfigError, StoreOptions, Value, DEFAULT_NAMESPACE};
