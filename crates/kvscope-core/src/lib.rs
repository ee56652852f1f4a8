//! # kvscope Core
//!
//! Pure primitives for the kvscope store engine: the value registry, the
//! subscriber registry, and the scope resolution protocol.
//!
//! This crate contains no I/O and no locking. It is plain data plus the
//! transition logic that keeps the scoping protocol correct; the `kvscope`
//! facade owns the tables, the lock, and the ordered lifecycle that ties
//! them together.
//!
//! ## Key Types
//!
//! - [`StoreRegistry`] - current value per key
//! - [`SubscriberRegistry`] - ordered callback lists per key
//! - [`ScopeTable`] - owner/follower slot state per logical key
//! - [`StoreOptions`] - factory configuration, validated at build time

pub mod error;
pub mod options;
pub mod registry;
pub mod scope;
pub mod subscribers;

pub use error::ConfigError;
pub use options::{StoreOptions, DEFAULT_NAMESPACE};
pub use registry::StoreRegistry;
pub use scope::{FollowerResolution, OwnerResolution, PhysicalKey, ScopeState, ScopeTable};
pub use subscribers::{SubscriberFn, SubscriberRegistry, SubscriptionHandle};

// Values are plain JSON payloads throughout the engine.
pub use serde_json::Value;
