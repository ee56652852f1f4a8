//! Store registry: the current value per key.
//!
//! Pure data. The registry never notifies anyone by itself; the store
//! front runs the notification pass against the subscriber registry after
//! every write, so a store-level set still returns only after delivery.

use std::collections::HashMap;

use serde_json::Value;

/// Current value per key. At most one entry per key; any JSON value is
/// accepted without shape validation.
#[derive(Debug, Default)]
pub struct StoreRegistry {
    entries: HashMap<String, Value>,
}

impl StoreRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the value for a key, if present.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Insert or replace the value for a key. O(1).
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.entries.insert(key.into(), value);
    }

    /// Whether the key currently holds a value.
    pub fn has(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Delete the entry for a key. Deleting a missing key is a no-op.
    ///
    /// Entry lifecycle is owned by the scope resolver (isolated mode) or
    /// left to the process lifetime (shared mode); nothing else calls
    /// this.
    pub fn delete(&mut self, key: &str) {
        self.entries.remove(key);
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
