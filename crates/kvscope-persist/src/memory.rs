//! In-memory implementation of the Medium trait.
//!
//! Useful for tests and for exercising the persistence pipeline without
//! touching disk. Contents live for the lifetime of the value.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::Result;
use crate::medium::Medium;

/// In-memory medium backed by a hash map.
#[derive(Default)]
pub struct MemoryMedium {
    records: RwLock<HashMap<String, String>>,
}

impl MemoryMedium {
    /// Create an empty medium.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently held.
    pub fn len(&self) -> usize {
        self.records.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Medium for MemoryMedium {
    fn read(&self, record_key: &str) -> Result<Option<String>> {
        let records = self.records.read().unwrap();
        Ok(records.get(record_key).cloned())
    }

    fn write(&self, record_key: &str, payload: &str) -> Result<()> {
        let mut records = self.records.write().unwrap();
        records.insert(record_key.to_owned(), payload.to_owned());
        Ok(())
    }
}
