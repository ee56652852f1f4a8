//! Medium trait: the abstract interface for durable payload storage.
//!
//! A medium stores opaque payload strings under record keys. Layers above
//! decide what the payloads contain (JSON-encoded values) and how record
//! keys are namespaced.

use crate::error::Result;

/// A durable slot store for string payloads.
///
/// Writes are last-wins; there is no compare-and-swap in the protocol.
/// Implementations must tolerate concurrent use from multiple threads.
pub trait Medium: Send + Sync {
    /// Read the payload stored under `record_key`, if any.
    fn read(&self, record_key: &str) -> Result<Option<String>>;

    /// Store `payload` under `record_key`, replacing any previous payload.
    fn write(&self, record_key: &str, payload: &str) -> Result<()>;
}
