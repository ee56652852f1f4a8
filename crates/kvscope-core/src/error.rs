//! Error types for kvscope-core.

use thiserror::Error;

/// Invalid factory options, surfaced at store-creation time.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The persistence namespace prefixes every record key and must not
    /// be empty.
    #[error("persistence namespace must not be empty")]
    EmptyNamespace,

    /// Cookie mirroring writes through the persistence pipeline, so it
    /// cannot be enabled on a non-persistent store.
    #[error("mirror_to_cookies requires persistent")]
    MirrorWithoutPersistence,
}
