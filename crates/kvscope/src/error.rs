//! Error types for the store front.

use kvscope_core::ConfigError;
use kvscope_persist::PersistError;
use thiserror::Error;

/// Errors that can occur while building or using a store.
#[derive(Debug, Error)]
pub enum KvError {
    /// Invalid store configuration.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Persistence error while assembling the store.
    #[error("persistence error: {0}")]
    Persist(#[from] PersistError),

    /// Value serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, KvError>;
