//! Error types for the persistence module.

use thiserror::Error;

/// Errors that can occur while reading or writing durable state.
#[derive(Debug, Error)]
pub enum PersistError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// I/O error from a file-backed medium or cookie jar.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The medium exists but cannot currently serve requests.
    #[error("medium unavailable: {0}")]
    Unavailable(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),
}

/// Result type for persistence operations.
pub type Result<T> = std::result::Result<T, PersistError>;
