//! # kvscope Persist
//!
//! Durable storage for kvscope stores. Provides a trait-based medium
//! interface with SQLite and in-memory implementations, plus the cookie
//! mirror channel and the port that composes them.
//!
//! ## Overview
//!
//! Values are stored as JSON payload strings under namespaced record
//! keys. The [`Medium`] trait abstracts the durable backend; the primary
//! implementation is [`SqliteMedium`], with [`MemoryMedium`] for testing.
//! A [`CookieJar`] can be attached as a secondary channel that mirrors
//! every save in Set-Cookie form for an external rendering path.
//! [`PersistencePort`] is the only type stores talk to.
//!
//! ## Key Types
//!
//! - [`PersistencePort`] - Composes medium, mirror, and namespace
//! - [`Medium`] - The trait for durable payload storage
//! - [`SqliteMedium`] - SQLite-based persistent storage
//! - [`MemoryMedium`] - In-memory storage for tests
//! - [`CookieJar`] / [`CookieRecord`] - The mirror channel
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use kvscope_persist::{PersistencePort, SqliteMedium};
//!
//! fn example() -> kvscope_persist::Result<()> {
//!     // Compose a port from an explicit database path
//!     let medium = Arc::new(SqliteMedium::open("kvscope.db")?);
//!     let port = PersistencePort::new("my-app").with_medium(medium);
//!
//!     // Or probe the platform's local data directory
//!     let port = PersistencePort::ambient("my-app", false);
//!
//!     port.save("theme", &serde_json::json!("dark"));
//!     assert_eq!(port.load("theme"), Some(serde_json::json!("dark")));
//!     Ok(())
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Last write wins**: media store one payload per record key
//! - **Mirror-first loads**: an attached jar is consulted before the medium
//! - **Fire-and-forget saves**: channel failures warn and never propagate
//! - **Idempotent migrations**: schema setup can run any number of times

pub mod cookie;
pub mod error;
pub mod medium;
pub mod memory;
pub mod migration;
pub mod port;
pub mod sqlite;

pub use cookie::{CookieJar, CookieRecord, FileCookieJar, MemoryCookieJar};
pub use error::{PersistError, Result};
pub use medium::Medium;
pub use memory::MemoryMedium;
pub use port::PersistencePort;
pub use sqlite::SqliteMedium;
