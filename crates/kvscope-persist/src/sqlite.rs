//! SQLite implementation of the [`Medium`] trait.
//!
//! The durable channel of choice. rusqlite with bundled SQLite behind a
//! mutex; every call is synchronous and touches a single row, so one
//! connection serves the whole store.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{PersistError, Result};
use crate::medium::Medium;
use crate::migration;

/// SQLite-backed medium holding one row per record key.
pub struct SqliteMedium {
    conn: Mutex<Connection>,
}

impl SqliteMedium {
    /// Open (creating if needed) the database at `path` and bring its
    /// schema up to date.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Fully in-memory database, for tests and benches.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| PersistError::Unavailable(format!("connection mutex poisoned: {}", e)))?;
        f(&conn)
    }
}

impl Medium for SqliteMedium {
    fn read(&self, record_key: &str) -> Result<Option<String>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT payload FROM kv_records WHERE record_key = ?1",
                params![record_key],
                |row| row.get(0),
            )
            .optional()
            .map_err(PersistError::from)
        })
    }

    fn write(&self, record_key: &str, payload: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO kv_records (record_key, payload, updated_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(record_key) DO UPDATE SET
                     payload = excluded.payload,
                     updated_at = excluded.updated_at",
                params![record_key, payload, migration::now_millis()],
            )?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_and_read() {
        let medium = SqliteMedium::open_memory().unwrap();
        medium.write("app.theme", r#""dark""#).unwrap();
        assert_eq!(
            medium.read("app.theme").unwrap().as_deref(),
            Some(r#""dark""#)
        );
    }

    #[test]
    fn test_missing_record_is_none() {
        let medium = SqliteMedium::open_memory().unwrap();
        assert_eq!(medium.read("absent").unwrap(), None);
    }

    #[test]
    fn test_write_replaces_existing() {
        let medium = SqliteMedium::open_memory().unwrap();
        medium.write("k", "1").unwrap();
        medium.write("k", "2").unwrap();
        assert_eq!(medium.read("k").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn test_records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.db");

        {
            let medium = SqliteMedium::open(&path).unwrap();
            medium.write("app.count", "42").unwrap();
        }

        let reopened = SqliteMedium::open(&path).unwrap();
        assert_eq!(reopened.read("app.count").unwrap().as_deref(), Some("42"));
    }
}
