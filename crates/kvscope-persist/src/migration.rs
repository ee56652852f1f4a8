//! Schema setup for the SQLite medium.
//!
//! Migrations are numbered and recorded in a `schema_migrations` table.
//! Opening a database applies whatever lies between the recorded version
//! and [`CURRENT_VERSION`] inside one transaction, so a file created by
//! an older build upgrades in place and running the setup again is a
//! no-op.

use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::Connection;

use crate::error::{PersistError, Result};

/// Latest schema version this build produces.
pub const CURRENT_VERSION: u32 = 1;

/// Bring the database schema up to [`CURRENT_VERSION`].
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let applied = schema_version(conn);
    if applied >= CURRENT_VERSION {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for version in (applied + 1)..=CURRENT_VERSION {
        apply_migration(&tx, version)?;
        tx.execute(
            "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
            rusqlite::params![version, now_millis()],
        )?;
    }
    tx.commit()?;

    Ok(())
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )
    .unwrap_or(0)
}

fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        _ => Err(PersistError::Migration(format!(
            "no migration registered for version {}",
            version
        ))),
    }
}

/// v1: the record table.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE kv_records (
            record_key TEXT PRIMARY KEY,   -- namespace-qualified key
            payload TEXT NOT NULL,         -- JSON-encoded value
            updated_at INTEGER NOT NULL    -- last write (Unix ms)
        );
        "#,
    )?;

    Ok(())
}

/// Current time in milliseconds since the Unix epoch.
pub(crate) fn now_millis() -> i64 {
    let since_epoch = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before Unix epoch");
    since_epoch.as_millis() as i64
}
