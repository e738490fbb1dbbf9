//! SQLite ledger utilities.
//!
//! Runtime defaults are intentionally conservative:
//! - `journal_mode = WAL` to allow concurrent readers while writers append
//! - `busy_timeout = 5s` to reduce transient lock failures under contention
//! - `foreign_keys = ON` so submissions cannot outlive their worker

pub mod migrations;
pub mod query;
pub mod registry;
pub mod schema;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime};
use rusqlite::{Connection, types::Type};
use std::{path::Path, time::Duration};

/// Busy timeout used for ledger connections.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open (or create) the ledger SQLite database, apply runtime pragmas, and
/// migrate schema to the latest version.
///
/// # Errors
///
/// Returns an error if opening/configuring/migrating the database fails.
pub fn open_ledger(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create ledger directory {}", parent.display()))?;
    }

    let mut conn = Connection::open(path)
        .with_context(|| format!("open ledger database {}", path.display()))?;

    configure_connection(&conn).context("configure sqlite pragmas")?;
    migrations::migrate(&mut conn).context("apply ledger migrations")?;

    Ok(conn)
}

fn configure_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    let _journal_mode: String =
        conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
    conn.busy_timeout(DEFAULT_BUSY_TIMEOUT)?;
    Ok(())
}

/// Whether the error is SQLite reporting a violated constraint (UNIQUE,
/// CHECK, or foreign key).
pub(crate) fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

// ---------------------------------------------------------------------------
// Timestamp codec
//
// Civil timestamps are stored as microseconds in the `*_at_us` columns. The
// encoding treats the civil value as if it were UTC, which makes it a
// bijection: no ambiguity around DST because no zone is involved.
// ---------------------------------------------------------------------------

pub(crate) fn encode_ts(at: NaiveDateTime) -> i64 {
    at.and_utc().timestamp_micros()
}

pub(crate) fn decode_ts(column: usize, us: i64) -> rusqlite::Result<NaiveDateTime> {
    DateTime::from_timestamp_micros(us)
        .map(|dt| dt.naive_utc())
        .ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                column,
                Type::Integer,
                format!("timestamp {us}us out of range").into(),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_BUSY_TIMEOUT, decode_ts, encode_ts, open_ledger};
    use crate::db::migrations;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn temp_db_path() -> (TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join(".pulse/pulse.db");
        (dir, path)
    }

    #[test]
    fn open_ledger_sets_wal_busy_timeout_and_fk() {
        let (_dir, path) = temp_db_path();
        let conn = open_ledger(&path).expect("open ledger db");

        let journal_mode: String = conn
            .pragma_query_value(None, "journal_mode", |row| row.get(0))
            .expect("query journal_mode");
        assert_eq!(journal_mode.to_ascii_lowercase(), "wal");

        let busy_timeout_ms: u64 = conn
            .pragma_query_value(None, "busy_timeout", |row| row.get(0))
            .expect("query busy_timeout");
        assert_eq!(
            u128::from(busy_timeout_ms),
            DEFAULT_BUSY_TIMEOUT.as_millis()
        );

        let foreign_keys: i64 = conn
            .pragma_query_value(None, "foreign_keys", |row| row.get(0))
            .expect("query foreign_keys");
        assert_eq!(foreign_keys, 1);
    }

    #[test]
    fn open_ledger_creates_parent_dir_and_migrates() {
        let (_dir, path) = temp_db_path();
        let conn = open_ledger(&path).expect("open ledger db");

        let version = migrations::current_schema_version(&conn).expect("schema version query");
        assert_eq!(version, migrations::LATEST_SCHEMA_VERSION);

        let ledger_version: i64 = conn
            .query_row(
                "SELECT schema_version FROM ledger_meta WHERE id = 1",
                [],
                |row| row.get(0),
            )
            .expect("ledger_meta schema version");
        assert_eq!(ledger_version, i64::from(migrations::LATEST_SCHEMA_VERSION));
    }

    #[test]
    fn timestamp_codec_roundtrips() {
        let at = NaiveDate::from_ymd_opt(2026, 3, 14)
            .expect("valid date")
            .and_hms_micro_opt(23, 59, 59, 999_999)
            .expect("valid time");
        let us = encode_ts(at);
        assert_eq!(decode_ts(0, us).expect("decode"), at);
    }

    #[test]
    fn timestamp_decode_rejects_out_of_range() {
        assert!(decode_ts(0, i64::MAX).is_err());
    }
}
