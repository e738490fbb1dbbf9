//! `SQLite` query helpers for the submission ledger.
//!
//! All functions take a shared `&Connection` reference and return typed
//! structs (never raw rows). Enum columns decode through the model types,
//! so a corrupted ledger surfaces as a conversion error instead of leaking
//! raw text into reports.

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::{Connection, Row, params, types::Type};
use std::str::FromStr;

use super::{decode_ts, encode_ts};
use crate::error::EngineError;
use crate::model::{FormKind, Stage, WorkerId};

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// A ledger row from the `submissions` table, minus the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionRow {
    pub submission_id: i64,
    pub worker_id: WorkerId,
    pub kind: FormKind,
    pub batch: u32,
    pub stage: Stage,
    pub seq: u32,
    pub submitted_at: NaiveDateTime,
}

const SUBMISSION_COLUMNS: &str =
    "submission_id, worker_id, form_kind, batch, stage, seq, submitted_at_us";

fn row_to_submission(row: &Row<'_>) -> rusqlite::Result<SubmissionRow> {
    let kind_raw: String = row.get(2)?;
    let kind = FormKind::from_str(&kind_raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?;

    let stage_raw: String = row.get(4)?;
    let stage = Stage::from_str(&stage_raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;

    Ok(SubmissionRow {
        submission_id: row.get(0)?,
        worker_id: WorkerId(row.get(1)?),
        kind,
        batch: row.get(3)?,
        stage,
        seq: row.get(5)?,
        submitted_at: decode_ts(6, row.get(6)?)?,
    })
}

fn day_bounds(day: NaiveDate) -> Result<(i64, i64), EngineError> {
    let start = day.and_time(NaiveTime::MIN);
    let next = day
        .checked_add_days(Days::new(1))
        .ok_or_else(|| EngineError::Validation(format!("date {day} out of range")))?;
    Ok((encode_ts(start), encode_ts(next.and_time(NaiveTime::MIN))))
}

// ---------------------------------------------------------------------------
// Batch and sequence lookups
// ---------------------------------------------------------------------------

/// Highest batch the worker has ever submitted under, if any.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn max_batch(conn: &Connection, worker: WorkerId) -> Result<Option<u32>, EngineError> {
    let max: Option<u32> = conn.query_row(
        "SELECT MAX(batch) FROM submissions WHERE worker_id = ?1",
        params![worker.0],
        |row| row.get(0),
    )?;
    Ok(max)
}

/// The batch new submissions default into: the highest batch on record, or
/// batch 1 for a worker with an empty ledger.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn current_batch(conn: &Connection, worker: WorkerId) -> Result<u32, EngineError> {
    Ok(max_batch(conn, worker)?.unwrap_or(1))
}

/// Highest `seq` recorded for the slot family, if any.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn max_seq(
    conn: &Connection,
    worker: WorkerId,
    kind: FormKind,
    batch: u32,
    stage: Stage,
) -> Result<Option<u32>, EngineError> {
    let max: Option<u32> = conn.query_row(
        "SELECT MAX(seq) FROM submissions
         WHERE worker_id = ?1 AND form_kind = ?2 AND batch = ?3 AND stage = ?4",
        params![worker.0, kind.as_str(), batch, stage.as_str()],
        |row| row.get(0),
    )?;
    Ok(max)
}

/// Whether the exact slot (including `seq`) is already recorded.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn seq_taken(
    conn: &Connection,
    worker: WorkerId,
    kind: FormKind,
    batch: u32,
    stage: Stage,
    seq: u32,
) -> Result<bool, EngineError> {
    let taken: bool = conn.query_row(
        "SELECT EXISTS(
            SELECT 1 FROM submissions
            WHERE worker_id = ?1 AND form_kind = ?2 AND batch = ?3
              AND stage = ?4 AND seq = ?5
        )",
        params![worker.0, kind.as_str(), batch, stage.as_str(), seq],
        |row| row.get(0),
    )?;
    Ok(taken)
}

// ---------------------------------------------------------------------------
// Window scans
// ---------------------------------------------------------------------------

/// All of a worker's submissions on the given calendar day, oldest first,
/// optionally restricted to one batch.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn on_day(
    conn: &Connection,
    worker: WorkerId,
    day: NaiveDate,
    batch: Option<u32>,
) -> Result<Vec<SubmissionRow>, EngineError> {
    let (start_us, end_us) = day_bounds(day)?;

    let mut rows = Vec::new();
    if let Some(batch) = batch {
        let sql = format!(
            "SELECT {SUBMISSION_COLUMNS} FROM submissions
             WHERE worker_id = ?1 AND submitted_at_us >= ?2 AND submitted_at_us < ?3
               AND batch = ?4
             ORDER BY submitted_at_us ASC, submission_id ASC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let mapped = stmt.query_map(
            params![worker.0, start_us, end_us, batch],
            row_to_submission,
        )?;
        for row in mapped {
            rows.push(row?);
        }
    } else {
        let sql = format!(
            "SELECT {SUBMISSION_COLUMNS} FROM submissions
             WHERE worker_id = ?1 AND submitted_at_us >= ?2 AND submitted_at_us < ?3
             ORDER BY submitted_at_us ASC, submission_id ASC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let mapped = stmt.query_map(params![worker.0, start_us, end_us], row_to_submission)?;
        for row in mapped {
            rows.push(row?);
        }
    }
    Ok(rows)
}

/// All of a worker's submissions in the half-open window `[from, until)`,
/// oldest first.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn in_window(
    conn: &Connection,
    worker: WorkerId,
    from: NaiveDateTime,
    until: NaiveDateTime,
) -> Result<Vec<SubmissionRow>, EngineError> {
    let sql = format!(
        "SELECT {SUBMISSION_COLUMNS} FROM submissions
         WHERE worker_id = ?1 AND submitted_at_us >= ?2 AND submitted_at_us < ?3
         ORDER BY submitted_at_us ASC, submission_id ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let mapped = stmt.query_map(
        params![worker.0, encode_ts(from), encode_ts(until)],
        row_to_submission,
    )?;

    let mut rows = Vec::new();
    for row in mapped {
        rows.push(row?);
    }
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Activity counters
// ---------------------------------------------------------------------------

/// Total submissions ever recorded for the worker.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn count_all(conn: &Connection, worker: WorkerId) -> Result<u64, EngineError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM submissions WHERE worker_id = ?1",
        params![worker.0],
        |row| row.get(0),
    )?;
    Ok(u64::try_from(count).unwrap_or(0))
}

/// Submissions at or after `since`.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn count_since(
    conn: &Connection,
    worker: WorkerId,
    since: NaiveDateTime,
) -> Result<u64, EngineError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM submissions WHERE worker_id = ?1 AND submitted_at_us >= ?2",
        params![worker.0, encode_ts(since)],
        |row| row.get(0),
    )?;
    Ok(u64::try_from(count).unwrap_or(0))
}

/// The worker's most recent submission, if any. Ties on timestamp resolve
/// to the later ledger row.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn latest(conn: &Connection, worker: WorkerId) -> Result<Option<SubmissionRow>, EngineError> {
    let sql = format!(
        "SELECT {SUBMISSION_COLUMNS} FROM submissions
         WHERE worker_id = ?1
         ORDER BY submitted_at_us DESC, submission_id DESC
         LIMIT 1"
    );
    match conn.query_row(&sql, params![worker.0], row_to_submission) {
        Ok(row) => Ok(Some(row)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}
