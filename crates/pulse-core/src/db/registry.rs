//! Worker registry: registration and lookup.
//!
//! Workers are keyed by an opaque ledger row id; the `company/code` pair is
//! the human-facing handle and is unique across the ledger.

use chrono::NaiveDateTime;
use rusqlite::{Connection, Row, params};
use tracing::info;

use super::{decode_ts, encode_ts, is_constraint_violation};
use crate::error::EngineError;
use crate::model::{WorkerId, WorkerRecord, WorkerRef};

const WORKER_COLUMNS: &str = "worker_id, company_code, worker_code, name, registered_at_us";

fn row_to_worker(row: &Row<'_>) -> rusqlite::Result<WorkerRecord> {
    Ok(WorkerRecord {
        id: WorkerId(row.get(0)?),
        company: row.get(1)?,
        code: row.get(2)?,
        name: row.get(3)?,
        registered_at: decode_ts(4, row.get(4)?)?,
    })
}

/// Register a new worker.
///
/// # Errors
///
/// Returns [`EngineError::Validation`] when company or code is blank or the
/// pair is already registered, [`EngineError::Storage`] on SQLite failure.
pub fn register_worker(
    conn: &Connection,
    company: &str,
    code: &str,
    name: &str,
    registered_at: NaiveDateTime,
) -> Result<WorkerRecord, EngineError> {
    let company = company.trim();
    let code = code.trim();
    if company.is_empty() || code.is_empty() {
        return Err(EngineError::Validation(
            "company and worker codes must be non-empty".into(),
        ));
    }

    let inserted = conn.execute(
        "INSERT INTO workers (company_code, worker_code, name, registered_at_us)
         VALUES (?1, ?2, ?3, ?4)",
        params![company, code, name.trim(), encode_ts(registered_at)],
    );
    match inserted {
        Ok(_) => {}
        Err(e) if is_constraint_violation(&e) => {
            return Err(EngineError::Validation(format!(
                "worker '{company}/{code}' is already registered"
            )));
        }
        Err(e) => return Err(e.into()),
    }

    let record = WorkerRecord {
        id: WorkerId(conn.last_insert_rowid()),
        company: company.to_string(),
        code: code.to_string(),
        name: name.trim().to_string(),
        registered_at,
    };
    info!(worker = %record.handle(), id = %record.id, "registered worker");
    Ok(record)
}

/// Fetch a worker by ledger id. Returns `None` when the id is unknown.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn get_worker(conn: &Connection, id: WorkerId) -> Result<Option<WorkerRecord>, EngineError> {
    let sql = format!("SELECT {WORKER_COLUMNS} FROM workers WHERE worker_id = ?1");
    match conn.query_row(&sql, params![id.0], row_to_worker) {
        Ok(record) => Ok(Some(record)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Fetch a worker by id, failing with [`EngineError::WorkerNotFound`] when
/// the id is unknown.
///
/// # Errors
///
/// Returns [`EngineError::WorkerNotFound`] or a storage error.
pub fn require_worker(conn: &Connection, id: WorkerId) -> Result<WorkerRecord, EngineError> {
    get_worker(conn, id)?.ok_or(EngineError::WorkerNotFound(id))
}

/// Fetch a worker by `company/code` pair. Returns `None` when unregistered.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn find_worker(
    conn: &Connection,
    wref: &WorkerRef,
) -> Result<Option<WorkerRecord>, EngineError> {
    let sql = format!(
        "SELECT {WORKER_COLUMNS} FROM workers WHERE company_code = ?1 AND worker_code = ?2"
    );
    match conn.query_row(&sql, params![wref.company, wref.code], row_to_worker) {
        Ok(record) => Ok(Some(record)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Resolve a `company/code` reference to the registered worker, failing
/// with [`EngineError::WorkerRefNotFound`] when unregistered.
///
/// # Errors
///
/// Returns [`EngineError::WorkerRefNotFound`] or a storage error.
pub fn resolve_ref(conn: &Connection, wref: &WorkerRef) -> Result<WorkerRecord, EngineError> {
    find_worker(conn, wref)?.ok_or_else(|| EngineError::WorkerRefNotFound(wref.clone()))
}

/// All registered workers, ordered by company then code.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_workers(conn: &Connection) -> Result<Vec<WorkerRecord>, EngineError> {
    let sql = format!(
        "SELECT {WORKER_COLUMNS} FROM workers ORDER BY company_code ASC, worker_code ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let mapped = stmt.query_map([], row_to_worker)?;

    let mut workers = Vec::new();
    for row in mapped {
        workers.push(row?);
    }
    Ok(workers)
}
