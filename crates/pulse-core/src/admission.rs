//! Admission control for the submission ledger.
//!
//! Admission never rejects a resubmission. A duplicate of an already-filled
//! slot is renumbered onto the next free `seq` in its slot family and
//! appended, so the ledger keeps every attempt in arrival order. Batch
//! inference, seq assignment, and the insert all happen inside one immediate
//! transaction: two racing writers serialize at `BEGIN IMMEDIATE`, and each
//! sees the rows the other committed. The slot UNIQUE constraint backstops
//! whatever still collides; one renumber retry runs before the race is
//! reported as [`EngineError::Conflict`].

use chrono::NaiveDateTime;
use rusqlite::{Connection, TransactionBehavior, params};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::db::{encode_ts, is_constraint_violation, query, registry};
use crate::error::EngineError;
use crate::model::{FormKind, Stage, WorkerId};

/// A submission presented for admission.
#[derive(Debug, Clone)]
pub struct SubmissionRequest {
    pub worker: WorkerId,
    pub kind: FormKind,
    /// Target batch; `None` files into the worker's current batch.
    pub batch: Option<u32>,
    /// Stage window to file under. Callers filing "now" pass the window
    /// containing `submitted_at`; a late entry may name an earlier window.
    pub stage: Stage,
    pub payload: Value,
    pub submitted_at: NaiveDateTime,
}

/// Where an admitted submission landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AdmittedSubmission {
    pub submission_id: i64,
    pub batch: u32,
    pub stage: Stage,
    pub seq: u32,
}

/// Admit a submission into the ledger.
///
/// Returns the slot it landed in: the requested batch (or the worker's
/// current batch), the requested stage, and the assigned `seq`. `seq` is 1
/// for the first entry in a slot family and `max + 1` for every repeat.
///
/// # Errors
///
/// - [`EngineError::WorkerNotFound`] when the worker id is unregistered
/// - [`EngineError::Validation`] for an empty payload or a zero batch
/// - [`EngineError::Conflict`] when a concurrent writer claimed the slot
///   and the single renumber retry lost as well
/// - [`EngineError::Storage`] on SQLite failure
pub fn admit(
    conn: &mut Connection,
    req: &SubmissionRequest,
) -> Result<AdmittedSubmission, EngineError> {
    validate(req)?;
    let payload_text = req.payload.to_string();

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    registry::require_worker(&tx, req.worker)?;

    let batch = match req.batch {
        Some(batch) => batch,
        None => query::current_batch(&tx, req.worker)?,
    };

    let mut seq = next_seq(&tx, req, batch)?;
    let submission_id = match insert_slot(&tx, req, batch, seq, &payload_text) {
        Ok(id) => id,
        Err(EngineError::Storage(e)) if is_constraint_violation(&e) => {
            warn!(
                worker = %req.worker,
                kind = %req.kind,
                batch,
                stage = %req.stage,
                seq,
                "slot claimed concurrently, renumbering"
            );
            seq = next_seq(&tx, req, batch)?;
            match insert_slot(&tx, req, batch, seq, &payload_text) {
                Ok(id) => id,
                Err(EngineError::Storage(e2)) if is_constraint_violation(&e2) => {
                    return Err(EngineError::Conflict {
                        worker: req.worker,
                        kind: req.kind,
                        batch,
                        stage: req.stage,
                        seq,
                    });
                }
                Err(other) => return Err(other),
            }
        }
        Err(other) => return Err(other),
    };
    tx.commit()?;

    debug!(
        worker = %req.worker,
        kind = %req.kind,
        batch,
        stage = %req.stage,
        seq,
        "admitted submission"
    );
    Ok(AdmittedSubmission {
        submission_id,
        batch,
        stage: req.stage,
        seq,
    })
}

fn validate(req: &SubmissionRequest) -> Result<(), EngineError> {
    if req.batch == Some(0) {
        return Err(EngineError::Validation("batch must be at least 1".into()));
    }

    let empty = match &req.payload {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    };
    if empty {
        return Err(EngineError::Validation(
            "payload must carry at least one answer".into(),
        ));
    }
    Ok(())
}

/// Sequence the submission would claim: 1 when the family is untouched,
/// otherwise one past the family's highest `seq`.
fn next_seq(conn: &Connection, req: &SubmissionRequest, batch: u32) -> Result<u32, EngineError> {
    if query::seq_taken(conn, req.worker, req.kind, batch, req.stage, 1)? {
        let max = query::max_seq(conn, req.worker, req.kind, batch, req.stage)?.unwrap_or(0);
        Ok(max + 1)
    } else {
        Ok(1)
    }
}

fn insert_slot(
    conn: &Connection,
    req: &SubmissionRequest,
    batch: u32,
    seq: u32,
    payload: &str,
) -> Result<i64, EngineError> {
    conn.execute(
        "INSERT INTO submissions
             (worker_id, form_kind, batch, stage, seq, submitted_at_us, payload)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            req.worker.0,
            req.kind.as_str(),
            batch,
            req.stage.as_str(),
            seq,
            encode_ts(req.submitted_at),
            payload
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

// ---------------------------------------------------------------------------
// Forms due
// ---------------------------------------------------------------------------

/// The form kinds a worker is expected to file, and the batch they file
/// into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormsDue {
    pub batch: u32,
    /// True until the worker's first submission lands.
    pub first_cycle: bool,
    pub kinds: Vec<FormKind>,
}

/// Which forms the worker should file, based on whether they have submitted
/// before. The catalog flags decide first-cycle vs repeat collection.
///
/// # Errors
///
/// Returns [`EngineError::WorkerNotFound`] or a storage error.
pub fn forms_due(conn: &Connection, worker: WorkerId) -> Result<FormsDue, EngineError> {
    registry::require_worker(conn, worker)?;

    let max = query::max_batch(conn, worker)?;
    let first_cycle = max.is_none();
    let kinds = FormKind::ALL
        .into_iter()
        .filter(|kind| {
            if first_cycle {
                kind.on_first_batch()
            } else {
                kind.on_repeat_batch()
            }
        })
        .collect();

    Ok(FormsDue {
        batch: max.unwrap_or(1),
        first_cycle,
        kinds,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations;
    use chrono::NaiveDate;
    use serde_json::json;

    fn ledger_with_worker() -> (Connection, WorkerId) {
        let mut conn = Connection::open_in_memory().expect("open in-memory db");
        migrations::migrate(&mut conn).expect("migrate");
        let worker = registry::register_worker(&conn, "ACME", "0042", "Lin Wei", at(8, 50))
            .expect("register")
            .id;
        (conn, worker)
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 10)
            .expect("valid date")
            .and_hms_opt(h, m, 0)
            .expect("valid time")
    }

    fn request(worker: WorkerId, kind: FormKind, stage: Stage) -> SubmissionRequest {
        SubmissionRequest {
            worker,
            kind,
            batch: None,
            stage,
            payload: json!({"score": 4}),
            submitted_at: at(9, 0),
        }
    }

    #[test]
    fn first_admission_lands_at_seq_one_batch_one() {
        let (mut conn, worker) = ledger_with_worker();

        let admitted =
            admit(&mut conn, &request(worker, FormKind::Sleep, Stage::Morning)).expect("admit");
        assert_eq!(admitted.batch, 1);
        assert_eq!(admitted.stage, Stage::Morning);
        assert_eq!(admitted.seq, 1);
    }

    #[test]
    fn duplicates_are_renumbered_not_rejected() {
        let (mut conn, worker) = ledger_with_worker();
        let req = request(worker, FormKind::Sleepiness, Stage::Midday);

        let seqs: Vec<u32> = (0..3)
            .map(|_| admit(&mut conn, &req).expect("admit").seq)
            .collect();
        assert_eq!(seqs, [1, 2, 3]);

        let rows = query::on_day(&conn, worker, at(9, 0).date(), None).expect("rows");
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn slot_families_are_independent() {
        let (mut conn, worker) = ledger_with_worker();

        let a = admit(&mut conn, &request(worker, FormKind::Sleepiness, Stage::Morning))
            .expect("admit");
        let b = admit(&mut conn, &request(worker, FormKind::Sleepiness, Stage::Midday))
            .expect("admit");
        let c = admit(&mut conn, &request(worker, FormKind::VisualFatigue, Stage::Morning))
            .expect("admit");

        // Different stage or kind never renumbers.
        assert_eq!([a.seq, b.seq, c.seq], [1, 1, 1]);
    }

    #[test]
    fn batch_defaults_to_the_highest_on_record() {
        let (mut conn, worker) = ledger_with_worker();

        let mut early = request(worker, FormKind::Sleep, Stage::Morning);
        early.batch = Some(4);
        admit(&mut conn, &early).expect("admit into batch 4");

        let inferred = admit(&mut conn, &request(worker, FormKind::Sleepiness, Stage::Morning))
            .expect("admit");
        assert_eq!(inferred.batch, 4);
    }

    #[test]
    fn explicit_batch_is_respected() {
        let (mut conn, worker) = ledger_with_worker();

        let mut req = request(worker, FormKind::Sleep, Stage::Morning);
        req.batch = Some(2);
        let admitted = admit(&mut conn, &req).expect("admit");
        assert_eq!(admitted.batch, 2);

        // Same family in batch 1 is still untouched.
        req.batch = Some(1);
        let admitted = admit(&mut conn, &req).expect("admit");
        assert_eq!(admitted.seq, 1);
    }

    #[test]
    fn zero_batch_is_rejected() {
        let (mut conn, worker) = ledger_with_worker();
        let mut req = request(worker, FormKind::Sleep, Stage::Morning);
        req.batch = Some(0);

        let err = admit(&mut conn, &req).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn unknown_worker_is_rejected() {
        let (mut conn, _) = ledger_with_worker();
        let err = admit(&mut conn, &request(WorkerId(99), FormKind::Sleep, Stage::Morning))
            .unwrap_err();
        assert!(matches!(err, EngineError::WorkerNotFound(WorkerId(99))));
    }

    #[test]
    fn empty_payloads_are_rejected() {
        let (mut conn, worker) = ledger_with_worker();

        for payload in [json!(null), json!({}), json!([]), json!("")] {
            let mut req = request(worker, FormKind::Sleep, Stage::Morning);
            req.payload = payload.clone();
            let err = admit(&mut conn, &req).unwrap_err();
            assert!(
                matches!(err, EngineError::Validation(_)),
                "payload {payload} should be rejected"
            );
        }
    }

    #[test]
    fn scalar_payloads_are_accepted() {
        let (mut conn, worker) = ledger_with_worker();

        let mut req = request(worker, FormKind::Sleepiness, Stage::Morning);
        req.payload = json!(7);
        admit(&mut conn, &req).expect("numeric payload");
    }

    #[test]
    fn payload_is_persisted_verbatim() {
        let (mut conn, worker) = ledger_with_worker();

        let mut req = request(worker, FormKind::Workload, Stage::Night);
        req.payload = json!({"mental": 60, "physical": 35, "note": "long shift"});
        let admitted = admit(&mut conn, &req).expect("admit");

        let stored: String = conn
            .query_row(
                "SELECT payload FROM submissions WHERE submission_id = ?1",
                params![admitted.submission_id],
                |row| row.get(0),
            )
            .expect("read payload");
        let stored: Value = serde_json::from_str(&stored).expect("stored payload parses");
        assert_eq!(stored, req.payload);
    }

    #[test]
    fn late_entry_may_name_an_earlier_stage() {
        let (mut conn, worker) = ledger_with_worker();

        // Filed at 15:10 but for the morning window.
        let req = SubmissionRequest {
            worker,
            kind: FormKind::Sleep,
            batch: None,
            stage: Stage::Morning,
            payload: json!({"hours": 6.5}),
            submitted_at: at(15, 10),
        };
        let admitted = admit(&mut conn, &req).expect("admit");
        assert_eq!(admitted.stage, Stage::Morning);
    }

    #[test]
    fn forms_due_distinguishes_first_cycle() {
        let (mut conn, worker) = ledger_with_worker();

        let due = forms_due(&conn, worker).expect("forms_due");
        assert!(due.first_cycle);
        assert_eq!(due.batch, 1);
        assert_eq!(due.kinds, FormKind::ALL);

        admit(&mut conn, &request(worker, FormKind::Sleep, Stage::Morning)).expect("admit");

        let due = forms_due(&conn, worker).expect("forms_due");
        assert!(!due.first_cycle);
        assert_eq!(due.batch, 1);
        // The shipped catalog keeps collecting every kind on repeats.
        assert_eq!(due.kinds, FormKind::ALL);
    }

    #[test]
    fn forms_due_requires_a_registered_worker() {
        let (conn, _) = ledger_with_worker();
        let err = forms_due(&conn, WorkerId(99)).unwrap_err();
        assert!(matches!(err, EngineError::WorkerNotFound(_)));
    }
}
