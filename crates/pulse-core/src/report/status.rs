//! The completion evaluator: where one worker-day stands against the
//! cadence policy.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use serde::Serialize;
use std::collections::BTreeSet;

use super::kinds_at_stage;
use crate::db::{query, registry};
use crate::error::EngineError;
use crate::model::{FormKind, Stage, WorkerId};
use crate::policy::CadencePolicy;

/// How one stage window stands against the policy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageCompletion {
    pub stage: Stage,
    pub required: Vec<FormKind>,
    pub completed: Vec<FormKind>,
    pub missing: Vec<FormKind>,
    pub is_complete: bool,
    pub completion_ratio: f64,
}

impl StageCompletion {
    /// Evaluate one stage window against the kinds present in it.
    ///
    /// `completed` and `missing` keep the policy's report order. Kinds
    /// present but not required in this window do not count toward the
    /// ratio. A window requiring nothing is complete by definition,
    /// ratio 1.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn against(policy: &CadencePolicy, stage: Stage, present: &BTreeSet<FormKind>) -> Self {
        let required: Vec<FormKind> = policy.required(stage).to_vec();
        let completed: Vec<FormKind> = required
            .iter()
            .copied()
            .filter(|kind| present.contains(kind))
            .collect();
        let missing: Vec<FormKind> = required
            .iter()
            .copied()
            .filter(|kind| !present.contains(kind))
            .collect();

        let is_complete = missing.is_empty();
        let completion_ratio = if required.is_empty() {
            1.0
        } else {
            completed.len() as f64 / required.len() as f64
        };

        Self {
            stage,
            required,
            completed,
            missing,
            is_complete,
            completion_ratio,
        }
    }
}

/// Lifetime and trailing-week activity counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivitySummary {
    pub total_submissions: u64,
    pub last_week_submissions: u64,
    pub last_submitted_at: Option<NaiveDateTime>,
}

/// The full five-window picture for one worker-day and batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    pub worker: WorkerId,
    pub date: NaiveDate,
    pub batch: u32,
    pub current_stage: Stage,
    /// True only when the window containing the evaluation instant is
    /// incomplete. Gaps in earlier windows show in their `missing` lists
    /// but are no longer actionable.
    pub needs_fill: bool,
    pub stages: Vec<StageCompletion>,
    pub summary: ActivitySummary,
}

/// Evaluate a worker's day against the cadence policy.
///
/// The report covers the calendar day containing `at`, restricted to one
/// batch: the worker's current batch unless `batch` pins one. Repeats of a
/// kind within a window count once.
///
/// # Errors
///
/// Returns [`EngineError::WorkerNotFound`], [`EngineError::Validation`] for
/// a zero batch, or a storage error.
pub fn evaluate(
    conn: &Connection,
    policy: &CadencePolicy,
    worker: WorkerId,
    at: NaiveDateTime,
    batch: Option<u32>,
) -> Result<StatusReport, EngineError> {
    registry::require_worker(conn, worker)?;
    if batch == Some(0) {
        return Err(EngineError::Validation("batch must be at least 1".into()));
    }

    let batch = match batch {
        Some(batch) => batch,
        None => query::current_batch(conn, worker)?,
    };

    let rows = query::on_day(conn, worker, at.date(), Some(batch))?;
    let stages: Vec<StageCompletion> = Stage::ALL
        .into_iter()
        .map(|stage| StageCompletion::against(policy, stage, &kinds_at_stage(&rows, stage)))
        .collect();

    let current_stage = Stage::of(at);
    let needs_fill = !stages[current_stage.index()].is_complete;

    let week_ago = at
        .checked_sub_signed(Duration::days(7))
        .unwrap_or(NaiveDateTime::MIN);
    let summary = ActivitySummary {
        total_submissions: query::count_all(conn, worker)?,
        last_week_submissions: query::count_since(conn, worker, week_ago)?,
        last_submitted_at: query::latest(conn, worker)?.map(|row| row.submitted_at),
    };

    Ok(StatusReport {
        worker,
        date: at.date(),
        batch,
        current_stage,
        needs_fill,
        stages,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admission::{self, SubmissionRequest};
    use crate::db::migrations;
    use chrono::NaiveDate;
    use serde_json::json;

    fn ledger_with_worker() -> (Connection, WorkerId) {
        let mut conn = Connection::open_in_memory().expect("open in-memory db");
        migrations::migrate(&mut conn).expect("migrate");
        let worker = registry::register_worker(
            &conn,
            "ACME",
            "0042",
            "Lin Wei",
            day(9).and_hms_opt(8, 0, 0).expect("valid time"),
        )
        .expect("register")
        .id;
        (conn, worker)
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).expect("valid date")
    }

    fn file(
        conn: &mut Connection,
        worker: WorkerId,
        kind: FormKind,
        stage: Stage,
        batch: Option<u32>,
        at: NaiveDateTime,
    ) {
        admission::admit(
            conn,
            &SubmissionRequest {
                worker,
                kind,
                batch,
                stage,
                payload: json!({"score": 3}),
                submitted_at: at,
            },
        )
        .expect("admit");
    }

    fn at(d: u32, h: u32, m: u32) -> NaiveDateTime {
        day(d).and_hms_opt(h, m, 0).expect("valid time")
    }

    fn policy() -> CadencePolicy {
        CadencePolicy::default()
    }

    #[test]
    fn report_covers_all_five_windows_in_order() {
        let (conn, worker) = ledger_with_worker();
        let report =
            evaluate(&conn, &policy(), worker, at(10, 9, 0), None).expect("evaluate");

        let stages: Vec<Stage> = report.stages.iter().map(|s| s.stage).collect();
        assert_eq!(stages, Stage::ALL);
        assert_eq!(report.batch, 1);
        assert_eq!(report.date, day(10));
    }

    #[test]
    fn fresh_day_needs_fill_at_the_current_window() {
        let (conn, worker) = ledger_with_worker();
        let report =
            evaluate(&conn, &policy(), worker, at(10, 9, 0), None).expect("evaluate");

        assert_eq!(report.current_stage, Stage::Morning);
        assert!(report.needs_fill);

        let morning = &report.stages[0];
        assert!(!morning.is_complete);
        assert_eq!(morning.missing, morning.required);
        assert!((morning.completion_ratio - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn partial_window_reports_ratio_and_missing() {
        let (mut conn, worker) = ledger_with_worker();
        file(&mut conn, worker, FormKind::Sleep, Stage::Morning, None, at(10, 8, 10));
        file(&mut conn, worker, FormKind::Sleepiness, Stage::Morning, None, at(10, 8, 15));

        let report =
            evaluate(&conn, &policy(), worker, at(10, 9, 0), None).expect("evaluate");
        let morning = &report.stages[0];

        assert_eq!(morning.completed, [FormKind::Sleep, FormKind::Sleepiness]);
        assert_eq!(morning.missing, [FormKind::VisualFatigue]);
        assert!(!morning.is_complete);
        assert!((morning.completion_ratio - 2.0 / 3.0).abs() < f64::EPSILON);
        assert!(report.needs_fill);
    }

    #[test]
    fn complete_window_clears_needs_fill() {
        let (mut conn, worker) = ledger_with_worker();
        for kind in [FormKind::Sleep, FormKind::Sleepiness, FormKind::VisualFatigue] {
            file(&mut conn, worker, kind, Stage::Morning, None, at(10, 8, 30));
        }

        let report =
            evaluate(&conn, &policy(), worker, at(10, 9, 0), None).expect("evaluate");
        assert!(!report.needs_fill);
        assert!(report.stages[0].is_complete);
        assert!((report.stages[0].completion_ratio - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn earlier_window_gap_does_not_set_needs_fill() {
        let (mut conn, worker) = ledger_with_worker();
        // Morning never filled; midday fully filled. Evaluated at 12:30.
        for kind in [FormKind::Sleepiness, FormKind::VisualFatigue] {
            file(&mut conn, worker, kind, Stage::Midday, None, at(10, 12, 5));
        }

        let report =
            evaluate(&conn, &policy(), worker, at(10, 12, 30), None).expect("evaluate");
        assert_eq!(report.current_stage, Stage::Midday);
        assert!(!report.needs_fill, "morning gap is not actionable at midday");
        assert!(!report.stages[0].is_complete, "the gap still shows");
    }

    #[test]
    fn repeats_count_once() {
        let (mut conn, worker) = ledger_with_worker();
        for _ in 0..3 {
            file(&mut conn, worker, FormKind::Sleepiness, Stage::Midday, None, at(10, 12, 10));
        }

        let report =
            evaluate(&conn, &policy(), worker, at(10, 12, 30), None).expect("evaluate");
        let midday = &report.stages[1];
        assert_eq!(midday.completed, [FormKind::Sleepiness]);
        assert_eq!(midday.missing, [FormKind::VisualFatigue]);
        assert!((midday.completion_ratio - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn unrequired_kinds_do_not_inflate_the_ratio() {
        let (mut conn, worker) = ledger_with_worker();
        // Workload is not part of the midday table.
        file(&mut conn, worker, FormKind::Workload, Stage::Midday, None, at(10, 12, 10));

        let report =
            evaluate(&conn, &policy(), worker, at(10, 12, 30), None).expect("evaluate");
        let midday = &report.stages[1];
        assert!(midday.completed.is_empty());
        assert!((midday.completion_ratio - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn evaluation_is_scoped_to_one_day() {
        let (mut conn, worker) = ledger_with_worker();
        for kind in [FormKind::Sleep, FormKind::Sleepiness, FormKind::VisualFatigue] {
            file(&mut conn, worker, kind, Stage::Morning, None, at(9, 8, 30));
        }

        // Yesterday's complete morning does not carry into today.
        let report =
            evaluate(&conn, &policy(), worker, at(10, 9, 0), None).expect("evaluate");
        assert!(report.needs_fill);
        assert!(report.stages[0].completed.is_empty());
    }

    #[test]
    fn evaluation_is_scoped_to_one_batch() {
        let (mut conn, worker) = ledger_with_worker();
        // Batch 1 filled the morning; the worker has since moved to batch 2.
        for kind in [FormKind::Sleep, FormKind::Sleepiness, FormKind::VisualFatigue] {
            file(&mut conn, worker, kind, Stage::Morning, Some(1), at(10, 7, 0));
        }
        file(&mut conn, worker, FormKind::Sleepiness, Stage::Morning, Some(2), at(10, 8, 0));

        let current = evaluate(&conn, &policy(), worker, at(10, 9, 0), None).expect("evaluate");
        assert_eq!(current.batch, 2);
        assert_eq!(current.stages[0].completed, [FormKind::Sleepiness]);
        assert!(current.needs_fill);

        let pinned =
            evaluate(&conn, &policy(), worker, at(10, 9, 0), Some(1)).expect("evaluate");
        assert!(pinned.stages[0].is_complete);
        assert!(!pinned.needs_fill);
    }

    #[test]
    fn summary_counts_lifetime_and_trailing_week() {
        let (mut conn, worker) = ledger_with_worker();
        file(&mut conn, worker, FormKind::Sleep, Stage::Morning, None, at(1, 8, 0));
        file(&mut conn, worker, FormKind::Sleep, Stage::Morning, None, at(9, 8, 0));
        file(&mut conn, worker, FormKind::Sleepiness, Stage::Morning, None, at(10, 8, 5));

        let report =
            evaluate(&conn, &policy(), worker, at(10, 9, 0), None).expect("evaluate");
        assert_eq!(report.summary.total_submissions, 3);
        assert_eq!(report.summary.last_week_submissions, 2);
        assert_eq!(report.summary.last_submitted_at, Some(at(10, 8, 5)));
    }

    #[test]
    fn empty_policy_window_is_complete() {
        let (conn, worker) = ledger_with_worker();
        let quiet = CadencePolicy {
            midday: Vec::new(),
            ..CadencePolicy::default()
        };

        let report = evaluate(&conn, &quiet, worker, at(10, 12, 30), None).expect("evaluate");
        let midday = &report.stages[1];
        assert!(midday.is_complete);
        assert!((midday.completion_ratio - 1.0).abs() < f64::EPSILON);
        assert!(!report.needs_fill);
    }

    #[test]
    fn unknown_worker_and_zero_batch_are_rejected() {
        let (conn, _) = ledger_with_worker();

        let err = evaluate(&conn, &policy(), WorkerId(99), at(10, 9, 0), None).unwrap_err();
        assert!(matches!(err, EngineError::WorkerNotFound(_)));

        let (conn, worker) = ledger_with_worker();
        let err = evaluate(&conn, &policy(), worker, at(10, 9, 0), Some(0)).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }
}
