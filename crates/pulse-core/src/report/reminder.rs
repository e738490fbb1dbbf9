//! The reminder decision: should this worker be nagged right now?

use anyhow::Context;
use chrono::NaiveDateTime;
use rusqlite::Connection;
use serde::Serialize;

use super::kinds_at_stage;
use crate::db::{query, registry};
use crate::error::EngineError;
use crate::model::{FormKind, Stage, WorkerId, WorkerRecord};
use crate::policy::CadencePolicy;

/// Outcome of a reminder check at a given instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReminderDecision {
    /// The window containing the check instant.
    pub stage: Stage,
    /// Required kinds with no entry today at that window.
    pub missing: Vec<FormKind>,
    pub needs_reminder: bool,
}

/// Where reminders go once decided. The engine decides; transports
/// (console, chat webhook, a test recorder) deliver.
pub trait ReminderDispatcher {
    /// Deliver one reminder. Called only for decisions that say to nag.
    ///
    /// # Errors
    ///
    /// Returns an error when delivery fails.
    fn dispatch(
        &mut self,
        worker: &WorkerRecord,
        decision: &ReminderDecision,
    ) -> anyhow::Result<()>;
}

/// Decide whether the worker needs a reminder at `at`.
///
/// Only the window containing `at` is considered; earlier windows are no
/// longer actionable. The check is batch-agnostic on purpose: any entry of
/// a required kind today at the current window silences the nag, whichever
/// batch it was filed under.
///
/// # Errors
///
/// Returns [`EngineError::WorkerNotFound`] or a storage error.
pub fn check(
    conn: &Connection,
    policy: &CadencePolicy,
    worker: WorkerId,
    at: NaiveDateTime,
) -> Result<ReminderDecision, EngineError> {
    let record = registry::require_worker(conn, worker)?;
    decide(conn, policy, &record, at)
}

/// Run the check and hand the decision to `sink` when it says to nag.
///
/// # Errors
///
/// Returns the check's engine errors, or the sink's delivery error.
pub fn check_and_dispatch(
    conn: &Connection,
    policy: &CadencePolicy,
    worker: WorkerId,
    at: NaiveDateTime,
    sink: &mut dyn ReminderDispatcher,
) -> anyhow::Result<ReminderDecision> {
    let record = registry::require_worker(conn, worker)?;
    let decision = decide(conn, policy, &record, at)?;
    if decision.needs_reminder {
        sink.dispatch(&record, &decision).context("dispatch reminder")?;
    }
    Ok(decision)
}

fn decide(
    conn: &Connection,
    policy: &CadencePolicy,
    record: &WorkerRecord,
    at: NaiveDateTime,
) -> Result<ReminderDecision, EngineError> {
    let stage = Stage::of(at);
    let rows = query::on_day(conn, record.id, at.date(), None)?;
    let present = kinds_at_stage(&rows, stage);

    let missing: Vec<FormKind> = policy
        .required(stage)
        .iter()
        .copied()
        .filter(|kind| !present.contains(kind))
        .collect();
    let needs_reminder = !missing.is_empty();

    Ok(ReminderDecision {
        stage,
        missing,
        needs_reminder,
    })
}
