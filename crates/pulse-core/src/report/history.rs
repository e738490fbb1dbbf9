//! The activity aggregator: day-by-day filling history.

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::Connection;
use serde::Serialize;
use std::collections::BTreeSet;

use crate::db::{query, registry};
use crate::error::EngineError;
use crate::model::{FormKind, Stage, WorkerId};

/// Days covered by a history report when the caller does not pick a window.
pub const DEFAULT_WINDOW_DAYS: u32 = 7;

/// One submission in a day's activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub stage: Stage,
    pub kind: FormKind,
    pub batch: u32,
    pub seq: u32,
    pub at: NaiveDateTime,
}

/// One calendar day of activity. Days without submissions appear with empty
/// lists, so a 7-day report always has 7 rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayActivity {
    pub date: NaiveDate,
    /// Distinct stages with at least one entry, in cycle order.
    pub stages_filled: Vec<Stage>,
    /// Entries ordered by stage, then time of filing.
    pub entries: Vec<HistoryEntry>,
}

/// The worker's last `days` calendar days of activity, most recent day
/// first, the day of `today` included.
///
/// # Errors
///
/// Returns [`EngineError::WorkerNotFound`], [`EngineError::Validation`] for
/// a zero-day window, or a storage error.
pub fn history(
    conn: &Connection,
    worker: WorkerId,
    today: NaiveDate,
    days: u32,
) -> Result<Vec<DayActivity>, EngineError> {
    registry::require_worker(conn, worker)?;
    if days == 0 {
        return Err(EngineError::Validation(
            "history window must cover at least one day".into(),
        ));
    }

    let first_day = today
        .checked_sub_days(Days::new(u64::from(days - 1)))
        .ok_or_else(|| {
            EngineError::Validation(format!("history window before {today} out of range"))
        })?;
    let end = today
        .checked_add_days(Days::new(1))
        .ok_or_else(|| EngineError::Validation(format!("date {today} out of range")))?;

    let rows = query::in_window(
        conn,
        worker,
        first_day.and_time(NaiveTime::MIN),
        end.and_time(NaiveTime::MIN),
    )?;

    let mut report = Vec::new();
    for offset in 0..days {
        let Some(date) = today.checked_sub_days(Days::new(u64::from(offset))) else {
            break;
        };

        let mut entries: Vec<HistoryEntry> = rows
            .iter()
            .filter(|row| row.submitted_at.date() == date)
            .map(|row| HistoryEntry {
                stage: row.stage,
                kind: row.kind,
                batch: row.batch,
                seq: row.seq,
                at: row.submitted_at,
            })
            .collect();
        entries.sort_by_key(|entry| (entry.stage, entry.at, entry.seq));

        let stages_filled: Vec<Stage> = entries
            .iter()
            .map(|entry| entry.stage)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        report.push(DayActivity {
            date,
            stages_filled,
            entries,
        });
    }
    Ok(report)
}
