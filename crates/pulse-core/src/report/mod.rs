//! Read-side reports derived from the submission ledger.

pub mod history;
pub mod reminder;
pub mod status;

use std::collections::BTreeSet;

use crate::db::query::SubmissionRow;
use crate::model::{FormKind, Stage};

/// Distinct form kinds filed at `stage` within the given rows.
pub(crate) fn kinds_at_stage(rows: &[SubmissionRow], stage: Stage) -> BTreeSet<FormKind> {
    rows.iter()
        .filter(|row| row.stage == stage)
        .map(|row| row.kind)
        .collect()
}
