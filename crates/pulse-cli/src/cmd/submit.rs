//! `pulse submit` — file one form into the ledger.
//!
//! The stage defaults to the window containing the submission instant, so
//! a kiosk only ever passes `--worker`, `--form`, and `--data`. Late
//! entries can name an earlier window explicitly with `--stage`, and crews
//! starting a fresh shift pass `--batch` once to roll the cycle forward.

use std::io::Write;
use std::path::Path;

use anyhow::{Context as _, Result};
use chrono::NaiveDateTime;
use clap::Args;
use pulse_core::admission::{self, SubmissionRequest};
use pulse_core::model::{FormKind, Stage, WorkerRef};
use serde::Serialize;

use crate::cmd::{effective_at, open_existing_ledger, resolve_worker};
use crate::output::{self, OutputMode, render};

/// Arguments for `pulse submit`.
#[derive(Args, Debug)]
pub struct SubmitArgs {
    /// Worker reference as `COMPANY/CODE`.
    #[arg(long, value_name = "COMPANY/CODE")]
    pub worker: WorkerRef,

    /// Form kind: `sleep`, `sleepiness`, `visual-fatigue`, or `workload`.
    #[arg(long)]
    pub form: FormKind,

    /// Answers as a JSON document, e.g. '{"score": 3}'.
    #[arg(long, value_name = "JSON")]
    pub data: String,

    /// Stage window to file under (defaults to the window containing the
    /// submission instant).
    #[arg(long)]
    pub stage: Option<Stage>,

    /// Batch to file into (defaults to the worker's current batch).
    #[arg(long)]
    pub batch: Option<u32>,

    /// Submission timestamp (defaults to now).
    #[arg(long, value_name = "TIMESTAMP")]
    pub at: Option<String>,
}

#[derive(Debug, Serialize)]
struct SubmitOutput {
    submission_id: i64,
    worker: String,
    form: FormKind,
    batch: u32,
    stage: Stage,
    seq: u32,
    submitted_at: NaiveDateTime,
}

/// Execute `pulse submit`.
pub fn run_submit(args: &SubmitArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let at = effective_at(args.at.as_deref())?;
    let stage = args.stage.unwrap_or_else(|| Stage::of(at));

    let payload: serde_json::Value = serde_json::from_str(&args.data)
        .with_context(|| format!("--data is not valid JSON: {}", args.data))?;

    let mut conn = open_existing_ledger(project_root, output)?;
    let record = resolve_worker(&conn, &args.worker, output)?;

    let admitted = admission::admit(
        &mut conn,
        &SubmissionRequest {
            worker: record.id,
            kind: args.form,
            batch: args.batch,
            stage,
            payload,
            submitted_at: at,
        },
    )
    .map_err(|err| output::fail_with(output, err))?;

    let payload = SubmitOutput {
        submission_id: admitted.submission_id,
        worker: record.handle(),
        form: args.form,
        batch: admitted.batch,
        stage: admitted.stage,
        seq: admitted.seq,
        submitted_at: at,
    };

    render(output, &payload, |out, w| {
        writeln!(w, "✓ {} recorded for {}", out.form, out.worker)?;
        if out.seq > 1 {
            writeln!(
                w,
                "  batch {}, {} window, repeat entry {}",
                out.batch, out.stage, out.seq
            )
        } else {
            writeln!(w, "  batch {}, {} window", out.batch, out.stage)
        }
    })
}
