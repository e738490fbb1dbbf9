//! `pulse status` — the five-window picture for one worker-day.
//!
//! Shows how each stage window of the day stands against the cadence
//! table, which window the clock is in, and whether that window still
//! needs filling. Day and batch default to "today, current batch"; both
//! can be pinned for audits.

use std::io::Write;
use std::path::Path;

use anyhow::Result;
use clap::Args;
use pulse_core::config;
use pulse_core::model::WorkerRef;
use pulse_core::report::status::{self, StatusReport};
use serde::Serialize;

use crate::cmd::{effective_at, join_kinds, open_existing_ledger, resolve_worker};
use crate::output::{self, OutputMode, render};

/// Arguments for `pulse status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Worker reference as `COMPANY/CODE`.
    #[arg(long, value_name = "COMPANY/CODE")]
    pub worker: WorkerRef,

    /// Pin the report to one batch (defaults to the current batch).
    #[arg(long)]
    pub batch: Option<u32>,

    /// Evaluation instant (defaults to now).
    #[arg(long, value_name = "TIMESTAMP")]
    pub at: Option<String>,
}

#[derive(Debug, Serialize)]
struct StatusOutput {
    worker: String,
    report: StatusReport,
}

/// Execute `pulse status`.
pub fn run_status(args: &StatusArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let at = effective_at(args.at.as_deref())?;
    let policy = config::load_project_config(project_root)?.cadence;

    let conn = open_existing_ledger(project_root, output)?;
    let record = resolve_worker(&conn, &args.worker, output)?;

    let report = status::evaluate(&conn, &policy, record.id, at, args.batch)
        .map_err(|err| output::fail_with(output, err))?;

    let payload = StatusOutput {
        worker: record.handle(),
        report,
    };

    render(output, &payload, |out, w| render_status_human(out, w))
}

fn render_status_human(out: &StatusOutput, w: &mut dyn Write) -> std::io::Result<()> {
    let report = &out.report;

    writeln!(w, "Worker: {}", out.worker)?;
    writeln!(w, "Day:    {} (batch {})", report.date, report.batch)?;
    let fill = if report.needs_fill {
        "still needs filling"
    } else {
        "complete"
    };
    writeln!(
        w,
        "Now:    {} window ({}), {}",
        report.current_stage,
        report.current_stage.window(),
        fill
    )?;
    writeln!(w)?;

    for stage in &report.stages {
        let marker = if stage.is_complete { "✓" } else { "·" };
        let current = if stage.stage == report.current_stage {
            "  <- now"
        } else {
            ""
        };
        let detail = if stage.required.is_empty() {
            "nothing required".to_string()
        } else if stage.is_complete {
            format!("complete ({})", join_kinds(&stage.completed))
        } else {
            format!("missing: {}", join_kinds(&stage.missing))
        };
        writeln!(
            w,
            "  {} {:<13} {}  {}{}",
            marker,
            stage.stage.label(),
            stage.stage.window(),
            detail,
            current
        )?;
    }

    writeln!(w)?;
    writeln!(
        w,
        "Activity: {} total, {} in the last 7 days",
        report.summary.total_submissions, report.summary.last_week_submissions
    )?;
    if let Some(last) = report.summary.last_submitted_at {
        writeln!(w, "Last filed: {last}")?;
    }

    Ok(())
}
