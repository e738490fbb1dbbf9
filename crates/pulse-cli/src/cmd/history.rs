//! `pulse history` — recent activity, day by day.

use std::io::Write;
use std::path::Path;

use anyhow::Result;
use clap::Args;
use pulse_core::model::WorkerRef;
use pulse_core::report::history::{self, DayActivity};
use serde::Serialize;

use crate::cmd::{effective_day, open_existing_ledger, resolve_worker};
use crate::output::{self, OutputMode, render};

/// Arguments for `pulse history`.
#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Worker reference as `COMPANY/CODE`.
    #[arg(long, value_name = "COMPANY/CODE")]
    pub worker: WorkerRef,

    /// Days to cover, most recent first.
    #[arg(long, default_value_t = history::DEFAULT_WINDOW_DAYS)]
    pub days: u32,

    /// Last day of the window (defaults to today).
    #[arg(long, value_name = "DATE")]
    pub until: Option<String>,
}

#[derive(Debug, Serialize)]
struct HistoryOutput {
    worker: String,
    days: Vec<DayActivity>,
}

/// Execute `pulse history`.
pub fn run_history(args: &HistoryArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let until = effective_day(args.until.as_deref())?;

    let conn = open_existing_ledger(project_root, output)?;
    let record = resolve_worker(&conn, &args.worker, output)?;

    let days = history::history(&conn, record.id, until, args.days)
        .map_err(|err| output::fail_with(output, err))?;

    let payload = HistoryOutput {
        worker: record.handle(),
        days,
    };

    render(output, &payload, |out, w| render_history_human(out, w))
}

fn render_history_human(out: &HistoryOutput, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(w, "History for {} ({} days)", out.worker, out.days.len())?;
    writeln!(w)?;

    for day in &out.days {
        if day.entries.is_empty() {
            writeln!(w, "{}  (no entries)", day.date)?;
            continue;
        }

        let stages = day
            .stages_filled
            .iter()
            .map(|stage| stage.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        writeln!(w, "{}  {}", day.date, stages)?;
        for entry in &day.entries {
            writeln!(
                w,
                "    {}  {} (batch {}, entry {})",
                entry.at.format("%H:%M"),
                entry.kind,
                entry.batch,
                entry.seq
            )?;
        }
    }

    Ok(())
}
