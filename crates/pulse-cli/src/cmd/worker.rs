//! `pulse worker` — the roster: registration and listing.

use std::io::Write;
use std::path::Path;

use anyhow::Result;
use chrono::NaiveDateTime;
use clap::Args;
use pulse_core::db::registry;
use pulse_core::model::{WorkerRecord, WorkerRef};
use serde::Serialize;

use crate::cmd::{effective_at, open_existing_ledger};
use crate::output::{self, OutputMode, render};

/// Arguments for `pulse worker add`.
#[derive(Args, Debug)]
pub struct WorkerAddArgs {
    /// Worker reference as `COMPANY/CODE`, e.g. `ACME/0042`.
    #[arg(value_name = "COMPANY/CODE")]
    pub worker: WorkerRef,

    /// Display name for rosters and reminders.
    #[arg(long, default_value = "")]
    pub name: String,

    /// Registration timestamp (defaults to now).
    #[arg(long, value_name = "TIMESTAMP")]
    pub at: Option<String>,
}

/// Arguments for `pulse worker list`.
#[derive(Args, Debug, Default)]
pub struct WorkerListArgs {}

#[derive(Debug, Serialize)]
struct WorkerAdded {
    id: i64,
    worker: String,
    name: String,
    registered_at: NaiveDateTime,
}

#[derive(Debug, Serialize)]
struct RosterRow {
    id: i64,
    worker: String,
    name: String,
    registered_at: NaiveDateTime,
}

#[derive(Debug, Serialize)]
struct Roster {
    workers: Vec<RosterRow>,
}

/// Execute `pulse worker add`.
pub fn run_worker_add(args: &WorkerAddArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let at = effective_at(args.at.as_deref())?;
    let conn = open_existing_ledger(project_root, output)?;

    let record = registry::register_worker(
        &conn,
        &args.worker.company,
        &args.worker.code,
        &args.name,
        at,
    )
    .map_err(|err| output::fail_with(output, err))?;

    let payload = WorkerAdded {
        id: record.id.0,
        worker: record.handle(),
        name: record.name.clone(),
        registered_at: record.registered_at,
    };

    render(output, &payload, |added, w| {
        if added.name.is_empty() {
            writeln!(w, "✓ registered {} (id {})", added.worker, added.id)
        } else {
            writeln!(
                w,
                "✓ registered {} \"{}\" (id {})",
                added.worker, added.name, added.id
            )
        }
    })
}

/// Execute `pulse worker list`.
pub fn run_worker_list(
    _args: &WorkerListArgs,
    output: OutputMode,
    project_root: &Path,
) -> Result<()> {
    let conn = open_existing_ledger(project_root, output)?;
    let workers = registry::list_workers(&conn).map_err(|err| output::fail_with(output, err))?;

    let payload = Roster {
        workers: workers.iter().map(roster_row).collect(),
    };

    render(output, &payload, |roster, w| {
        if roster.workers.is_empty() {
            writeln!(w, "No workers registered.")?;
            return Ok(());
        }
        for row in &roster.workers {
            writeln!(
                w,
                "{:>4}  {:<20} {}  (since {})",
                row.id,
                row.worker,
                row.name,
                row.registered_at.date()
            )?;
        }
        Ok(())
    })
}

fn roster_row(record: &WorkerRecord) -> RosterRow {
    RosterRow {
        id: record.id.0,
        worker: record.handle(),
        name: record.name.clone(),
        registered_at: record.registered_at,
    }
}
