//! `pulse forms` — which forms a worker should file right now.

use std::io::Write;
use std::path::Path;

use anyhow::Result;
use clap::Args;
use pulse_core::admission;
use pulse_core::model::{FormKind, WorkerRef};
use serde::Serialize;

use crate::cmd::{open_existing_ledger, resolve_worker};
use crate::output::{self, OutputMode, render};

/// Arguments for `pulse forms`.
#[derive(Args, Debug)]
pub struct FormsArgs {
    /// Worker reference as `COMPANY/CODE`.
    #[arg(long, value_name = "COMPANY/CODE")]
    pub worker: WorkerRef,
}

#[derive(Debug, Serialize)]
struct FormRow {
    form: FormKind,
    label: &'static str,
}

#[derive(Debug, Serialize)]
struct FormsOutput {
    worker: String,
    batch: u32,
    first_cycle: bool,
    forms: Vec<FormRow>,
}

/// Execute `pulse forms`.
pub fn run_forms(args: &FormsArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let conn = open_existing_ledger(project_root, output)?;
    let record = resolve_worker(&conn, &args.worker, output)?;

    let due = admission::forms_due(&conn, record.id).map_err(|err| output::fail_with(output, err))?;

    let payload = FormsOutput {
        worker: record.handle(),
        batch: due.batch,
        first_cycle: due.first_cycle,
        forms: due
            .kinds
            .iter()
            .map(|&kind| FormRow {
                form: kind,
                label: kind.label(),
            })
            .collect(),
    };

    render(output, &payload, |out, w| {
        let cycle = if out.first_cycle { "first cycle" } else { "repeat cycle" };
        writeln!(w, "Forms for {} (batch {}, {}):", out.worker, out.batch, cycle)?;
        for row in &out.forms {
            writeln!(w, "  {:<15} {}", row.form.as_str(), row.label)?;
        }
        Ok(())
    })
}
