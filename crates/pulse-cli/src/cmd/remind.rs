//! `pulse remind` — decide whether a worker needs a nag right now.
//!
//! The decision only looks at the window containing the check instant, and
//! it is batch-agnostic: any qualifying entry today silences it. With
//! `--notify`, the decision is also handed to the console transport, which
//! prints to stderr so JSON consumers reading stdout stay happy.

use std::io::Write;
use std::path::Path;

use anyhow::Result;
use clap::Args;
use pulse_core::config;
use pulse_core::model::{WorkerRecord, WorkerRef};
use pulse_core::report::reminder::{self, ReminderDecision, ReminderDispatcher};
use serde::Serialize;

use crate::cmd::{effective_at, join_kinds, open_existing_ledger, resolve_worker};
use crate::output::{self, OutputMode, render};

/// Arguments for `pulse remind`.
#[derive(Args, Debug)]
pub struct RemindArgs {
    /// Worker reference as `COMPANY/CODE`.
    #[arg(long, value_name = "COMPANY/CODE")]
    pub worker: WorkerRef,

    /// Check instant (defaults to now).
    #[arg(long, value_name = "TIMESTAMP")]
    pub at: Option<String>,

    /// Also deliver the reminder through the console transport.
    #[arg(long)]
    pub notify: bool,
}

#[derive(Debug, Serialize)]
struct RemindOutput {
    worker: String,
    decision: ReminderDecision,
}

/// Reminder transport that writes one line per nag.
pub struct ConsoleDispatcher<W: Write> {
    out: W,
}

impl<W: Write> ConsoleDispatcher<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> ReminderDispatcher for ConsoleDispatcher<W> {
    fn dispatch(&mut self, worker: &WorkerRecord, decision: &ReminderDecision) -> Result<()> {
        writeln!(
            self.out,
            "reminder: {} still owes {} in the {} window",
            worker.handle(),
            join_kinds(&decision.missing),
            decision.stage
        )?;
        Ok(())
    }
}

/// Execute `pulse remind`.
pub fn run_remind(args: &RemindArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let at = effective_at(args.at.as_deref())?;
    let policy = config::load_project_config(project_root)?.cadence;

    let conn = open_existing_ledger(project_root, output)?;
    let record = resolve_worker(&conn, &args.worker, output)?;

    let decision = if args.notify {
        let mut sink = ConsoleDispatcher::new(std::io::stderr());
        reminder::check_and_dispatch(&conn, &policy, record.id, at, &mut sink)?
    } else {
        reminder::check(&conn, &policy, record.id, at)
            .map_err(|err| output::fail_with(output, err))?
    };

    let payload = RemindOutput {
        worker: record.handle(),
        decision,
    };

    render(output, &payload, |out, w| {
        if out.decision.needs_reminder {
            writeln!(
                w,
                "{} still owes {} in the {} window ({})",
                out.worker,
                join_kinds(&out.decision.missing),
                out.decision.stage,
                out.decision.stage.window()
            )
        } else {
            writeln!(
                w,
                "{} is up to date for the {} window",
                out.worker, out.decision.stage
            )
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::init::{InitArgs, run_init};
    use crate::cmd::submit::{SubmitArgs, run_submit};
    use crate::cmd::worker::{WorkerAddArgs, run_worker_add};
    use chrono::NaiveDate;
    use pulse_core::model::{FormKind, Stage, WorkerId};
    use pulse_core::policy::CadencePolicy;

    fn setup_project() -> tempfile::TempDir {
        let dir = tempfile::tempdir().expect("tempdir");
        run_init(&InitArgs { force: false }, OutputMode::Json, true, dir.path())
            .expect("init should succeed");
        run_worker_add(
            &WorkerAddArgs {
                worker: "ACME/0042".parse().expect("valid reference"),
                name: "Lin Wei".to_string(),
                at: Some("2026-06-08T07:50".to_string()),
            },
            OutputMode::Json,
            dir.path(),
        )
        .expect("add should succeed");
        dir
    }

    fn submit(dir: &Path, form: FormKind, at: &str) {
        run_submit(
            &SubmitArgs {
                worker: "ACME/0042".parse().expect("valid reference"),
                form,
                data: r#"{"score": 1}"#.to_string(),
                stage: None,
                batch: None,
                at: Some(at.to_string()),
            },
            OutputMode::Json,
            dir,
        )
        .expect("submit should succeed");
    }

    #[test]
    fn untouched_window_needs_a_reminder() {
        let dir = setup_project();
        let args = RemindArgs {
            worker: "ACME/0042".parse().expect("valid reference"),
            at: Some("2026-06-08T08:30".to_string()),
            notify: false,
        };
        run_remind(&args, OutputMode::Json, dir.path()).expect("remind should succeed");

        let conn = open_existing_ledger(dir.path(), OutputMode::Json).expect("open");
        let decision = reminder::check(
            &conn,
            &CadencePolicy::default(),
            WorkerId(1),
            NaiveDate::from_ymd_opt(2026, 6, 8)
                .expect("valid date")
                .and_hms_opt(8, 30, 0)
                .expect("valid time"),
        )
        .expect("check");
        assert!(decision.needs_reminder);
        assert_eq!(decision.stage, Stage::Morning);
    }

    #[test]
    fn filled_window_is_silent() {
        let dir = setup_project();
        submit(dir.path(), FormKind::Sleep, "2026-06-08T08:10");
        submit(dir.path(), FormKind::Sleepiness, "2026-06-08T08:15");
        submit(dir.path(), FormKind::VisualFatigue, "2026-06-08T08:20");

        let conn = open_existing_ledger(dir.path(), OutputMode::Json).expect("open");
        let decision = reminder::check(
            &conn,
            &CadencePolicy::default(),
            WorkerId(1),
            NaiveDate::from_ymd_opt(2026, 6, 8)
                .expect("valid date")
                .and_hms_opt(8, 30, 0)
                .expect("valid time"),
        )
        .expect("check");
        assert!(!decision.needs_reminder);
    }

    #[test]
    fn console_dispatcher_names_the_debt() {
        let record = WorkerRecord {
            id: WorkerId(1),
            company: "ACME".to_string(),
            code: "0042".to_string(),
            name: "Lin Wei".to_string(),
            registered_at: NaiveDate::from_ymd_opt(2026, 6, 8)
                .expect("valid date")
                .and_hms_opt(7, 50, 0)
                .expect("valid time"),
        };
        let decision = ReminderDecision {
            stage: Stage::Night,
            missing: vec![FormKind::Workload],
            needs_reminder: true,
        };

        let mut buf = Vec::new();
        ConsoleDispatcher::new(&mut buf)
            .dispatch(&record, &decision)
            .expect("dispatch");
        let line = String::from_utf8(buf).expect("utf8");
        assert_eq!(
            line,
            "reminder: ACME/0042 still owes workload in the night window\n"
        );
    }

    #[test]
    fn notify_flag_delivers_through_the_transport() {
        let dir = setup_project();
        let args = RemindArgs {
            worker: "ACME/0042".parse().expect("valid reference"),
            at: Some("2026-06-08T08:30".to_string()),
            notify: true,
        };
        run_remind(&args, OutputMode::Json, dir.path()).expect("remind should succeed");
    }
}
