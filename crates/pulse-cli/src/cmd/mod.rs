//! Command handlers for the pulse CLI.
//!
//! Each submodule owns one subcommand: argument struct, `run_*` entry
//! point, and human rendering. Helpers shared by several commands live
//! here.

pub mod forms;
pub mod history;
pub mod init;
pub mod remind;
pub mod status;
pub mod submit;
pub mod worker;

use std::path::Path;

use anyhow::{Context as _, Result};
use chrono::{Local, NaiveDate, NaiveDateTime};
use pulse_core::config;
use pulse_core::db::{self, registry};
use pulse_core::model::{FormKind, WorkerRecord, WorkerRef};
use rusqlite::Connection;

use crate::output::{self, OutputMode};

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Accepted `--at` timestamp shapes, tried in order.
const AT_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse a `--at` timestamp.
pub fn parse_at(text: &str) -> Result<NaiveDateTime> {
    let trimmed = text.trim();
    for format in AT_FORMATS {
        if let Ok(at) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(at);
        }
    }
    anyhow::bail!("unrecognized timestamp '{text}'; use YYYY-MM-DDTHH:MM[:SS]")
}

/// Parse a `--until` calendar day.
pub fn parse_day(text: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .with_context(|| format!("unrecognized date '{text}'; use YYYY-MM-DD"))
}

/// The instant a command operates at: the `--at` flag, or the local clock.
pub fn effective_at(flag: Option<&str>) -> Result<NaiveDateTime> {
    match flag {
        Some(text) => parse_at(text),
        None => Ok(Local::now().naive_local()),
    }
}

/// The day a command operates on: the flag, or today by the local clock.
pub fn effective_day(flag: Option<&str>) -> Result<NaiveDate> {
    match flag {
        Some(text) => parse_day(text),
        None => Ok(Local::now().date_naive()),
    }
}

/// Open the project ledger, refusing to create one implicitly.
pub fn open_existing_ledger(project_root: &Path, mode: OutputMode) -> Result<Connection> {
    let path = config::ledger_path(project_root);
    if !path.exists() {
        output::render_error(
            mode,
            &output::CliError::with_details(
                format!("no submission ledger at {}", path.display()),
                "run `pulse init` to create the project",
                "ledger_missing",
            ),
        )?;
        anyhow::bail!("ledger not initialized; run `pulse init` first");
    }
    db::open_ledger(&path)
}

/// Look up a worker by `company/code`, reporting a not-found in the
/// requested output mode.
pub fn resolve_worker(
    conn: &Connection,
    reference: &WorkerRef,
    mode: OutputMode,
) -> Result<WorkerRecord> {
    registry::resolve_ref(conn, reference).map_err(|err| output::fail_with(mode, err))
}

/// Comma-join form kinds for human output.
pub fn join_kinds(kinds: &[FormKind]) -> String {
    if kinds.is_empty() {
        return "none".to_string();
    }
    kinds
        .iter()
        .map(|kind| kind.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_at_accepts_t_separator() {
        let at = parse_at("2026-06-08T08:10:00").expect("parse");
        assert_eq!(at.to_string(), "2026-06-08 08:10:00");
    }

    #[test]
    fn parse_at_accepts_space_separator_and_no_seconds() {
        let at = parse_at("2026-06-08 08:10").expect("parse");
        assert_eq!(at.to_string(), "2026-06-08 08:10:00");
    }

    #[test]
    fn parse_at_trims_whitespace() {
        let at = parse_at("  2026-06-08T08:10  ").expect("parse");
        assert_eq!(at.to_string(), "2026-06-08 08:10:00");
    }

    #[test]
    fn parse_at_rejects_garbage() {
        let err = parse_at("yesterday-ish").expect_err("must fail");
        assert!(err.to_string().contains("unrecognized timestamp"));
    }

    #[test]
    fn parse_day_roundtrips() {
        let day = parse_day("2026-06-08").expect("parse");
        assert_eq!(day.to_string(), "2026-06-08");
    }

    #[test]
    fn parse_day_rejects_timestamps() {
        assert!(parse_day("2026-06-08T08:10").is_err());
    }

    #[test]
    fn effective_at_defaults_to_now() {
        assert!(effective_at(None).is_ok());
    }

    #[test]
    fn open_existing_ledger_requires_init() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = open_existing_ledger(dir.path(), OutputMode::Json).expect_err("must fail");
        assert!(err.to_string().contains("pulse init"));
    }

    #[test]
    fn join_kinds_formats() {
        assert_eq!(join_kinds(&[]), "none");
        assert_eq!(
            join_kinds(&[FormKind::Sleep, FormKind::VisualFatigue]),
            "sleep, visual-fatigue"
        );
    }
}
