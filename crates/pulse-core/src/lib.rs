#![forbid(unsafe_code)]
//! pulse-core library.
//!
//! The engine behind the `pulse` survey cadence tracker: a SQLite-backed
//! submission ledger with admission control, and the reports derived from
//! it (per-stage completion, day-by-day history, reminder decisions).
//!
//! A worker's day is cut into five fixed stage windows; the cadence policy
//! says which survey forms each window requires. Submissions are only ever
//! appended: a repeat of an already-filled slot is renumbered, never
//! rejected, so the ledger keeps every attempt.
//!
//! # Conventions
//!
//! - **Errors**: engine operations return [`error::EngineError`];
//!   lifecycle helpers (opening the ledger, loading config) return
//!   `anyhow::Result`.
//! - **Logging**: `tracing` macros (`info!`, `warn!`, `debug!`).

pub mod admission;
pub mod config;
pub mod db;
pub mod error;
pub mod model;
pub mod policy;
pub mod report;
