//! Engine error taxonomy.
//!
//! Callers get three distinguishable classes: missing referents
//! ([`EngineError::WorkerNotFound`], [`EngineError::WorkerRefNotFound`]),
//! rejected input ([`EngineError::Validation`]), and lost admission races
//! ([`EngineError::Conflict`]). SQLite faults pass through as
//! [`EngineError::Storage`]. Unknown stage or form-kind text never reaches
//! the engine: both are closed enums rejected at the parse boundary.

use crate::model::{FormKind, Stage, WorkerId, WorkerRef};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// No worker row with this id.
    #[error("worker {0} not found")]
    WorkerNotFound(WorkerId),

    /// No worker registered under this `company/code` pair.
    #[error("worker '{0}' not found")]
    WorkerRefNotFound(WorkerRef),

    /// The request was well-formed but carries unacceptable values.
    #[error("invalid request: {0}")]
    Validation(String),

    /// A concurrent writer claimed the sequence slot and the one renumber
    /// retry lost as well. Safe to retry the whole submission.
    #[error(
        "submission slot already claimed: worker {worker}, {kind}, batch {batch}, {stage}, seq {seq}"
    )]
    Conflict {
        worker: WorkerId,
        kind: FormKind,
        batch: u32,
        stage: Stage,
        seq: u32,
    },

    /// Underlying SQLite failure.
    #[error("ledger storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl EngineError {
    /// Stable machine-readable code for CLI and log consumers.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::WorkerNotFound(_) | Self::WorkerRefNotFound(_) => "worker_not_found",
            Self::Validation(_) => "validation",
            Self::Conflict { .. } => "conflict",
            Self::Storage(_) => "storage",
        }
    }
}
