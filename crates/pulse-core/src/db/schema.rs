//! Canonical SQLite schema for the submission ledger.
//!
//! Two relational tables carry the whole engine:
//! - `workers` registers who can submit, keyed by an opaque row id with a
//!   unique `company_code`/`worker_code` pair for lookup
//! - `submissions` is the append-only ledger; one row per admitted form,
//!   keyed by the (worker, form kind, batch, stage, seq) slot
//!
//! `ledger_meta` tracks the schema version alongside `PRAGMA user_version`
//! so external tooling can read it without a pragma.
//!
//! The UNIQUE constraint on the slot is the concurrency backstop: admission
//! renumbers duplicates onto free `seq` values inside an immediate
//! transaction, and any write that still collides is rejected by SQLite
//! rather than silently overwriting an earlier submission.

/// Migration v1: worker registry, submission ledger, and ledger metadata.
pub const MIGRATION_V1_SQL: &str = r"
CREATE TABLE IF NOT EXISTS workers (
    worker_id INTEGER PRIMARY KEY AUTOINCREMENT,
    company_code TEXT NOT NULL CHECK (length(trim(company_code)) > 0),
    worker_code TEXT NOT NULL CHECK (length(trim(worker_code)) > 0),
    name TEXT NOT NULL DEFAULT '',
    registered_at_us INTEGER NOT NULL,
    UNIQUE (company_code, worker_code)
);

CREATE TABLE IF NOT EXISTS submissions (
    submission_id INTEGER PRIMARY KEY AUTOINCREMENT,
    worker_id INTEGER NOT NULL REFERENCES workers(worker_id) ON DELETE CASCADE,
    form_kind TEXT NOT NULL CHECK (form_kind IN ('sleep', 'sleepiness', 'visual-fatigue', 'workload')),
    batch INTEGER NOT NULL CHECK (batch >= 1),
    stage TEXT NOT NULL CHECK (stage IN ('morning', 'midday', 'afternoon', 'end-of-shift', 'night')),
    seq INTEGER NOT NULL CHECK (seq >= 1),
    submitted_at_us INTEGER NOT NULL,
    payload TEXT NOT NULL,
    UNIQUE (worker_id, form_kind, batch, stage, seq)
);

CREATE TABLE IF NOT EXISTS ledger_meta (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    schema_version INTEGER NOT NULL,
    created_at_us INTEGER NOT NULL DEFAULT 0
);

INSERT OR IGNORE INTO ledger_meta (id, schema_version, created_at_us)
VALUES (1, 1, 0);
";

/// Migration v2: read-path indexes for the day-window and stage scans.
pub const MIGRATION_V2_SQL: &str = "
CREATE INDEX IF NOT EXISTS idx_submissions_worker_submitted
    ON submissions(worker_id, submitted_at_us DESC);

CREATE INDEX IF NOT EXISTS idx_submissions_worker_batch_stage
    ON submissions(worker_id, batch, stage);

CREATE INDEX IF NOT EXISTS idx_submissions_worker_stage_submitted
    ON submissions(worker_id, stage, submitted_at_us);
";

/// Indexes expected after all migrations run (checked by tests).
pub const REQUIRED_INDEXES: &[&str] = &[
    "idx_submissions_worker_submitted",
    "idx_submissions_worker_batch_stage",
    "idx_submissions_worker_stage_submitted",
];
