//! Worker identity types.

use super::ParseEnumError;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ledger row id of a registered worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkerId(pub i64);

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A registered worker as stored in the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkerRecord {
    pub id: WorkerId,
    pub company: String,
    pub code: String,
    pub name: String,
    pub registered_at: NaiveDateTime,
}

impl WorkerRecord {
    /// `company/code` handle used in CLI output and log lines.
    #[must_use]
    pub fn handle(&self) -> String {
        format!("{}/{}", self.company, self.code)
    }
}

/// A `company/code` pair naming a worker without knowing its row id.
///
/// Company and worker codes are kept verbatim (no case folding): upstream
/// badge systems treat them as case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerRef {
    pub company: String,
    pub code: String,
}

impl fmt::Display for WorkerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.company, self.code)
    }
}

impl FromStr for WorkerRef {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let reject = || ParseEnumError {
            expected: "worker reference (company/code)",
            got: s.to_string(),
        };

        let (company, code) = s.trim().split_once('/').ok_or_else(reject)?;
        let company = company.trim();
        let code = code.trim();
        if company.is_empty() || code.is_empty() || code.contains('/') {
            return Err(reject());
        }

        Ok(Self {
            company: company.to_string(),
            code: code.to_string(),
        })
    }
}
