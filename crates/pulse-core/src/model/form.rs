//! The closed catalog of survey forms a worker can submit.

use super::{ParseEnumError, normalize};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The four survey forms in the catalog.
///
/// Each kind carries a stable numeric id (kept from the upstream survey
/// deployment, where forms are numbered 1-4) alongside its canonical text
/// form. The derived `Ord` follows catalog id order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FormKind {
    /// Hours slept before the shift.
    Sleep,
    /// Karolinska-style sleepiness scale.
    Sleepiness,
    /// Visual fatigue questionnaire.
    VisualFatigue,
    /// NASA-TLX workload index.
    Workload,
}

impl FormKind {
    /// All form kinds in catalog order.
    pub const ALL: [Self; 4] = [
        Self::Sleep,
        Self::Sleepiness,
        Self::VisualFatigue,
        Self::Workload,
    ];

    /// Canonical text form, used in the ledger and in JSON output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sleep => "sleep",
            Self::Sleepiness => "sleepiness",
            Self::VisualFatigue => "visual-fatigue",
            Self::Workload => "workload",
        }
    }

    /// Full name for human-readable reports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Sleep => "Sleep hours",
            Self::Sleepiness => "Sleepiness scale",
            Self::VisualFatigue => "Visual fatigue",
            Self::Workload => "NASA-TLX workload",
        }
    }

    /// Stable catalog id (1-4).
    #[must_use]
    pub const fn id(self) -> u8 {
        match self {
            Self::Sleep => 1,
            Self::Sleepiness => 2,
            Self::VisualFatigue => 3,
            Self::Workload => 4,
        }
    }

    /// Look up a kind by catalog id.
    #[must_use]
    pub const fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Self::Sleep),
            2 => Some(Self::Sleepiness),
            3 => Some(Self::VisualFatigue),
            4 => Some(Self::Workload),
            _ => None,
        }
    }

    /// Whether the kind is collected on a worker's first batch.
    ///
    /// The shipped catalog collects every kind from the first batch on; the
    /// flag stays per-kind so a trimmed catalog can opt kinds out.
    #[must_use]
    pub const fn on_first_batch(self) -> bool {
        match self {
            Self::Sleep | Self::Sleepiness | Self::VisualFatigue | Self::Workload => true,
        }
    }

    /// Whether the kind is collected on second and later batches.
    #[must_use]
    pub const fn on_repeat_batch(self) -> bool {
        match self {
            Self::Sleep | Self::Sleepiness | Self::VisualFatigue | Self::Workload => true,
        }
    }
}

impl fmt::Display for FormKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormKind {
    type Err = ParseEnumError;

    /// Accepts the canonical text form, the `nasa-tlx` alias for workload,
    /// or a bare catalog id (`"3"` parses as `visual-fatigue`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize(s);
        match normalized.as_str() {
            "sleep" => Ok(Self::Sleep),
            "sleepiness" => Ok(Self::Sleepiness),
            "visual-fatigue" => Ok(Self::VisualFatigue),
            "workload" | "nasa-tlx" => Ok(Self::Workload),
            other => other
                .parse::<u8>()
                .ok()
                .and_then(Self::from_id)
                .ok_or_else(|| ParseEnumError {
                    expected: "form kind",
                    got: s.to_string(),
                }),
        }
    }
}

// Custom serde: serialize as the canonical text form.
impl Serialize for FormKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FormKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(serde::de::Error::custom)
    }
}
