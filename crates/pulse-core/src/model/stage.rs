//! The five daily stage windows and the stage clock.
//!
//! A day is partitioned into five fixed wall-clock windows. Every instant
//! belongs to exactly one window, so the clock is total: there is no hour of
//! the day without a stage. Window starts are inclusive, ends exclusive.

use super::{ParseEnumError, normalize};
use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the five survey windows in a worker's day.
///
/// Windows in cycle order:
///
/// | stage          | window          |
/// |----------------|-----------------|
/// | `morning`      | 06:00 - 12:00   |
/// | `midday`       | 12:00 - 14:00   |
/// | `afternoon`    | 14:00 - 17:00   |
/// | `end-of-shift` | 17:00 - 20:00   |
/// | `night`        | 20:00 - 06:00   |
///
/// `night` wraps midnight: a 02:00 submission belongs to the night window of
/// the calendar day it was made on, not the previous day's.
///
/// The derived `Ord` follows cycle order, so sorting a day's records by stage
/// lists them morning first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    Morning,
    Midday,
    Afternoon,
    EndOfShift,
    Night,
}

impl Stage {
    /// All stages in cycle order.
    pub const ALL: [Self; 5] = [
        Self::Morning,
        Self::Midday,
        Self::Afternoon,
        Self::EndOfShift,
        Self::Night,
    ];

    /// Canonical text form, used in the ledger and in JSON output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Midday => "midday",
            Self::Afternoon => "afternoon",
            Self::EndOfShift => "end-of-shift",
            Self::Night => "night",
        }
    }

    /// Heading form for human-readable reports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Morning => "Morning",
            Self::Midday => "Midday",
            Self::Afternoon => "Afternoon",
            Self::EndOfShift => "End of shift",
            Self::Night => "Night",
        }
    }

    /// Wall-clock window, for report headings.
    #[must_use]
    pub const fn window(self) -> &'static str {
        match self {
            Self::Morning => "06:00-12:00",
            Self::Midday => "12:00-14:00",
            Self::Afternoon => "14:00-17:00",
            Self::EndOfShift => "17:00-20:00",
            Self::Night => "20:00-06:00",
        }
    }

    /// Zero-based position in the daily cycle.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Morning => 0,
            Self::Midday => 1,
            Self::Afternoon => 2,
            Self::EndOfShift => 3,
            Self::Night => 4,
        }
    }

    /// The stage whose window contains the given civil timestamp.
    #[must_use]
    pub fn of(at: NaiveDateTime) -> Self {
        Self::of_hour(at.hour())
    }

    /// The stage whose window contains the given hour of day (0-23).
    ///
    /// Hours outside every daytime window, including anything >= 24 from a
    /// caller doing its own arithmetic, land in `night`.
    #[must_use]
    pub const fn of_hour(hour: u32) -> Self {
        match hour {
            6..=11 => Self::Morning,
            12..=13 => Self::Midday,
            14..=16 => Self::Afternoon,
            17..=19 => Self::EndOfShift,
            _ => Self::Night,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize(s);
        match normalized.as_str() {
            "morning" => Ok(Self::Morning),
            "midday" => Ok(Self::Midday),
            "afternoon" => Ok(Self::Afternoon),
            "end-of-shift" => Ok(Self::EndOfShift),
            "night" => Ok(Self::Night),
            _ => Err(ParseEnumError {
                expected: "stage",
                got: s.to_string(),
            }),
        }
    }
}

// Custom serde: serialize as the canonical text form.
impl Serialize for Stage {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Stage {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(serde::de::Error::custom)
    }
}
