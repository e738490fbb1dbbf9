//! The cadence policy: which form kinds each stage window requires.

use crate::error::EngineError;
use crate::model::{FormKind, Stage};
use serde::{Deserialize, Serialize};

/// Required form kinds per stage window, in report order.
///
/// The shipped default matches the deployed survey cadence: sleep is asked
/// once in the morning, sleepiness and visual fatigue in every window, and
/// the NASA-TLX workload index at night once the shift is over. Deployments
/// override individual windows from `[cadence]` in the project config;
/// windows left out keep their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CadencePolicy {
    pub morning: Vec<FormKind>,
    pub midday: Vec<FormKind>,
    pub afternoon: Vec<FormKind>,
    #[serde(rename = "end-of-shift")]
    pub end_of_shift: Vec<FormKind>,
    pub night: Vec<FormKind>,
}

impl Default for CadencePolicy {
    fn default() -> Self {
        Self {
            morning: vec![
                FormKind::Sleep,
                FormKind::Sleepiness,
                FormKind::VisualFatigue,
            ],
            midday: vec![FormKind::Sleepiness, FormKind::VisualFatigue],
            afternoon: vec![FormKind::Sleepiness, FormKind::VisualFatigue],
            end_of_shift: vec![FormKind::Sleepiness, FormKind::VisualFatigue],
            night: vec![
                FormKind::Sleepiness,
                FormKind::VisualFatigue,
                FormKind::Workload,
            ],
        }
    }
}

impl CadencePolicy {
    /// Form kinds required in the given stage window.
    #[must_use]
    pub fn required(&self, stage: Stage) -> &[FormKind] {
        match stage {
            Stage::Morning => &self.morning,
            Stage::Midday => &self.midday,
            Stage::Afternoon => &self.afternoon,
            Stage::EndOfShift => &self.end_of_shift,
            Stage::Night => &self.night,
        }
    }

    /// Reject tables that list the same kind twice within one window.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Validation`] naming the offending window.
    pub fn validate(&self) -> Result<(), EngineError> {
        for stage in Stage::ALL {
            let kinds = self.required(stage);
            for (i, kind) in kinds.iter().enumerate() {
                if kinds[..i].contains(kind) {
                    return Err(EngineError::Validation(format!(
                        "cadence window '{stage}' lists '{kind}' more than once"
                    )));
                }
            }
        }
        Ok(())
    }
}
