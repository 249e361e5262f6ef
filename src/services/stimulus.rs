//! Presentation context shared by the rhythm tests.
//!
//! Rhythm stimuli are played a fixed distance above the subject's measured
//! hearing threshold. The context is built by the caller (usually from the
//! hearing test's results) and passed to each adapter explicitly.

use serde::{Deserialize, Serialize};

use crate::domain::errors::{ensure_finite, ConfigViolation, StatisticsError};
use crate::domain::models::staircase::StaircaseResult;
use crate::domain::models::statistics::descriptive::mean;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StimulusContext {
    /// Mean hearing threshold across tested frequencies, dB SPL.
    #[serde(default = "default_hearing_threshold_average_db")]
    pub hearing_threshold_average_db: f64,

    /// Distance above the threshold stimuli are presented at, dB.
    #[serde(default = "default_fixed_offset_db")]
    pub fixed_offset_db: f64,
}

const fn default_hearing_threshold_average_db() -> f64 {
    20.0
}

const fn default_fixed_offset_db() -> f64 {
    40.0
}

impl Default for StimulusContext {
    fn default() -> Self {
        Self {
            hearing_threshold_average_db: default_hearing_threshold_average_db(),
            fixed_offset_db: default_fixed_offset_db(),
        }
    }
}

impl StimulusContext {
    /// Average the thresholds of completed hearing runs.
    pub fn from_hearing_results(
        results: &[StaircaseResult],
        fixed_offset_db: f64,
    ) -> Result<Self, StatisticsError> {
        if results.is_empty() {
            return Err(StatisticsError::EmptyInput);
        }
        let thresholds: Vec<f64> = results.iter().map(|r| r.threshold).collect();
        ensure_finite(&thresholds)?;
        let context = Self {
            hearing_threshold_average_db: mean(&thresholds),
            fixed_offset_db,
        };
        context.validate()?;
        Ok(context)
    }

    /// Presentation level in dB SPL.
    pub fn sound_level_db(&self) -> f64 {
        self.hearing_threshold_average_db + self.fixed_offset_db
    }

    pub fn validate(&self) -> Result<(), ConfigViolation> {
        if !self.hearing_threshold_average_db.is_finite() {
            return Err(ConfigViolation::NonFinite {
                field: "hearing_threshold_average_db",
            });
        }
        if !self.fixed_offset_db.is_finite() {
            return Err(ConfigViolation::NonFinite {
                field: "fixed_offset_db",
            });
        }
        Ok(())
    }
}
