use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::config::{Direction, StaircaseConfig};
use super::estimate::ThresholdEstimate;

/// Mutable staircase state, owned by the controller and changed only by
/// recording trials. Callers see it through a shared reference or a clone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaircaseState {
    pub current_level: f64,
    pub current_direction: Direction,
    pub current_step_size: f64,

    /// Run of unbroken correct responses; cleared by an error or a down move.
    pub consecutive_correct: u32,

    /// Level at the moment of each reversal, chronological.
    pub reversal_levels: Vec<f64>,

    pub total_trials: u32,
    pub total_reversals: u32,
    pub started_at: DateTime<Utc>,

    /// Set once the run is terminal; the state is frozen from then on.
    pub completed_at: Option<DateTime<Utc>>,

    /// Same-pass threshold computed at completion.
    pub final_estimate: Option<ThresholdEstimate>,
}

impl StaircaseState {
    /// Fresh state for `config`, started at `started_at`.
    pub fn initial(config: &StaircaseConfig, started_at: DateTime<Utc>) -> Self {
        Self {
            current_level: config.initial_level,
            current_direction: config.start_direction,
            current_step_size: config.initial_step_size,
            consecutive_correct: 0,
            reversal_levels: Vec::new(),
            total_trials: 0,
            total_reversals: 0,
            started_at,
            completed_at: None,
            final_estimate: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.completed_at.is_some()
    }

    /// Fraction of the run done, `max(reversal progress, trial progress)`,
    /// in `[0, 1]`. A completed run is always `1.0`.
    pub fn progress(&self, config: &StaircaseConfig) -> f64 {
        if self.is_complete() {
            return 1.0;
        }
        let reversal_progress =
            f64::from(self.total_reversals) / f64::from(config.target_reversals.max(1));
        let trial_progress = f64::from(self.total_trials) / f64::from(config.max_trials.max(1));
        reversal_progress.max(trial_progress).clamp(0.0, 1.0)
    }
}
