//! Fixed, versioned diagnostics for the staircase controller.
//!
//! Numeric anomalies never reach the state or a trial. When one occurs the
//! controller substitutes the last known-good value, logs a warning and keeps
//! a record here so callers can surface it.

use serde::{Deserialize, Serialize};

use super::config::Direction;

/// Bumped whenever a field is added to or removed from [`ControllerDiagnostics`].
pub const DIAGNOSTICS_VERSION: u32 = 1;

/// Which quantity went non-finite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    /// The next level computed from a step.
    NonFiniteLevel,
    /// A step size looked up from the schedule.
    NonFiniteStepSize,
    /// The same-pass threshold estimate.
    NonFiniteThreshold,
}

/// A recovered numeric anomaly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericAnomaly {
    /// Trial during which the anomaly occurred, if any.
    pub trial_index: Option<u32>,
    pub kind: AnomalyKind,
    /// Value substituted for the non-finite result.
    pub fallback: f64,
}

/// Snapshot of controller internals for diagnostic display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerDiagnostics {
    pub version: u32,
    /// Current index into the step schedule.
    pub step_index: usize,
    pub consecutive_correct: u32,
    /// Direction of the most recent level change, if the level has moved.
    pub last_move: Option<Direction>,
    pub anomalies: Vec<NumericAnomaly>,
}

impl ControllerDiagnostics {
    pub fn has_anomalies(&self) -> bool {
        !self.anomalies.is_empty()
    }
}
