//! Threshold estimates and the terminal result record.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::config::MIN_THRESHOLD_REVERSALS;
use crate::domain::models::statistics::descriptive::{mean, population_std_dev};
use crate::domain::models::statistics::{ConfidenceInterval, ThresholdRecord};

/// Highest confidence a low-confidence estimate may carry.
pub const LOW_CONFIDENCE_CAP: f64 = 0.5;

/// Confidence reported when the reversal mean is zero or the ratio is not finite.
pub const SAFE_DEFAULT_CONFIDENCE: f64 = 0.1;

/// What an estimate was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimateBasis {
    /// Mean of the trailing reversal window.
    Reversals,
    /// Too few reversals; the current level stands in.
    InsufficientReversals,
    /// The reversal mean was not finite; the current level stands in.
    NonFiniteFallback,
}

/// Threshold estimate computed in the same pass as trial recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdEstimate {
    pub threshold: f64,
    pub confidence: f64,
    pub std_dev: f64,
    /// Reversal levels that went into the estimate.
    pub sample_size: usize,
    pub basis: EstimateBasis,
}

impl ThresholdEstimate {
    /// Statistically insufficient estimates are usable but must be flagged.
    pub fn is_low_confidence(&self) -> bool {
        self.basis != EstimateBasis::Reversals
    }
}

/// Same-pass estimate over the last `window` reversal levels.
///
/// With fewer than [`MIN_THRESHOLD_REVERSALS`] levels the current level is
/// returned with confidence capped at [`LOW_CONFIDENCE_CAP`]. Otherwise the
/// threshold is the window mean and confidence is `1 - stddev / |mean|`
/// clamped to `[0, 1]`.
pub fn same_pass_estimate(
    reversal_levels: &[f64],
    current_level: f64,
    window: usize,
) -> ThresholdEstimate {
    let take = window.min(reversal_levels.len());
    let recent = &reversal_levels[reversal_levels.len() - take..];

    if recent.len() < MIN_THRESHOLD_REVERSALS {
        return ThresholdEstimate {
            threshold: current_level,
            confidence: LOW_CONFIDENCE_CAP,
            std_dev: 0.0,
            sample_size: recent.len(),
            basis: EstimateBasis::InsufficientReversals,
        };
    }

    let m = mean(recent);
    let sd = population_std_dev(recent);
    if !m.is_finite() {
        return ThresholdEstimate {
            threshold: current_level,
            confidence: SAFE_DEFAULT_CONFIDENCE,
            std_dev: 0.0,
            sample_size: recent.len(),
            basis: EstimateBasis::NonFiniteFallback,
        };
    }

    let ratio = sd / m.abs();
    let confidence = if m == 0.0 || !ratio.is_finite() {
        SAFE_DEFAULT_CONFIDENCE
    } else {
        (1.0 - ratio).clamp(0.0, 1.0)
    };

    ThresholdEstimate {
        threshold: m,
        confidence,
        std_dev: if sd.is_finite() { sd } else { 0.0 },
        sample_size: recent.len(),
        basis: EstimateBasis::Reversals,
    }
}

/// Terminal result of a completed staircase run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaircaseResult {
    pub threshold: f64,
    pub confidence: f64,
    /// Set when fewer reversals than needed were available.
    pub low_confidence: bool,
    pub confidence_interval: Option<ConfidenceInterval>,
    pub total_trials: u32,
    pub total_reversals: u32,
    /// Trials taken to reach the first reversal of the threshold window.
    pub convergence_trials: u32,
    /// Reversal levels the threshold was computed from.
    pub final_levels: Vec<f64>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration: Duration,
}

impl ThresholdRecord for StaircaseResult {
    fn threshold(&self) -> f64 {
        self.threshold
    }

    fn confidence(&self) -> f64 {
        self.confidence
    }
}
