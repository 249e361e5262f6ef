//! Tunables for the convergence analyzer.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::errors::ConfigViolation;
use crate::domain::models::staircase::StaircaseConfig;

/// Thresholds the analyzer checks a trial history against.
///
/// Durations are carried in milliseconds so the struct round-trips through
/// YAML and environment variables without a custom format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceConfig {
    /// Reversals after which the run is over regardless of stability.
    #[serde(default = "default_target_reversals")]
    pub target_reversals: u32,

    /// Reversals needed before stability can end the run.
    #[serde(default = "default_min_reversals")]
    pub min_reversals: u32,

    #[serde(default = "default_max_trials")]
    pub max_trials: u32,

    /// Number of trailing reversal levels the stability check looks at.
    #[serde(default = "default_stability_window")]
    pub stability_window: usize,

    /// Largest coefficient of variation over the window that counts as stable.
    #[serde(default = "default_stability_threshold")]
    pub stability_threshold: f64,

    /// Reversals required before the window CV is computed at all.
    #[serde(default = "default_stability_min_samples")]
    pub stability_min_samples: usize,

    #[serde(default = "default_true")]
    pub early_convergence_enabled: bool,

    /// Trailing trial count inspected for early convergence.
    #[serde(default = "default_early_convergence_trials")]
    pub early_convergence_trials: usize,

    /// Largest CV of the trailing trial levels that ends the run early.
    #[serde(default = "default_early_convergence_threshold")]
    pub early_convergence_threshold: f64,

    #[serde(default = "default_max_duration_ms")]
    pub max_duration_ms: u64,

    #[serde(default = "default_timeout_warning_ms")]
    pub timeout_warning_ms: u64,

    /// Data quality below this raises a low-confidence warning.
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,

    /// Reversal CV above this raises a high-variability warning.
    #[serde(default = "default_max_variability")]
    pub max_variability: f64,
}

const fn default_target_reversals() -> u32 {
    8
}

const fn default_min_reversals() -> u32 {
    6
}

const fn default_max_trials() -> u32 {
    50
}

const fn default_stability_window() -> usize {
    6
}

const fn default_stability_threshold() -> f64 {
    0.10
}

const fn default_stability_min_samples() -> usize {
    4
}

const fn default_true() -> bool {
    true
}

const fn default_early_convergence_trials() -> usize {
    10
}

const fn default_early_convergence_threshold() -> f64 {
    0.05
}

const fn default_max_duration_ms() -> u64 {
    600_000 // 10 minutes
}

const fn default_timeout_warning_ms() -> u64 {
    480_000 // 8 minutes
}

const fn default_min_confidence() -> f64 {
    0.7
}

const fn default_max_variability() -> f64 {
    0.3
}

impl Default for ConvergenceConfig {
    fn default() -> Self {
        Self {
            target_reversals: default_target_reversals(),
            min_reversals: default_min_reversals(),
            max_trials: default_max_trials(),
            stability_window: default_stability_window(),
            stability_threshold: default_stability_threshold(),
            stability_min_samples: default_stability_min_samples(),
            early_convergence_enabled: default_true(),
            early_convergence_trials: default_early_convergence_trials(),
            early_convergence_threshold: default_early_convergence_threshold(),
            max_duration_ms: default_max_duration_ms(),
            timeout_warning_ms: default_timeout_warning_ms(),
            min_confidence: default_min_confidence(),
            max_variability: default_max_variability(),
        }
    }
}

impl ConvergenceConfig {
    /// Take the trial cap and reversal target from `staircase`, so the
    /// analyzer stops a run where the staircase itself would.
    ///
    /// `min_reversals` is lowered to the target when it would exceed it.
    #[must_use]
    pub fn with_staircase_limits(self, staircase: &StaircaseConfig) -> Self {
        Self {
            max_trials: staircase.max_trials,
            target_reversals: staircase.target_reversals,
            min_reversals: self.min_reversals.min(staircase.target_reversals),
            ..self
        }
    }

    pub fn max_duration(&self) -> Duration {
        Duration::from_millis(self.max_duration_ms)
    }

    pub fn timeout_warning(&self) -> Duration {
        Duration::from_millis(self.timeout_warning_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigViolation> {
        if self.target_reversals == 0 {
            return Err(ConfigViolation::ZeroTargetReversals);
        }
        if self.min_reversals > self.target_reversals {
            return Err(ConfigViolation::ReversalsInconsistent {
                field: "min_reversals",
                value: self.min_reversals,
                target: self.target_reversals,
            });
        }
        if self.max_trials == 0 {
            return Err(ConfigViolation::ZeroMaxTrials);
        }
        if self.stability_window == 0 {
            return Err(ConfigViolation::ZeroCount {
                field: "stability_window",
            });
        }
        if self.stability_min_samples == 0 {
            return Err(ConfigViolation::ZeroCount {
                field: "stability_min_samples",
            });
        }
        if self.early_convergence_enabled && self.early_convergence_trials == 0 {
            return Err(ConfigViolation::ZeroCount {
                field: "early_convergence_trials",
            });
        }

        for (field, value) in [
            ("stability_threshold", self.stability_threshold),
            ("early_convergence_threshold", self.early_convergence_threshold),
            ("max_variability", self.max_variability),
        ] {
            if !value.is_finite() {
                return Err(ConfigViolation::NonFinite { field });
            }
            if value <= 0.0 {
                return Err(ConfigViolation::NonPositive { field, value });
            }
        }

        if !self.min_confidence.is_finite() {
            return Err(ConfigViolation::NonFinite {
                field: "min_confidence",
            });
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(ConfigViolation::OutOfRange {
                field: "min_confidence",
                value: self.min_confidence,
                range: "[0, 1]",
            });
        }

        if self.max_duration_ms == 0 {
            return Err(ConfigViolation::ZeroCount {
                field: "max_duration_ms",
            });
        }
        if self.timeout_warning_ms > self.max_duration_ms {
            return Err(ConfigViolation::OutOfRange {
                field: "timeout_warning_ms",
                value: self.timeout_warning_ms as f64,
                range: "[0, max_duration_ms]",
            });
        }
        Ok(())
    }
}
