//! Staircase configuration: bounds, step schedule, response rule and
//! adaptation mode.

use serde::{Deserialize, Serialize};

use crate::domain::errors::ConfigViolation;

/// Fewest reversals that give a threshold estimate normal (not low) confidence.
pub const MIN_THRESHOLD_REVERSALS: usize = 4;

/// Number of trailing reversals averaged into the threshold by default.
pub const DEFAULT_THRESHOLD_REVERSALS: u32 = 6;

/// Direction the level moves in. `Down` makes the task harder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Up => write!(f, "up"),
            Self::Down => write!(f, "down"),
        }
    }
}

/// Up/down rule mapping responses to level moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaircaseRule {
    /// Every correct answer moves down, every error moves up (targets 50%).
    OneDownOneUp,
    /// Two consecutive correct answers move down, one error moves up
    /// (targets ~70.7% correct).
    TwoDownOneUp,
}

/// How a step is applied to the level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdaptationMode {
    /// `level ± step`. Steps are positive level units (e.g. dB).
    Additive,
    /// `level × step` going down, `level ÷ step` going up. Steps are factors
    /// in `(0, 1)`.
    Multiplicative,
}

impl std::fmt::Display for AdaptationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Additive => write!(f, "additive"),
            Self::Multiplicative => write!(f, "multiplicative"),
        }
    }
}

/// Immutable staircase configuration, created once per test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct StaircaseConfig {
    /// Level presented on the first trial.
    pub initial_level: f64,

    /// Lower clamp bound (inclusive).
    pub min_level: f64,

    /// Upper clamp bound (inclusive).
    pub max_level: f64,

    /// Step used until the first reversal.
    pub initial_step_size: f64,

    /// Step schedule indexed by cumulative reversal count. The Nth reversal
    /// switches to `step_sizes[min(N, len - 1)]`.
    pub step_sizes: Vec<f64>,

    /// Reversals required for the built-in terminal condition.
    pub target_reversals: u32,

    /// Trailing reversals averaged into the threshold estimate. When unset,
    /// `min(DEFAULT_THRESHOLD_REVERSALS, target_reversals)`; see
    /// [`StaircaseConfig::threshold_window`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold_reversals: Option<u32>,

    /// Trials required before reversals alone may terminate the run.
    pub min_trials: u32,

    /// Hard cap on the number of trials.
    pub max_trials: u32,

    /// Direction assumed before the first trial.
    pub start_direction: Direction,

    pub rule: StaircaseRule,

    pub adaptation_mode: AdaptationMode,
}

impl Default for StaircaseConfig {
    /// Generic additive 2-down-1-up staircase over `[0, 100]`.
    fn default() -> Self {
        Self {
            initial_level: 50.0,
            min_level: 0.0,
            max_level: 100.0,
            initial_step_size: 8.0,
            step_sizes: vec![8.0, 4.0, 2.0],
            target_reversals: 6,
            threshold_reversals: None,
            min_trials: 10,
            max_trials: 50,
            start_direction: Direction::Down,
            rule: StaircaseRule::TwoDownOneUp,
            adaptation_mode: AdaptationMode::Additive,
        }
    }
}

impl StaircaseConfig {
    /// Number of trailing reversals averaged into the threshold.
    pub fn threshold_window(&self) -> u32 {
        self.threshold_reversals
            .unwrap_or_else(|| DEFAULT_THRESHOLD_REVERSALS.min(self.target_reversals))
    }

    /// Step size that applies once `reversals` reversals have occurred.
    pub fn step_for_reversals(&self, reversals: u32) -> f64 {
        self.step_sizes[self.step_index_for(reversals)]
    }

    /// Index into `step_sizes` for the given reversal count.
    pub fn step_index_for(&self, reversals: u32) -> usize {
        (reversals as usize).min(self.step_sizes.len().saturating_sub(1))
    }

    /// Check every construction-time rule. Violations are fatal.
    pub fn validate(&self) -> Result<(), ConfigViolation> {
        for (field, value) in [
            ("initial_level", self.initial_level),
            ("min_level", self.min_level),
            ("max_level", self.max_level),
            ("initial_step_size", self.initial_step_size),
        ] {
            if !value.is_finite() {
                return Err(ConfigViolation::NonFinite { field });
            }
        }

        if self.min_level > self.max_level {
            return Err(ConfigViolation::InvertedBounds {
                min: self.min_level,
                max: self.max_level,
            });
        }

        if self.initial_level < self.min_level || self.initial_level > self.max_level {
            return Err(ConfigViolation::InitialLevelOutOfBounds {
                level: self.initial_level,
                min: self.min_level,
                max: self.max_level,
            });
        }

        if self.step_sizes.is_empty() {
            return Err(ConfigViolation::EmptyStepSchedule);
        }

        if let Some(reason) = self.step_problem(self.initial_step_size) {
            return Err(ConfigViolation::InvalidInitialStep {
                value: self.initial_step_size,
                reason,
            });
        }

        for (index, &value) in self.step_sizes.iter().enumerate() {
            if let Some(reason) = self.step_problem(value) {
                return Err(ConfigViolation::InvalidStepSize {
                    index,
                    value,
                    reason,
                });
            }
        }

        // A multiplicative staircase pinned at zero can never move again.
        if self.adaptation_mode == AdaptationMode::Multiplicative && self.min_level <= 0.0 {
            return Err(ConfigViolation::NonPositive {
                field: "min_level",
                value: self.min_level,
            });
        }

        if self.target_reversals == 0 {
            return Err(ConfigViolation::ZeroTargetReversals);
        }

        if let Some(window) = self.threshold_reversals {
            if window == 0 {
                return Err(ConfigViolation::ZeroCount {
                    field: "threshold_reversals",
                });
            }
            if window > self.target_reversals {
                return Err(ConfigViolation::ReversalsInconsistent {
                    field: "threshold_reversals",
                    value: window,
                    target: self.target_reversals,
                });
            }
        }

        if self.max_trials == 0 {
            return Err(ConfigViolation::ZeroMaxTrials);
        }

        if self.min_trials > self.max_trials {
            return Err(ConfigViolation::TrialsInconsistent {
                min: self.min_trials,
                max: self.max_trials,
            });
        }

        Ok(())
    }

    fn step_problem(&self, step: f64) -> Option<&'static str> {
        if !step.is_finite() {
            return Some("not finite");
        }
        match self.adaptation_mode {
            AdaptationMode::Additive if step <= 0.0 => Some("additive steps must be positive"),
            AdaptationMode::Multiplicative if step <= 0.0 || step >= 1.0 => {
                Some("multiplicative steps must lie in (0, 1)")
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        StaircaseConfig::default()
            .validate()
            .expect("default config should be valid");
    }

    #[test]
    fn test_step_schedule_lookup_saturates() {
        let config = StaircaseConfig::default();
        assert!((config.step_for_reversals(0) - 8.0).abs() < f64::EPSILON);
        assert!((config.step_for_reversals(1) - 4.0).abs() < f64::EPSILON);
        assert!((config.step_for_reversals(2) - 2.0).abs() < f64::EPSILON);
        assert!((config.step_for_reversals(17) - 2.0).abs() < f64::EPSILON);
        assert_eq!(config.step_index_for(17), 2);
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let config = StaircaseConfig {
            min_level: 10.0,
            max_level: 5.0,
            initial_level: 7.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigViolation::InvertedBounds { .. })
        ));
    }

    #[test]
    fn test_empty_steps_rejected() {
        let config = StaircaseConfig {
            step_sizes: vec![],
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigViolation::EmptyStepSchedule));
    }

    #[test]
    fn test_initial_level_outside_bounds_rejected() {
        let config = StaircaseConfig {
            initial_level: 120.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigViolation::InitialLevelOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_multiplicative_steps_must_be_factors() {
        let config = StaircaseConfig {
            initial_level: 10.0,
            min_level: 0.5,
            max_level: 20.0,
            initial_step_size: 0.7,
            step_sizes: vec![0.7, 1.2],
            adaptation_mode: AdaptationMode::Multiplicative,
            ..Default::default()
        };
        match config.validate() {
            Err(ConfigViolation::InvalidStepSize { index, .. }) => assert_eq!(index, 1),
            other => panic!("expected InvalidStepSize, got {other:?}"),
        }
    }

    #[test]
    fn test_multiplicative_requires_positive_floor() {
        let config = StaircaseConfig {
            initial_level: 10.0,
            min_level: 0.0,
            max_level: 20.0,
            initial_step_size: 0.7,
            step_sizes: vec![0.7],
            adaptation_mode: AdaptationMode::Multiplicative,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigViolation::NonPositive { field: "min_level", .. })
        ));
    }

    #[test]
    fn test_threshold_reversals_cannot_exceed_target() {
        let config = StaircaseConfig {
            target_reversals: 4,
            threshold_reversals: Some(6),
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigViolation::ReversalsInconsistent {
                field: "threshold_reversals",
                value: 6,
                target: 4
            })
        );
    }

    #[test]
    fn test_unset_threshold_window_follows_small_target() {
        let config = StaircaseConfig {
            target_reversals: 4,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.threshold_window(), 4);

        let yaml = r"
initial_level: 50.0
min_level: 0.0
max_level: 100.0
initial_step_size: 8.0
step_sizes: [8.0, 4.0]
target_reversals: 3
min_trials: 5
max_trials: 30
start_direction: down
rule: two_down_one_up
adaptation_mode: additive
";
        let parsed: StaircaseConfig = serde_yaml::from_str(yaml).expect("yaml should parse");
        assert!(parsed.validate().is_ok());
        assert_eq!(parsed.threshold_window(), 3);
    }

    #[test]
    fn test_explicit_threshold_window_is_kept() {
        let config = StaircaseConfig {
            target_reversals: 10,
            threshold_reversals: Some(8),
            ..Default::default()
        };
        assert_eq!(config.threshold_window(), 8);
    }

    #[test]
    fn test_min_trials_above_max_rejected() {
        let config = StaircaseConfig {
            min_trials: 60,
            max_trials: 50,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigViolation::TrialsInconsistent { min: 60, max: 50 })
        );
    }

    #[test]
    fn test_non_finite_level_rejected() {
        let config = StaircaseConfig {
            max_level: f64::INFINITY,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigViolation::NonFinite { field: "max_level" })
        );
    }

    #[test]
    fn test_yaml_roundtrip_uses_snake_case() {
        let yaml = r"
initial_level: 40.0
min_level: 0.0
max_level: 80.0
initial_step_size: 8.0
step_sizes: [8.0, 8.0, 4.0, 4.0, 2.0, 2.0]
target_reversals: 8
min_trials: 10
max_trials: 60
start_direction: down
rule: two_down_one_up
adaptation_mode: additive
";
        let config: StaircaseConfig = serde_yaml::from_str(yaml).expect("yaml should parse");
        assert_eq!(config.threshold_reversals, None);
        assert_eq!(config.threshold_window(), DEFAULT_THRESHOLD_REVERSALS);
        assert_eq!(config.rule, StaircaseRule::TwoDownOneUp);
        assert!(config.validate().is_ok());
    }
}
