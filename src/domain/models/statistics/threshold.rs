//! Threshold estimation from reversal levels.
//!
//! Pipeline: validate input → optional single-pass outlier removal →
//! central tendency (mean, median or trimmed mean) → dispersion →
//! normal-approximation confidence interval.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::descriptive::{mean, median, population_std_dev, population_variance, trimmed_mean};
use crate::domain::errors::{ensure_finite, ConfigViolation, SampleStage, StatisticsError};
use crate::domain::models::staircase::{Trial, SAFE_DEFAULT_CONFIDENCE};

/// Central-tendency estimator for the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdMethod {
    #[default]
    Mean,
    Median,
    /// Drop `trim_percent / 2` percent of sorted values from each tail.
    TrimmedMean { trim_percent: f64 },
}

/// Configuration for [`threshold_from_reversals`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct StatisticsConfig {
    #[serde(default)]
    pub method: ThresholdMethod,

    /// Fewest samples accepted, checked before and after outlier removal.
    #[serde(default = "default_min_samples")]
    pub min_samples: usize,

    #[serde(default = "default_true")]
    pub remove_outliers: bool,

    /// Values farther than this many population standard deviations from the
    /// mean are dropped.
    #[serde(default = "default_outlier_threshold")]
    pub outlier_threshold: f64,

    /// Coverage of the reported confidence interval, in `(0, 1)`.
    #[serde(default = "default_confidence_level")]
    pub confidence_level: f64,
}

const fn default_min_samples() -> usize {
    4
}

const fn default_true() -> bool {
    true
}

const fn default_outlier_threshold() -> f64 {
    2.0
}

const fn default_confidence_level() -> f64 {
    0.95
}

impl Default for StatisticsConfig {
    fn default() -> Self {
        Self {
            method: ThresholdMethod::default(),
            min_samples: default_min_samples(),
            remove_outliers: true,
            outlier_threshold: default_outlier_threshold(),
            confidence_level: default_confidence_level(),
        }
    }
}

impl StatisticsConfig {
    /// Plain mean of all samples with no outlier removal.
    pub fn plain_mean() -> Self {
        Self {
            remove_outliers: false,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigViolation> {
        if self.min_samples == 0 {
            return Err(ConfigViolation::ZeroCount {
                field: "min_samples",
            });
        }
        if !self.outlier_threshold.is_finite() {
            return Err(ConfigViolation::NonFinite {
                field: "outlier_threshold",
            });
        }
        if self.outlier_threshold <= 0.0 {
            return Err(ConfigViolation::NonPositive {
                field: "outlier_threshold",
                value: self.outlier_threshold,
            });
        }
        if !self.confidence_level.is_finite() {
            return Err(ConfigViolation::NonFinite {
                field: "confidence_level",
            });
        }
        if self.confidence_level <= 0.0 {
            return Err(ConfigViolation::NonPositive {
                field: "confidence_level",
                value: self.confidence_level,
            });
        }
        if self.confidence_level >= 1.0 {
            return Err(ConfigViolation::OutOfRange {
                field: "confidence_level",
                value: self.confidence_level,
                range: "(0, 1)",
            });
        }
        if let ThresholdMethod::TrimmedMean { trim_percent } = self.method {
            if !trim_percent.is_finite() || !(0.0..100.0).contains(&trim_percent) {
                return Err(ConfigViolation::OutOfRange {
                    field: "trim_percent",
                    value: trim_percent,
                    range: "[0, 100)",
                });
            }
        }
        Ok(())
    }
}

/// Two-sided interval around the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
    pub level: f64,
}

impl ConfidenceInterval {
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

/// Output of [`threshold_from_reversals`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdStatistics {
    pub threshold: f64,
    pub confidence: f64,
    pub std_dev: f64,
    pub variance: f64,
    /// Samples remaining after outlier removal.
    pub sample_size: usize,
    /// Values removed as outliers, in input order.
    pub outliers: Vec<f64>,
    pub confidence_interval: ConfidenceInterval,
    pub method: ThresholdMethod,
}

/// Two-sided z critical value for the common confidence levels.
///
/// Unrecognised levels fall back to 1.96.
pub fn z_score(confidence_level: f64) -> f64 {
    const TABLE: [(f64, f64); 3] = [(0.90, 1.645), (0.95, 1.96), (0.99, 2.576)];
    TABLE
        .iter()
        .find(|(level, _)| (confidence_level - level).abs() < 1e-9)
        .map_or(1.96, |&(_, z)| z)
}

/// Estimate a threshold from reversal levels.
pub fn threshold_from_reversals(
    levels: &[f64],
    config: &StatisticsConfig,
) -> Result<ThresholdStatistics, StatisticsError> {
    config.validate()?;
    ensure_finite(levels)?;

    if levels.len() < config.min_samples {
        return Err(StatisticsError::InsufficientSamples {
            required: config.min_samples,
            actual: levels.len(),
            stage: SampleStage::BeforeOutlierRemoval,
        });
    }

    let (retained, outliers) = if config.remove_outliers {
        split_outliers(levels, config.outlier_threshold)
    } else {
        (levels.to_vec(), Vec::new())
    };

    if retained.len() < config.min_samples {
        return Err(StatisticsError::InsufficientSamples {
            required: config.min_samples,
            actual: retained.len(),
            stage: SampleStage::AfterOutlierRemoval,
        });
    }

    let threshold = match config.method {
        ThresholdMethod::Mean => mean(&retained),
        ThresholdMethod::Median => median(&retained),
        ThresholdMethod::TrimmedMean { trim_percent } => trimmed_mean(&retained, trim_percent),
    };
    if !threshold.is_finite() {
        // Finite inputs can still overflow when summed.
        return Err(StatisticsError::NonFiniteResult {
            quantity: "threshold",
        });
    }

    let std_dev = population_std_dev(&retained);
    let variance = population_variance(&retained);
    for (quantity, value) in [("std_dev", std_dev), ("variance", variance)] {
        if !value.is_finite() {
            return Err(StatisticsError::NonFiniteResult { quantity });
        }
    }
    let confidence = confidence_from_dispersion(threshold, std_dev);

    let standard_error = std_dev / (retained.len() as f64).sqrt();
    let margin = z_score(config.confidence_level) * standard_error;
    let (lower, upper) = (threshold - margin, threshold + margin);
    if !lower.is_finite() || !upper.is_finite() {
        return Err(StatisticsError::NonFiniteResult {
            quantity: "confidence_interval",
        });
    }

    debug!(
        threshold,
        std_dev,
        sample_size = retained.len(),
        outliers = outliers.len(),
        "threshold computed from reversals"
    );

    Ok(ThresholdStatistics {
        threshold,
        confidence,
        std_dev,
        variance,
        sample_size: retained.len(),
        outliers,
        confidence_interval: ConfidenceInterval {
            lower,
            upper,
            level: config.confidence_level,
        },
        method: config.method,
    })
}

/// Same as [`threshold_from_reversals`] using the reversal trials of a history.
pub fn threshold_from_trials(
    trials: &[Trial],
    config: &StatisticsConfig,
) -> Result<ThresholdStatistics, StatisticsError> {
    let levels: Vec<f64> = trials
        .iter()
        .filter(|t| t.is_reversal)
        .map(|t| t.level)
        .collect();
    threshold_from_reversals(&levels, config)
}

/// `1 - stddev / |threshold|` clamped to `[0, 1]`.
pub(crate) fn confidence_from_dispersion(threshold: f64, std_dev: f64) -> f64 {
    if threshold == 0.0 {
        return SAFE_DEFAULT_CONFIDENCE;
    }
    let ratio = std_dev / threshold.abs();
    if ratio.is_finite() {
        (1.0 - ratio).clamp(0.0, 1.0)
    } else {
        SAFE_DEFAULT_CONFIDENCE
    }
}

/// Single pass: statistics are computed once over the full input.
fn split_outliers(levels: &[f64], k: f64) -> (Vec<f64>, Vec<f64>) {
    let m = mean(levels);
    let sd = population_std_dev(levels);
    if sd == 0.0 || !sd.is_finite() {
        return (levels.to_vec(), Vec::new());
    }
    levels
        .iter()
        .copied()
        .partition(|&v| (v - m).abs() <= k * sd)
}
