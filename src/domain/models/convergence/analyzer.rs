//! Convergence analysis over a staircase trial history.
//!
//! The analyzer is a pure function of the history, the elapsed wall-clock
//! time and the current level. It gives a richer verdict than the
//! controller's own terminal rule: a reason, a quality grade, independent
//! warnings and a versioned metrics block.
//!
//! # Precedence
//!
//! Reasons are checked in a fixed order and the first match wins:
//!
//! 1. `Timeout` -- elapsed time exceeds `max_duration`.
//! 2. `MaxTrials` -- trial count reached `max_trials`.
//! 3. `TargetReversals` -- reversal count reached `target_reversals`.
//! 4. `EarlyConvergence` -- the trailing trial levels barely move.
//! 5. `StabilityAchieved` -- enough reversals and the trailing reversal window
//!    is tight.
//! 6. `QualityThreshold` -- the grade is `Excellent` with confidence >= 0.9.
//!
//! # Timeouts
//!
//! The analyzer never starts timers. Callers pass the elapsed time in and the
//! timeout is evaluated lazily on each call.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::debug;

use super::analysis::{
    ConvergenceAnalysis, ConvergenceMetrics, ConvergenceReason, QualityGrade, Warning,
    ANALYSIS_VERSION,
};
use super::config::ConvergenceConfig;
use super::trend::{detect_trend, DEFAULT_TREND_EPSILON};
use crate::domain::errors::ConfigViolation;
use crate::domain::models::staircase::Trial;
use crate::domain::models::statistics::descriptive::{
    coefficient_of_variation, mean, population_std_dev, stability_from_cv,
};

/// Distance from the mean of all trial levels, in standard deviations, beyond
/// which a level is flagged as an outlier.
pub const OUTLIER_SIGMA: f64 = 2.5;

/// Fraction of `max_trials` after which a too-many-trials warning is raised.
pub const TRIAL_WARNING_FRACTION: f64 = 0.8;

/// Stability index below which the pattern is flagged as unstable.
pub const UNSTABLE_BELOW: f64 = 0.5;

/// Confidence the `QualityThreshold` reason additionally requires.
pub const QUALITY_CONFIDENCE: f64 = 0.9;

#[derive(Debug, Clone)]
pub struct ConvergenceAnalyzer {
    config: ConvergenceConfig,
}

/// Intermediate figures shared by the reason, grade and warning checks.
struct Figures {
    total_trials: u32,
    total_reversals: u32,
    window_cv: Option<f64>,
    early_cv: Option<f64>,
    variability: f64,
    confidence: f64,
    stability_index: f64,
    data_quality: f64,
}

impl ConvergenceAnalyzer {
    pub fn new(config: ConvergenceConfig) -> Result<Self, ConfigViolation> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ConvergenceConfig {
        &self.config
    }

    /// Analyse the history between `started_at` and `now`.
    ///
    /// A `now` earlier than `started_at` counts as zero elapsed time.
    pub fn analyze_since(
        &self,
        trials: &[Trial],
        started_at: DateTime<Utc>,
        now: DateTime<Utc>,
        current_level: f64,
    ) -> ConvergenceAnalysis {
        let elapsed = (now - started_at).to_std().unwrap_or_default();
        self.analyze(trials, elapsed, current_level)
    }

    /// Analyse a trial history given the elapsed wall-clock time.
    pub fn analyze(
        &self,
        trials: &[Trial],
        elapsed: Duration,
        current_level: f64,
    ) -> ConvergenceAnalysis {
        let levels: Vec<f64> = trials.iter().map(|t| t.level).collect();
        let reversal_levels: Vec<f64> = trials
            .iter()
            .filter(|t| t.is_reversal)
            .map(|t| t.level)
            .collect();

        let figures = self.figures(&levels, &reversal_levels);
        let quality = QualityGrade::grade(figures.variability, figures.confidence);
        let reason = self.reason(&figures, quality, elapsed);
        let warnings = self.warnings(&figures, &levels, elapsed);

        let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        let metrics = ConvergenceMetrics {
            version: ANALYSIS_VERSION,
            total_trials: figures.total_trials,
            total_reversals: figures.total_reversals,
            stability_index: figures.stability_index,
            variability: figures.variability,
            efficiency_score: (1.0
                - f64::from(figures.total_trials) / f64::from(self.config.max_trials))
            .clamp(0.0, 1.0),
            speed_score: (1.0 - elapsed_ms as f64 / self.config.max_duration_ms as f64)
                .clamp(0.0, 1.0),
            elapsed_ms,
            current_level,
            reversal_trend: detect_trend(
                tail(&reversal_levels, self.config.stability_window),
                DEFAULT_TREND_EPSILON,
            ),
        };

        debug!(
            reason = %reason,
            trials = figures.total_trials,
            reversals = figures.total_reversals,
            confidence = figures.confidence,
            quality = %quality,
            warnings = warnings.len(),
            "convergence analysed"
        );

        ConvergenceAnalysis {
            has_converged: reason.is_terminal(),
            reason,
            confidence: figures.confidence,
            stability: figures.stability_index,
            data_quality: figures.data_quality,
            quality,
            warnings,
            metrics,
        }
    }

    fn figures(&self, levels: &[f64], reversal_levels: &[f64]) -> Figures {
        let config = &self.config;
        let total_trials = u32::try_from(levels.len()).unwrap_or(u32::MAX);
        let total_reversals = u32::try_from(reversal_levels.len()).unwrap_or(u32::MAX);

        let window_cv = (reversal_levels.len() >= config.stability_min_samples)
            .then(|| coefficient_of_variation(tail(reversal_levels, config.stability_window)))
            .flatten();

        let early_cv = (config.early_convergence_enabled
            && levels.len() >= config.early_convergence_trials)
            .then(|| coefficient_of_variation(tail(levels, config.early_convergence_trials)))
            .flatten();

        let variability = window_cv.unwrap_or(1.0);
        let confidence = (1.0 - variability).clamp(0.0, 1.0);

        let stability_index = if levels.len() >= config.stability_min_samples {
            stability_from_cv(coefficient_of_variation(tail(levels, config.stability_window)))
        } else {
            0.0
        };

        let completeness = if config.min_reversals == 0 {
            1.0
        } else {
            (f64::from(total_reversals) / f64::from(config.min_reversals)).min(1.0)
        };

        Figures {
            total_trials,
            total_reversals,
            window_cv,
            early_cv,
            variability,
            confidence,
            stability_index,
            data_quality: confidence * completeness,
        }
    }

    fn reason(
        &self,
        figures: &Figures,
        quality: QualityGrade,
        elapsed: Duration,
    ) -> ConvergenceReason {
        let config = &self.config;

        if elapsed > config.max_duration() {
            return ConvergenceReason::Timeout;
        }
        if figures.total_trials >= config.max_trials {
            return ConvergenceReason::MaxTrials;
        }
        if figures.total_reversals >= config.target_reversals {
            return ConvergenceReason::TargetReversals;
        }
        if figures
            .early_cv
            .is_some_and(|cv| cv <= config.early_convergence_threshold)
        {
            return ConvergenceReason::EarlyConvergence;
        }
        if figures.total_reversals >= config.min_reversals
            && figures
                .window_cv
                .is_some_and(|cv| cv <= config.stability_threshold)
        {
            return ConvergenceReason::StabilityAchieved;
        }
        if quality == QualityGrade::Excellent && figures.confidence >= QUALITY_CONFIDENCE {
            return ConvergenceReason::QualityThreshold;
        }
        ConvergenceReason::NotConverged
    }

    fn warnings(&self, figures: &Figures, levels: &[f64], elapsed: Duration) -> Vec<Warning> {
        let config = &self.config;
        let mut warnings = Vec::new();

        if let Some(cv) = figures.window_cv {
            if cv > config.max_variability {
                warnings.push(Warning::HighVariability {
                    variability: cv,
                    limit: config.max_variability,
                });
            }
        }

        if figures.data_quality < config.min_confidence {
            warnings.push(Warning::LowConfidence {
                data_quality: figures.data_quality,
                minimum: config.min_confidence,
            });
        }

        if elapsed > config.timeout_warning() {
            warnings.push(Warning::ApproachingTimeout {
                elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
                warning_ms: config.timeout_warning_ms,
            });
        }

        if f64::from(figures.total_trials) > TRIAL_WARNING_FRACTION * f64::from(config.max_trials)
        {
            warnings.push(Warning::TooManyTrials {
                trials: figures.total_trials,
                max_trials: config.max_trials,
            });
        }

        if levels.len() >= config.stability_min_samples && figures.stability_index < UNSTABLE_BELOW
        {
            warnings.push(Warning::UnstablePattern {
                stability_index: figures.stability_index,
            });
        }

        let outliers = count_outliers(levels);
        if outliers > 0 {
            warnings.push(Warning::OutliersDetected { count: outliers });
        }

        warnings
    }
}

/// The last `n` values (all of them when shorter).
fn tail(values: &[f64], n: usize) -> &[f64] {
    &values[values.len().saturating_sub(n)..]
}

fn count_outliers(levels: &[f64]) -> usize {
    let m = mean(levels);
    let sd = population_std_dev(levels);
    if !m.is_finite() || !sd.is_finite() || sd == 0.0 {
        return 0;
    }
    levels
        .iter()
        .filter(|l| (*l - m).abs() > OUTLIER_SIGMA * sd)
        .count()
}
