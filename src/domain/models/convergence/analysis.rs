//! The convergence verdict and its supporting metrics.
//!
//! A [`ConvergenceAnalysis`] is recomputed from the trial history every time
//! it is requested and is never stored as mutable state.

use serde::{Deserialize, Serialize};

use super::trend::Trend;

/// Bumped whenever a field is added to or removed from [`ConvergenceMetrics`].
pub const ANALYSIS_VERSION: u32 = 1;

// ============================================================================
// Reason
// ============================================================================

/// Why a run stopped, in precedence order. The first matching reason wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConvergenceReason {
    Timeout,
    MaxTrials,
    TargetReversals,
    EarlyConvergence,
    StabilityAchieved,
    QualityThreshold,
    NotConverged,
}

impl ConvergenceReason {
    /// Whether this reason ends the run.
    pub fn is_terminal(self) -> bool {
        self != Self::NotConverged
    }

    /// Whether the run ended because a limit was hit rather than because the
    /// estimate settled.
    pub fn is_limit(self) -> bool {
        matches!(self, Self::Timeout | Self::MaxTrials)
    }
}

impl std::fmt::Display for ConvergenceReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Timeout => "timeout",
            Self::MaxTrials => "max_trials",
            Self::TargetReversals => "target_reversals",
            Self::EarlyConvergence => "early_convergence",
            Self::StabilityAchieved => "stability_achieved",
            Self::QualityThreshold => "quality_threshold",
            Self::NotConverged => "not_converged",
        };
        write!(f, "{s}")
    }
}

// ============================================================================
// Quality
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityGrade {
    Poor,
    Acceptable,
    Good,
    Excellent,
}

impl QualityGrade {
    /// Grade from reversal-level variability and the confidence derived from it.
    pub fn grade(variability: f64, confidence: f64) -> Self {
        if confidence >= 0.9 && variability <= 0.10 {
            Self::Excellent
        } else if confidence >= 0.8 && variability <= 0.20 {
            Self::Good
        } else if confidence >= 0.7 && variability <= 0.30 {
            Self::Acceptable
        } else {
            Self::Poor
        }
    }
}

impl std::fmt::Display for QualityGrade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Excellent => write!(f, "excellent"),
            Self::Good => write!(f, "good"),
            Self::Acceptable => write!(f, "acceptable"),
            Self::Poor => write!(f, "poor"),
        }
    }
}

// ============================================================================
// Warnings
// ============================================================================

/// Independent, non-exclusive quality flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    HighVariability { variability: f64, limit: f64 },
    LowConfidence { data_quality: f64, minimum: f64 },
    ApproachingTimeout { elapsed_ms: u64, warning_ms: u64 },
    TooManyTrials { trials: u32, max_trials: u32 },
    UnstablePattern { stability_index: f64 },
    OutliersDetected { count: usize },
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HighVariability { variability, limit } => {
                write!(f, "high variability ({variability:.3} > {limit:.3})")
            }
            Self::LowConfidence {
                data_quality,
                minimum,
            } => write!(f, "low confidence ({data_quality:.3} < {minimum:.3})"),
            Self::ApproachingTimeout {
                elapsed_ms,
                warning_ms,
            } => write!(f, "approaching timeout ({elapsed_ms}ms > {warning_ms}ms)"),
            Self::TooManyTrials { trials, max_trials } => {
                write!(f, "many trials ({trials} of {max_trials})")
            }
            Self::UnstablePattern { stability_index } => {
                write!(f, "unstable pattern (stability {stability_index:.3})")
            }
            Self::OutliersDetected { count } => write!(f, "{count} outlier level(s)"),
        }
    }
}

// ============================================================================
// Metrics & Analysis
// ============================================================================

/// Fixed, versioned diagnostics computed alongside the verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceMetrics {
    pub version: u32,
    pub total_trials: u32,
    pub total_reversals: u32,
    /// `1 - CV` of the trailing trial levels, `0` with too few trials.
    pub stability_index: f64,
    /// CV of the trailing reversal window, `1` with too few reversals.
    pub variability: f64,
    /// `1 - trials / max_trials`, clamped to `[0, 1]`.
    pub efficiency_score: f64,
    /// `1 - elapsed / max_duration`, clamped to `[0, 1]`.
    pub speed_score: f64,
    pub elapsed_ms: u64,
    pub current_level: f64,
    /// Drift of the reversal levels; a settled staircase is flat.
    pub reversal_trend: Trend,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceAnalysis {
    pub has_converged: bool,
    pub reason: ConvergenceReason,
    /// `1 - variability`, clamped to `[0, 1]`.
    pub confidence: f64,
    pub stability: f64,
    /// Confidence scaled by how many of the required reversals exist.
    pub data_quality: f64,
    pub quality: QualityGrade,
    pub warnings: Vec<Warning>,
    pub metrics: ConvergenceMetrics,
}

impl ConvergenceAnalysis {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_grading_bands() {
        assert_eq!(QualityGrade::grade(0.05, 0.95), QualityGrade::Excellent);
        assert_eq!(QualityGrade::grade(0.15, 0.85), QualityGrade::Good);
        assert_eq!(QualityGrade::grade(0.25, 0.75), QualityGrade::Acceptable);
        assert_eq!(QualityGrade::grade(0.45, 0.55), QualityGrade::Poor);
        // confidence alone is not enough
        assert_eq!(QualityGrade::grade(0.15, 0.95), QualityGrade::Good);
    }

    #[test]
    fn test_grades_are_ordered() {
        assert!(QualityGrade::Excellent > QualityGrade::Good);
        assert!(QualityGrade::Acceptable > QualityGrade::Poor);
    }

    #[test]
    fn test_reason_classification() {
        assert!(!ConvergenceReason::NotConverged.is_terminal());
        assert!(ConvergenceReason::EarlyConvergence.is_terminal());
        assert!(ConvergenceReason::Timeout.is_limit());
        assert!(!ConvergenceReason::StabilityAchieved.is_limit());
    }

    #[test]
    fn test_warning_serializes_with_kind_tag() {
        let json = serde_json::to_value(Warning::OutliersDetected { count: 2 }).unwrap();
        assert_eq!(json["kind"], "outliers_detected");
        assert_eq!(json["count"], 2);
    }
}
