//! Threshold statistics.
//!
//! Pure functions over reversal levels or trial histories: threshold
//! estimation with outlier removal and confidence intervals, learning-curve
//! analysis, response-level performance metrics, and multi-session
//! comparison. None of them keep state, and all reject non-finite input.

pub mod descriptive;
pub mod learning;
pub mod performance;
pub mod sessions;
pub mod threshold;

pub use learning::{analyze_learning_curve, analyze_level_sequence, LearningCurve};
pub use performance::{performance_metrics, ErrorPattern, PerformanceMetrics};
pub use sessions::{compare_sessions, SessionComparison, ThresholdRecord};
pub use threshold::{
    threshold_from_reversals, threshold_from_trials, z_score, ConfidenceInterval,
    StatisticsConfig, ThresholdMethod, ThresholdStatistics,
};
