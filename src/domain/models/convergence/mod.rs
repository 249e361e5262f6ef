//! Convergence analysis for staircase runs.

pub mod analysis;
pub mod analyzer;
pub mod config;
pub mod trend;

pub use analysis::{
    ConvergenceAnalysis, ConvergenceMetrics, ConvergenceReason, QualityGrade, Warning,
    ANALYSIS_VERSION,
};
pub use analyzer::ConvergenceAnalyzer;
pub use config::ConvergenceConfig;
pub use trend::{
    detect_trend, Polarity, SessionTrend, Trend, TrendDirection, DEFAULT_TREND_EPSILON,
};
