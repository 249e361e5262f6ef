pub mod convergence;
pub mod staircase;
pub mod statistics;

pub use convergence::{ConvergenceAnalysis, ConvergenceAnalyzer, ConvergenceConfig};
pub use staircase::{StaircaseConfig, StaircaseController, StaircaseResult, Trial};
pub use statistics::StatisticsConfig;
