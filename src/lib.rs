//! Adaptive up-down staircase for psychophysical threshold testing.
//!
//! The crate follows a layered layout:
//! - `domain`: the staircase controller, convergence analysis and threshold
//!   statistics, all pure and synchronous
//! - `services`: test sessions and the per-test adapters
//! - `infrastructure`: configuration loading and logging
//! - `cli`: the `staircase` binary's commands

pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

pub use domain::errors::{ConfigViolation, StaircaseError, StatisticsError};
pub use domain::models::{
    ConvergenceAnalysis, ConvergenceAnalyzer, ConvergenceConfig, StaircaseConfig,
    StaircaseController, StaircaseResult, StatisticsConfig, Trial,
};
pub use services::{StimulusContext, TestKind, TestSession};
