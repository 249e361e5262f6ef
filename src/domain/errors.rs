//! Domain errors for the adaptive staircase core.
//!
//! Fatal misuse (bad configuration, calls after termination, insufficient data
//! for a statistic) is reported through these types. Recoverable numeric
//! degradation is *not* an error; it is recorded as a
//! [`NumericAnomaly`](crate::domain::models::staircase::NumericAnomaly) and the
//! controller carries on with the last known-good value.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// A configuration rule that was violated at construction time.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigViolation {
    #[error("min_level ({min}) must not exceed max_level ({max})")]
    InvertedBounds { min: f64, max: f64 },

    #[error("initial_level ({level}) lies outside [{min}, {max}]")]
    InitialLevelOutOfBounds { level: f64, min: f64, max: f64 },

    #[error("step_sizes must contain at least one entry")]
    EmptyStepSchedule,

    #[error("step size {value} at position {index} is invalid: {reason}")]
    InvalidStepSize {
        index: usize,
        value: f64,
        reason: &'static str,
    },

    #[error("initial_step_size {value} is invalid: {reason}")]
    InvalidInitialStep { value: f64, reason: &'static str },

    #[error("target_reversals must be at least 1")]
    ZeroTargetReversals,

    #[error("{field} ({value}) exceeds target_reversals ({target})")]
    ReversalsInconsistent {
        field: &'static str,
        value: u32,
        target: u32,
    },

    #[error("min_trials ({min}) exceeds max_trials ({max})")]
    TrialsInconsistent { min: u32, max: u32 },

    #[error("max_trials must be at least 1")]
    ZeroMaxTrials,

    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f64 },

    #[error("{field} must lie in {range}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        range: &'static str,
    },

    #[error("{field} must be at least 1")]
    ZeroCount { field: &'static str },

    #[error("{field} is not a finite number")]
    NonFinite { field: &'static str },
}

/// Errors raised by the staircase controller and the session driver.
#[derive(Debug, Error)]
pub enum StaircaseError {
    #[error("Invalid staircase configuration: {0}")]
    InvalidConfig(#[from] ConfigViolation),

    #[error("Staircase already completed at {completed_at}; no further trials accepted")]
    SessionCompleted { completed_at: DateTime<Utc> },

    #[error("Reaction time must be non-negative, got {0} ms")]
    NegativeReactionTime(f64),

    #[error("Reaction time must be a finite number")]
    NonFiniteReactionTime,

    #[error("Staircase has not completed yet; no result available")]
    NotCompleted,

    #[error("Threshold statistics failed: {0}")]
    Statistics(#[from] StatisticsError),
}

/// Which pass of threshold estimation ran out of samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleStage {
    BeforeOutlierRemoval,
    AfterOutlierRemoval,
}

impl std::fmt::Display for SampleStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BeforeOutlierRemoval => write!(f, "before outlier removal"),
            Self::AfterOutlierRemoval => write!(f, "after outlier removal"),
        }
    }
}

/// Errors raised by the pure statistics functions.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StatisticsError {
    #[error("Insufficient samples {stage}: need {required}, have {actual}")]
    InsufficientSamples {
        required: usize,
        actual: usize,
        stage: SampleStage,
    },

    #[error("Non-finite input value at index {index}")]
    NonFiniteInput { index: usize },

    #[error("Computation produced a non-finite {quantity}")]
    NonFiniteResult { quantity: &'static str },

    #[error("Invalid statistics configuration: {0}")]
    InvalidConfig(#[from] ConfigViolation),

    #[error("Session comparison needs at least {required} results, got {actual}")]
    TooFewSessions { required: usize, actual: usize },

    #[error("Input sequence is empty")]
    EmptyInput,
}

/// Reject any non-finite entry, reporting its position.
pub(crate) fn ensure_finite(values: &[f64]) -> Result<(), StatisticsError> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(StatisticsError::NonFiniteInput { index }),
        None => Ok(()),
    }
}
