//! Adaptive up/down staircase.
//!
//! A [`StaircaseController`] adjusts the stimulus level trial by trial from
//! correct/incorrect responses so that it oscillates around the subject's
//! threshold. The level moves by a step that shrinks as reversals accumulate;
//! the threshold is estimated from the levels at which the direction flipped.

pub mod config;
pub mod controller;
pub mod diagnostics;
pub mod estimate;
pub mod state;
pub mod trial;

pub use config::{
    AdaptationMode, Direction, StaircaseConfig, StaircaseRule, DEFAULT_THRESHOLD_REVERSALS,
    MIN_THRESHOLD_REVERSALS,
};
pub use controller::StaircaseController;
pub use diagnostics::{AnomalyKind, ControllerDiagnostics, NumericAnomaly, DIAGNOSTICS_VERSION};
pub use estimate::{
    same_pass_estimate, EstimateBasis, StaircaseResult, ThresholdEstimate, LOW_CONFIDENCE_CAP,
    SAFE_DEFAULT_CONFIDENCE,
};
pub use state::StaircaseState;
pub use trial::Trial;
