//! Domain layer for the adaptive staircase
//!
//! This module contains the staircase controller, convergence analysis and
//! threshold statistics. Nothing here performs I/O.

pub mod errors;
pub mod models;

pub use errors::{ConfigViolation, SampleStage, StaircaseError, StatisticsError};
