//! Comparison of completed sessions for the same test.

use serde::{Deserialize, Serialize};

use super::descriptive::{coefficient_of_variation, mean, stability_from_cv};
use crate::domain::errors::{ensure_finite, StatisticsError};
use crate::domain::models::convergence::trend::{
    detect_trend, Polarity, SessionTrend, DEFAULT_TREND_EPSILON,
};

/// Fewest sessions a comparison accepts.
pub const MIN_SESSIONS: usize = 2;

/// Anything that carries a final threshold and its confidence.
pub trait ThresholdRecord {
    fn threshold(&self) -> f64;
    fn confidence(&self) -> f64;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionComparison {
    /// Relative change from the first to the last threshold, signed so that
    /// positive means better under the given polarity. Zero when the first
    /// threshold is zero.
    pub improvement: f64,
    /// `1 - CV(thresholds)`, clamped to `[0, 1]`.
    pub consistency: f64,
    /// Mean confidence across sessions.
    pub reliability: f64,
    pub trend: SessionTrend,
    pub sessions: usize,
}

/// Compare results in chronological order.
pub fn compare_sessions<R: ThresholdRecord>(
    results: &[R],
    polarity: Polarity,
) -> Result<SessionComparison, StatisticsError> {
    if results.len() < MIN_SESSIONS {
        return Err(StatisticsError::TooFewSessions {
            required: MIN_SESSIONS,
            actual: results.len(),
        });
    }

    let thresholds: Vec<f64> = results.iter().map(ThresholdRecord::threshold).collect();
    let confidences: Vec<f64> = results.iter().map(ThresholdRecord::confidence).collect();
    ensure_finite(&thresholds)?;
    ensure_finite(&confidences)?;

    let first = thresholds[0];
    let last = thresholds[thresholds.len() - 1];
    let improvement = if first == 0.0 {
        0.0
    } else {
        let relative = (last - first) / first.abs();
        match polarity {
            Polarity::LowerIsBetter => -relative,
            Polarity::HigherIsBetter => relative,
        }
    };

    if !improvement.is_finite() {
        return Err(StatisticsError::NonFiniteResult {
            quantity: "improvement",
        });
    }

    let direction = detect_trend(&thresholds, DEFAULT_TREND_EPSILON).direction;

    Ok(SessionComparison {
        improvement,
        consistency: stability_from_cv(coefficient_of_variation(&thresholds)),
        reliability: mean(&confidences),
        trend: SessionTrend::from_direction(direction, polarity),
        sessions: results.len(),
    })
}
