//! Learning-curve analysis over the sequence of presented levels.

use serde::{Deserialize, Serialize};

use super::descriptive::{
    coefficient_of_variation, least_squares_slope, population_variance, stability_from_cv,
};
use crate::domain::errors::{ensure_finite, StatisticsError};
use crate::domain::models::convergence::trend::{detect_trend, Trend, DEFAULT_TREND_EPSILON};
use crate::domain::models::staircase::Trial;

/// Trailing window used to locate the convergence point.
pub const CONVERGENCE_WINDOW: usize = 5;

/// Largest CV of the trailing window that counts as converged.
pub const CONVERGENCE_CV: f64 = 0.10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningCurve {
    /// Relative variance reduction from the first half to the second,
    /// `max(0, (var_first - var_second) / var_first)`.
    pub learning_rate: f64,
    /// `1 - CV(second half)`, clamped to `[0, 1]`.
    pub stability_index: f64,
    /// Earliest index whose trailing window has CV at or below
    /// [`CONVERGENCE_CV`]; the sequence length if never reached.
    pub convergence_point: usize,
    pub trend: Trend,
}

/// Analyse the levels of a trial history.
pub fn analyze_learning_curve(trials: &[Trial]) -> Result<LearningCurve, StatisticsError> {
    let levels: Vec<f64> = trials.iter().map(|t| t.level).collect();
    analyze_level_sequence(&levels)
}

/// Analyse an ordered level sequence.
pub fn analyze_level_sequence(levels: &[f64]) -> Result<LearningCurve, StatisticsError> {
    if levels.is_empty() {
        return Err(StatisticsError::EmptyInput);
    }
    ensure_finite(levels)?;

    let mid = levels.len() / 2;
    let (first, second) = levels.split_at(mid);

    let var_first = population_variance(first);
    let var_second = population_variance(second);
    if !var_first.is_finite() || !var_second.is_finite() {
        return Err(StatisticsError::NonFiniteResult {
            quantity: "variance",
        });
    }
    if !least_squares_slope(levels).is_finite() {
        return Err(StatisticsError::NonFiniteResult {
            quantity: "trend_slope",
        });
    }

    let learning_rate = if var_first > 0.0 {
        ((var_first - var_second) / var_first).max(0.0)
    } else {
        0.0
    };

    let stability_index = stability_from_cv(coefficient_of_variation(second));

    Ok(LearningCurve {
        learning_rate,
        stability_index,
        convergence_point: convergence_point(levels),
        trend: detect_trend(levels, DEFAULT_TREND_EPSILON),
    })
}

fn convergence_point(levels: &[f64]) -> usize {
    if levels.len() < CONVERGENCE_WINDOW {
        return levels.len();
    }
    (CONVERGENCE_WINDOW - 1..levels.len())
        .find(|&i| {
            coefficient_of_variation(&levels[i + 1 - CONVERGENCE_WINDOW..=i])
                .is_some_and(|cv| cv <= CONVERGENCE_CV)
        })
        .unwrap_or(levels.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::convergence::trend::TrendDirection;

    #[test]
    fn test_empty_sequence_rejected() {
        assert_eq!(analyze_level_sequence(&[]), Err(StatisticsError::EmptyInput));
    }

    #[test]
    fn test_non_finite_rejected() {
        assert_eq!(
            analyze_level_sequence(&[1.0, f64::INFINITY]),
            Err(StatisticsError::NonFiniteInput { index: 1 })
        );
    }

    #[test]
    fn test_settling_sequence() {
        let levels = [50.0, 30.0, 70.0, 20.0, 60.0, 40.0, 41.0, 40.0, 41.0, 40.0, 41.0, 40.0];
        let curve = analyze_level_sequence(&levels).unwrap();

        assert!(curve.learning_rate > 0.9);
        assert!(curve.stability_index > 0.95);
        // 5..=9 is the first window without a value from the noisy start
        assert_eq!(curve.convergence_point, 9);
        assert_eq!(curve.trend.direction, TrendDirection::Falling);
    }

    #[test]
    fn test_never_converging_reports_length() {
        let levels = [10.0, 50.0, 10.0, 50.0, 10.0, 50.0];
        let curve = analyze_level_sequence(&levels).unwrap();
        assert_eq!(curve.convergence_point, levels.len());
        assert!(curve.learning_rate.abs() < 1e-12);
    }

    #[test]
    fn test_overflowing_variance_rejected() {
        assert_eq!(
            analyze_level_sequence(&[1e308, -1e308, 1e308, -1e308]),
            Err(StatisticsError::NonFiniteResult {
                quantity: "variance"
            })
        );
    }

    #[test]
    fn test_short_sequence() {
        let curve = analyze_level_sequence(&[5.0]).unwrap();
        assert_eq!(curve.convergence_point, 1);
        assert!(curve.learning_rate.abs() < f64::EPSILON);
    }
}
