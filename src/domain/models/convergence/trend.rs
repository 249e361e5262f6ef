//! Least-squares trend detection over ordered numeric sequences.
//!
//! The raw direction of a sequence (`Rising`, `Falling`, `Flat`) is separated
//! from its meaning. Whether a falling threshold is an improvement depends on
//! the test, so callers pass a [`Polarity`] to [`SessionTrend::from_direction`].

use serde::{Deserialize, Serialize};

use crate::domain::models::statistics::descriptive::least_squares_slope;

/// Default slope magnitude below which a sequence is considered flat.
pub const DEFAULT_TREND_EPSILON: f64 = 0.01;

/// Direction of a fitted slope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Rising,
    Flat,
    Falling,
}

/// Which way a threshold has to move to count as better performance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    /// Lower thresholds mean finer perception (all tests in this crate).
    #[default]
    LowerIsBetter,
    HigherIsBetter,
}

/// Trend interpreted against a [`Polarity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionTrend {
    Improving,
    Stable,
    Declining,
}

impl SessionTrend {
    pub fn from_direction(direction: TrendDirection, polarity: Polarity) -> Self {
        match (direction, polarity) {
            (TrendDirection::Flat, _) => Self::Stable,
            (TrendDirection::Falling, Polarity::LowerIsBetter)
            | (TrendDirection::Rising, Polarity::HigherIsBetter) => Self::Improving,
            (TrendDirection::Rising, Polarity::LowerIsBetter)
            | (TrendDirection::Falling, Polarity::HigherIsBetter) => Self::Declining,
        }
    }
}

impl std::fmt::Display for SessionTrend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Improving => write!(f, "improving"),
            Self::Stable => write!(f, "stable"),
            Self::Declining => write!(f, "declining"),
        }
    }
}

/// A fitted trend: the slope and its classified direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    pub slope: f64,
    pub direction: TrendDirection,
}

/// Fit a least-squares slope over `values` and classify it.
///
/// `|slope| < epsilon` is `Flat`. Non-finite slopes (non-finite input or
/// overflow) are reported as flat with a zero slope.
pub fn detect_trend(values: &[f64], epsilon: f64) -> Trend {
    let slope = least_squares_slope(values);
    if !slope.is_finite() || slope.abs() < epsilon {
        return Trend {
            slope: if slope.is_finite() { slope } else { 0.0 },
            direction: TrendDirection::Flat,
        };
    }
    Trend {
        slope,
        direction: if slope > 0.0 {
            TrendDirection::Rising
        } else {
            TrendDirection::Falling
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_trend_directions() {
        assert_eq!(
            detect_trend(&[1.0, 2.0, 3.0], DEFAULT_TREND_EPSILON).direction,
            TrendDirection::Rising
        );
        assert_eq!(
            detect_trend(&[3.0, 2.0, 1.0], DEFAULT_TREND_EPSILON).direction,
            TrendDirection::Falling
        );
        assert_eq!(
            detect_trend(&[2.0, 2.001, 2.0], DEFAULT_TREND_EPSILON).direction,
            TrendDirection::Flat
        );
    }

    #[test]
    fn test_detect_trend_short_sequence_is_flat() {
        let trend = detect_trend(&[7.0], DEFAULT_TREND_EPSILON);
        assert_eq!(trend.direction, TrendDirection::Flat);
        assert!(trend.slope.abs() < f64::EPSILON);
    }

    #[test]
    fn test_polarity_mapping() {
        assert_eq!(
            SessionTrend::from_direction(TrendDirection::Falling, Polarity::LowerIsBetter),
            SessionTrend::Improving
        );
        assert_eq!(
            SessionTrend::from_direction(TrendDirection::Falling, Polarity::HigherIsBetter),
            SessionTrend::Declining
        );
        assert_eq!(
            SessionTrend::from_direction(TrendDirection::Rising, Polarity::HigherIsBetter),
            SessionTrend::Improving
        );
        assert_eq!(
            SessionTrend::from_direction(TrendDirection::Flat, Polarity::LowerIsBetter),
            SessionTrend::Stable
        );
    }
}
