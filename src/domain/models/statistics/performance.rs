//! Response-level performance metrics for a trial history.

use serde::{Deserialize, Serialize};

use super::descriptive::mean;
use crate::domain::errors::{ensure_finite, StatisticsError};
use crate::domain::models::staircase::Trial;

/// Learning is declared when the first-half error rate exceeds the second-half
/// rate by more than this.
pub const LEARNING_ERROR_DROP: f64 = 0.2;

/// Half-width of the level band errors must cluster in to be systematic.
pub const SYSTEMATIC_BAND: f64 = 0.1;

/// Fewest errors for which clustering is meaningful.
pub const MIN_ERRORS_FOR_PATTERN: usize = 3;

/// Shape of the error distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPattern {
    Random,
    Systematic,
    Learning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// Fraction of correct responses.
    pub accuracy: f64,
    /// Fraction of level changes followed by the expected response (correct
    /// after an increase, incorrect after a decrease). `0.5` when the level
    /// never changed.
    pub reaction_consistency: f64,
    /// Mean inter-reversal distance mapped from 1..=10 trials onto 1..=0.
    pub adaptation_rate: f64,
    pub error_pattern: ErrorPattern,
}

pub fn performance_metrics(trials: &[Trial]) -> Result<PerformanceMetrics, StatisticsError> {
    if trials.is_empty() {
        return Err(StatisticsError::EmptyInput);
    }
    let levels: Vec<f64> = trials.iter().map(|t| t.level).collect();
    ensure_finite(&levels)?;

    let correct = trials.iter().filter(|t| t.correct).count();
    let accuracy = correct as f64 / trials.len() as f64;

    Ok(PerformanceMetrics {
        accuracy,
        reaction_consistency: reaction_consistency(trials),
        adaptation_rate: adaptation_rate(trials),
        error_pattern: error_pattern(trials),
    })
}

fn reaction_consistency(trials: &[Trial]) -> f64 {
    let (consistent, considered) =
        trials
            .windows(2)
            .fold((0usize, 0usize), |(consistent, considered), pair| {
                let delta = pair[1].level - pair[0].level;
                if delta == 0.0 {
                    return (consistent, considered);
                }
                let expected = (delta > 0.0) == pair[1].correct;
                (consistent + usize::from(expected), considered + 1)
            });

    if considered == 0 {
        0.5
    } else {
        consistent as f64 / considered as f64
    }
}

fn adaptation_rate(trials: &[Trial]) -> f64 {
    let reversal_positions: Vec<f64> = trials
        .iter()
        .filter(|t| t.is_reversal)
        .map(|t| f64::from(t.index))
        .collect();
    if reversal_positions.len() < 2 {
        return 0.0;
    }
    let gaps: Vec<f64> = reversal_positions.windows(2).map(|w| w[1] - w[0]).collect();
    let mean_gap = mean(&gaps);
    (1.0 - (mean_gap - 1.0) / 9.0).clamp(0.0, 1.0)
}

fn error_pattern(trials: &[Trial]) -> ErrorPattern {
    let mid = trials.len() / 2;
    let (first, second) = trials.split_at(mid);
    if error_rate(first) - error_rate(second) > LEARNING_ERROR_DROP {
        return ErrorPattern::Learning;
    }

    let error_levels: Vec<f64> = trials
        .iter()
        .filter(|t| !t.correct)
        .map(|t| t.level)
        .collect();
    if error_levels.len() < MIN_ERRORS_FOR_PATTERN {
        return ErrorPattern::Random;
    }

    let densest = error_levels
        .iter()
        .map(|centre| {
            error_levels
                .iter()
                .filter(|l| (*l - centre).abs() <= SYSTEMATIC_BAND)
                .count()
        })
        .max()
        .unwrap_or(0);

    if densest * 2 > error_levels.len() {
        ErrorPattern::Systematic
    } else {
        ErrorPattern::Random
    }
}

fn error_rate(trials: &[Trial]) -> f64 {
    if trials.is_empty() {
        return 0.0;
    }
    trials.iter().filter(|t| !t.correct).count() as f64 / trials.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::staircase::Direction;
    use chrono::Utc;

    fn trial(index: u32, level: f64, correct: bool, is_reversal: bool) -> Trial {
        Trial {
            index,
            level,
            correct,
            is_reversal,
            step_size: 1.0,
            direction: if correct { Direction::Down } else { Direction::Up },
            next_level: level,
            reaction_time_ms: None,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_empty_history_rejected() {
        assert_eq!(performance_metrics(&[]), Err(StatisticsError::EmptyInput));
    }

    #[test]
    fn test_accuracy() {
        let trials = vec![
            trial(0, 10.0, true, false),
            trial(1, 10.0, false, false),
            trial(2, 10.0, true, false),
            trial(3, 10.0, true, false),
        ];
        let metrics = performance_metrics(&trials).unwrap();
        assert!((metrics.accuracy - 0.75).abs() < 1e-12);
        // level never changed
        assert!((metrics.reaction_consistency - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_reaction_consistency() {
        let trials = vec![
            trial(0, 10.0, false, false),
            trial(1, 12.0, true, false),  // up then correct: consistent
            trial(2, 10.0, false, false), // down then wrong: consistent
            trial(3, 12.0, false, false), // up then wrong: inconsistent
        ];
        let metrics = performance_metrics(&trials).unwrap();
        assert!((metrics.reaction_consistency - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_adaptation_rate_from_reversal_spacing() {
        let mut trials: Vec<Trial> = (0..12).map(|i| trial(i, 10.0, true, false)).collect();
        trials[1].is_reversal = true;
        trials[4].is_reversal = true;
        trials[7].is_reversal = true;
        // mean gap 3 -> 1 - 2/9
        let metrics = performance_metrics(&trials).unwrap();
        assert!((metrics.adaptation_rate - (1.0 - 2.0 / 9.0)).abs() < 1e-12);
    }

    #[test]
    fn test_learning_pattern() {
        let mut trials = Vec::new();
        for i in 0..5 {
            trials.push(trial(i, 20.0 + f64::from(i), i % 5 == 4, false));
        }
        for i in 5..10 {
            trials.push(trial(i, 20.0 + f64::from(i), true, false));
        }
        let metrics = performance_metrics(&trials).unwrap();
        assert_eq!(metrics.error_pattern, ErrorPattern::Learning);
    }

    #[test]
    fn test_systematic_pattern() {
        let levels_and_answers = [
            (10.0, false),
            (30.0, true),
            (10.05, false),
            (40.0, true),
            (50.0, false),
            (9.95, false),
            (20.0, true),
            (60.0, true),
        ];
        let trials: Vec<Trial> = levels_and_answers
            .iter()
            .enumerate()
            .map(|(i, &(level, correct))| trial(i as u32, level, correct, false))
            .collect();
        let metrics = performance_metrics(&trials).unwrap();
        assert_eq!(metrics.error_pattern, ErrorPattern::Systematic);
    }

    #[test]
    fn test_random_pattern() {
        let levels_and_answers = [
            (10.0, false),
            (30.0, true),
            (20.0, true),
            (40.0, false),
            (50.0, true),
            (60.0, false),
        ];
        let trials: Vec<Trial> = levels_and_answers
            .iter()
            .enumerate()
            .map(|(i, &(level, correct))| trial(i as u32, level, correct, false))
            .collect();
        let metrics = performance_metrics(&trials).unwrap();
        assert_eq!(metrics.error_pattern, ErrorPattern::Random);
    }
}
