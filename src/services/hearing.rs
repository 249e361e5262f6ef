//! Pure-tone hearing threshold test.
//!
//! Two-interval forced choice: a tone plays in one of two intervals and the
//! subject says which. The adapted level is the tone's sound pressure level,
//! stepped additively in dB.

use serde::{Deserialize, Serialize};

use super::categorized::{CategorizedTest, PerceptualTest, ResponseCategory};
use super::stimulus::StimulusContext;
use super::TestKind;
use crate::domain::models::staircase::{AdaptationMode, Direction, StaircaseConfig, StaircaseRule};

/// Interval the tone was played in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HearingInterval {
    First,
    Second,
}

impl ResponseCategory for HearingInterval {
    const ALL: &'static [Self] = &[Self::First, Self::Second];

    fn label(self) -> &'static str {
        match self {
            Self::First => "first",
            Self::Second => "second",
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Hearing;

impl PerceptualTest for Hearing {
    type Category = HearingInterval;

    const KIND: TestKind = TestKind::Hearing;

    fn default_staircase() -> StaircaseConfig {
        default_config()
    }

    /// The tone is presented at the staircase level itself.
    fn presentation_db(_stimulus: &StimulusContext, level: f64) -> f64 {
        level
    }
}

pub type HearingThresholdTest = CategorizedTest<Hearing>;

/// Additive dB steps over `[0, 80]` dB SPL.
pub fn default_config() -> StaircaseConfig {
    StaircaseConfig {
        initial_level: 40.0,
        min_level: 0.0,
        max_level: 80.0,
        initial_step_size: 8.0,
        step_sizes: vec![8.0, 8.0, 4.0, 4.0, 2.0, 2.0],
        target_reversals: 8,
        threshold_reversals: None,
        min_trials: 10,
        max_trials: 50,
        start_direction: Direction::Down,
        rule: StaircaseRule::TwoDownOneUp,
        adaptation_mode: AdaptationMode::Additive,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(default_config().validate().is_ok());
    }

    #[test]
    fn test_answer_is_scored_against_interval() {
        let mut test = HearingThresholdTest::with_defaults(StimulusContext::default()).unwrap();

        let step = test
            .record_response(HearingInterval::First, HearingInterval::First, Some(610.0))
            .unwrap();
        assert!(step.trial.trial.correct);
        assert!((step.trial.sound_level_db - 40.0).abs() < f64::EPSILON);

        let step = test
            .record_response(HearingInterval::Second, HearingInterval::First, None)
            .unwrap();
        assert!(!step.trial.trial.correct);
        assert_eq!(step.trial.actual, HearingInterval::Second);
        assert_eq!(step.trial.chosen, HearingInterval::First);
    }

    #[test]
    fn test_category_accuracy_breakdown() {
        let mut test = HearingThresholdTest::with_defaults(StimulusContext::default()).unwrap();
        let responses = [
            (HearingInterval::First, HearingInterval::First),
            (HearingInterval::First, HearingInterval::Second),
            (HearingInterval::Second, HearingInterval::Second),
            (HearingInterval::Second, HearingInterval::Second),
        ];
        for (actual, chosen) in responses {
            test.record_response(actual, chosen, None).unwrap();
        }

        let categories = test.category_accuracy();
        assert_eq!(categories.len(), 2);
        assert_eq!(categories[0].category, "first");
        assert_eq!(categories[0].trials, 2);
        assert!((categories[0].accuracy - 0.5).abs() < f64::EPSILON);
        assert_eq!(categories[1].category, "second");
        assert!((categories[1].accuracy - 1.0).abs() < f64::EPSILON);
        assert!((test.overall_accuracy() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_category_reports_zero() {
        let test = HearingThresholdTest::with_defaults(StimulusContext::default()).unwrap();
        assert!(test.category_accuracy().iter().all(|c| c.trials == 0 && c.accuracy == 0.0));
        assert!(test.overall_accuracy().abs() < f64::EPSILON);
    }

    #[test]
    fn test_reset_clears_decorated_trials() {
        let mut test = HearingThresholdTest::with_defaults(StimulusContext::default()).unwrap();
        test.record_response(HearingInterval::First, HearingInterval::First, None)
            .unwrap();
        test.reset();
        assert!(test.trials().is_empty());
        assert!((test.current_level() - 40.0).abs() < f64::EPSILON);
    }
}
