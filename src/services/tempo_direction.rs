//! Tempo-direction discrimination test.
//!
//! A simple isochronous sequence speeds up or slows down and the subject
//! says which. The adapted level is the inter-onset-interval slope in
//! ms/beat, stepped multiplicatively.

use serde::{Deserialize, Serialize};

use super::beat_pattern::RHYTHM_STEP_FACTORS;
use super::categorized::{CategorizedTest, PerceptualTest, ResponseCategory};
use super::TestKind;
use crate::domain::models::staircase::{AdaptationMode, Direction, StaircaseConfig, StaircaseRule};

/// Direction the tempo drifts in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TempoChange {
    Accelerando,
    Ritardando,
}

impl ResponseCategory for TempoChange {
    const ALL: &'static [Self] = &[Self::Accelerando, Self::Ritardando];

    fn label(self) -> &'static str {
        match self {
            Self::Accelerando => "accelerando",
            Self::Ritardando => "ritardando",
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TempoDirection;

impl PerceptualTest for TempoDirection {
    type Category = TempoChange;

    const KIND: TestKind = TestKind::TempoDirection;

    fn default_staircase() -> StaircaseConfig {
        default_config()
    }
}

pub type TempoDirectionTest = CategorizedTest<TempoDirection>;

/// IOI slope between 0.5 and 50 ms/beat, starting at 20.
pub fn default_config() -> StaircaseConfig {
    StaircaseConfig {
        initial_level: 20.0,
        min_level: 0.5,
        max_level: 50.0,
        initial_step_size: RHYTHM_STEP_FACTORS[0],
        step_sizes: RHYTHM_STEP_FACTORS.to_vec(),
        target_reversals: 8,
        threshold_reversals: None,
        min_trials: 12,
        max_trials: 60,
        start_direction: Direction::Down,
        rule: StaircaseRule::TwoDownOneUp,
        adaptation_mode: AdaptationMode::Multiplicative,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::StimulusContext;

    #[test]
    fn test_default_config_is_valid() {
        assert!(default_config().validate().is_ok());
    }

    #[test]
    fn test_wrong_direction_makes_task_easier() {
        let mut test = TempoDirectionTest::with_defaults(StimulusContext::default()).unwrap();
        let step = test
            .record_response(TempoChange::Accelerando, TempoChange::Ritardando, Some(900.0))
            .unwrap();
        assert!(!step.trial.trial.correct);
        assert!(test.current_level() > 20.0);
        assert!(test.current_level() <= 50.0);
    }

    #[test]
    fn test_accuracy_split_by_direction() {
        let mut test = TempoDirectionTest::with_defaults(StimulusContext::default()).unwrap();
        for _ in 0..3 {
            test.record_response(TempoChange::Accelerando, TempoChange::Accelerando, None)
                .unwrap();
        }
        test.record_response(TempoChange::Ritardando, TempoChange::Accelerando, None)
            .unwrap();

        let categories = test.category_accuracy();
        assert_eq!(categories[0].category, "accelerando");
        assert_eq!(categories[0].correct, 3);
        assert_eq!(categories[1].category, "ritardando");
        assert_eq!(categories[1].correct, 0);
        assert_eq!(categories[1].trials, 1);
    }
}
