//! Tempo discrimination inside a complex rhythm.
//!
//! Same judgement as the tempo-direction test, but the drifting sequence is
//! a syncopated pattern rather than an isochronous click train, so the
//! staircase starts easier and has a wider range.

use super::beat_pattern::RHYTHM_STEP_FACTORS;
use super::categorized::{CategorizedTest, PerceptualTest};
use super::tempo_direction::TempoChange;
use super::TestKind;
use crate::domain::models::staircase::{AdaptationMode, Direction, StaircaseConfig, StaircaseRule};

#[derive(Debug, Clone, Copy, Default)]
pub struct ComplexRhythm;

impl PerceptualTest for ComplexRhythm {
    type Category = TempoChange;

    const KIND: TestKind = TestKind::ComplexRhythm;

    fn default_staircase() -> StaircaseConfig {
        default_config()
    }
}

pub type ComplexRhythmTest = CategorizedTest<ComplexRhythm>;

/// IOI slope between 0.5 and 60 ms/beat, starting at 25.
pub fn default_config() -> StaircaseConfig {
    StaircaseConfig {
        initial_level: 25.0,
        min_level: 0.5,
        max_level: 60.0,
        initial_step_size: RHYTHM_STEP_FACTORS[0],
        step_sizes: RHYTHM_STEP_FACTORS.to_vec(),
        target_reversals: 8,
        threshold_reversals: None,
        min_trials: 12,
        max_trials: 70,
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
    fn test_kind_and_start_level() {
        let test = ComplexRhythmTest::with_defaults(StimulusContext::default()).unwrap();
        assert_eq!(test.kind(), TestKind::ComplexRhythm);
        assert!((test.current_level() - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_analyzer_uses_own_trial_cap() {
        let test = ComplexRhythmTest::with_defaults(StimulusContext::default()).unwrap();
        let analyzer = test.session().analyzer().config();
        assert_eq!(analyzer.max_trials, 70);
        assert_eq!(analyzer.target_reversals, default_config().target_reversals);
    }
}
