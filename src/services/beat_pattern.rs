//! Beat/meter discrimination test.
//!
//! An isochronous sequence is played with every second or every third beat
//! accented and the subject identifies the meter. The adapted level is the
//! accent's volume difference in dB, stepped multiplicatively.

use serde::{Deserialize, Serialize};

use super::categorized::{CategorizedTest, PerceptualTest, ResponseCategory};
use super::TestKind;
use crate::domain::models::staircase::{AdaptationMode, Direction, StaircaseConfig, StaircaseRule};

/// Multiplicative step factors shared by the rhythm tests.
pub const RHYTHM_STEP_FACTORS: [f64; 6] = [0.7, 0.7, 0.8, 0.8, 0.9, 0.9];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BeatGrouping {
    #[serde(rename = "2beat")]
    TwoBeat,
    #[serde(rename = "3beat")]
    ThreeBeat,
}

impl ResponseCategory for BeatGrouping {
    const ALL: &'static [Self] = &[Self::TwoBeat, Self::ThreeBeat];

    fn label(self) -> &'static str {
        match self {
            Self::TwoBeat => "2beat",
            Self::ThreeBeat => "3beat",
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BeatPattern;

impl PerceptualTest for BeatPattern {
    type Category = BeatGrouping;

    const KIND: TestKind = TestKind::BeatPattern;

    fn default_staircase() -> StaircaseConfig {
        default_config()
    }
}

pub type BeatPatternTest = CategorizedTest<BeatPattern>;

/// Accent difference between 0.5 and 20 dB, starting at 10.
pub fn default_config() -> StaircaseConfig {
    StaircaseConfig {
        initial_level: 10.0,
        min_level: 0.5,
        max_level: 20.0,
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
