//! Services built on the staircase core: the session driver, the stimulus
//! context and the four per-test adapters.

pub mod beat_pattern;
pub mod categorized;
pub mod complex_rhythm;
pub mod hearing;
pub mod session;
pub mod stimulus;
pub mod tempo_direction;

use serde::{Deserialize, Serialize};

pub use beat_pattern::{BeatGrouping, BeatPattern, BeatPatternTest};
pub use categorized::{
    CategorizedOutcome, CategorizedResult, CategorizedStep, CategorizedTest, CategorizedTrial,
    CategoryAccuracy, PerceptualTest, ResponseCategory,
};
pub use complex_rhythm::{ComplexRhythm, ComplexRhythmTest};
pub use hearing::{Hearing, HearingInterval, HearingThresholdTest};
pub use session::{SessionOutcome, SessionStep, TestSession};
pub use stimulus::StimulusContext;
pub use tempo_direction::{TempoChange, TempoDirection, TempoDirectionTest};

/// The perceptual tests this crate adapts the staircase to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestKind {
    Hearing,
    BeatPattern,
    TempoDirection,
    ComplexRhythm,
}

impl TestKind {
    pub const ALL: [TestKind; 4] = [
        TestKind::Hearing,
        TestKind::BeatPattern,
        TestKind::TempoDirection,
        TestKind::ComplexRhythm,
    ];

    /// Physical unit of the adapted level.
    pub fn level_unit(self) -> &'static str {
        match self {
            TestKind::Hearing => "dB SPL",
            TestKind::BeatPattern => "dB",
            TestKind::TempoDirection | TestKind::ComplexRhythm => "ms/beat",
        }
    }
}

impl std::fmt::Display for TestKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestKind::Hearing => write!(f, "hearing"),
            TestKind::BeatPattern => write!(f, "beat_pattern"),
            TestKind::TempoDirection => write!(f, "tempo_direction"),
            TestKind::ComplexRhythm => write!(f, "complex_rhythm"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_display_matches_serde() {
        for kind in TestKind::ALL {
            let json = serde_json::to_value(kind).unwrap();
            assert_eq!(json, kind.to_string());
        }
    }
}
