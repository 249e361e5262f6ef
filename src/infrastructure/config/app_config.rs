use serde::{Deserialize, Serialize};

use crate::domain::models::convergence::ConvergenceConfig;
use crate::domain::models::staircase::StaircaseConfig;
use crate::domain::models::statistics::StatisticsConfig;
use crate::infrastructure::logging::LogConfig;
use crate::services::{beat_pattern, complex_rhythm, hearing, tempo_direction};
use crate::services::{StimulusContext, TestKind};

/// Effective configuration for the `staircase` binary
///
/// Each section falls back to its own defaults, so a YAML file only needs to
/// name the values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LogConfig,

    #[serde(default)]
    pub convergence: ConvergenceConfig,

    #[serde(default)]
    pub statistics: StatisticsConfig,

    /// Presentation context for the rhythm tests
    #[serde(default)]
    pub stimulus: StimulusContext,

    #[serde(default = "hearing::default_config")]
    pub hearing: StaircaseConfig,

    #[serde(default = "beat_pattern::default_config")]
    pub beat_pattern: StaircaseConfig,

    #[serde(default = "tempo_direction::default_config")]
    pub tempo_direction: StaircaseConfig,

    #[serde(default = "complex_rhythm::default_config")]
    pub complex_rhythm: StaircaseConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            logging: LogConfig::default(),
            convergence: ConvergenceConfig::default(),
            statistics: StatisticsConfig::default(),
            stimulus: StimulusContext::default(),
            hearing: hearing::default_config(),
            beat_pattern: beat_pattern::default_config(),
            tempo_direction: tempo_direction::default_config(),
            complex_rhythm: complex_rhythm::default_config(),
        }
    }
}

impl AppConfig {
    /// Staircase section for one test
    pub fn staircase(&self, kind: TestKind) -> &StaircaseConfig {
        match kind {
            TestKind::Hearing => &self.hearing,
            TestKind::BeatPattern => &self.beat_pattern,
            TestKind::TempoDirection => &self.tempo_direction,
            TestKind::ComplexRhythm => &self.complex_rhythm,
        }
    }

    /// Analyzer settings for one test, capped by that test's staircase.
    pub fn convergence_for(&self, kind: TestKind) -> ConvergenceConfig {
        self.convergence
            .clone()
            .with_staircase_limits(self.staircase(kind))
    }
}
