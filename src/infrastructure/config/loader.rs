use anyhow::{Context, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use std::path::Path;
use thiserror::Error;

use super::app_config::AppConfig;
use crate::domain::errors::ConfigViolation;
use crate::infrastructure::logging::LOG_LEVELS;
use crate::services::TestKind;

/// Configuration error types
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid {section} configuration: {source}")]
    InvalidSection {
        section: &'static str,
        #[source]
        source: ConfigViolation,
    },
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .staircase/config.yaml (project config)
    /// 3. .staircase/local.yaml (local overrides, optional)
    /// 4. Environment variables (STAIRCASE_* prefix, `__` separates sections)
    pub fn load() -> Result<AppConfig> {
        let config: AppConfig = Self::figment()
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file on top of the defaults
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<AppConfig> {
        let path = path.as_ref();
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }

        let config: AppConfig = Figment::new()
            .merge(Serialized::defaults(AppConfig::default()))
            .merge(Yaml::file(path))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// The merged provider chain used by [`ConfigLoader::load`]
    pub fn figment() -> Figment {
        Figment::new()
            .merge(Serialized::defaults(AppConfig::default()))
            .merge(Yaml::file(".staircase/config.yaml"))
            .merge(Yaml::file(".staircase/local.yaml"))
            .merge(Env::prefixed("STAIRCASE_").split("__"))
    }

    /// Validate configuration after loading
    pub fn validate(config: &AppConfig) -> Result<(), ConfigError> {
        if !LOG_LEVELS.contains(&config.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        section("convergence", config.convergence.validate())?;
        section("statistics", config.statistics.validate())?;
        section("stimulus", config.stimulus.validate())?;

        for kind in TestKind::ALL {
            section(section_name(kind), config.staircase(kind).validate())?;
        }

        Ok(())
    }
}

fn section(name: &'static str, result: Result<(), ConfigViolation>) -> Result<(), ConfigError> {
    result.map_err(|source| ConfigError::InvalidSection {
        section: name,
        source,
    })
}

const fn section_name(kind: TestKind) -> &'static str {
    match kind {
        TestKind::Hearing => "hearing",
        TestKind::BeatPattern => "beat_pattern",
        TestKind::TempoDirection => "tempo_direction",
        TestKind::ComplexRhythm => "complex_rhythm",
    }
}
