//! Configuration loading: YAML files, environment overrides and validation.

use std::io::Write;

use adaptive_staircase::domain::models::staircase::AdaptationMode;
use adaptive_staircase::infrastructure::config::{AppConfig, ConfigError, ConfigLoader};
use adaptive_staircase::infrastructure::logging::LogFormat;
use adaptive_staircase::TestKind;
use tempfile::NamedTempFile;

fn yaml_file(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_partial_file_keeps_other_defaults() {
    let file = yaml_file(
        r"
logging:
  level: debug
  format: json
hearing:
  initial_level: 50.0
  min_level: 0.0
  max_level: 90.0
  initial_step_size: 10.0
  step_sizes: [10.0, 5.0, 2.5]
  target_reversals: 8
  min_trials: 10
  max_trials: 40
  start_direction: down
  rule: two_down_one_up
  adaptation_mode: additive
",
    );

    let config = ConfigLoader::load_from_file(file.path()).unwrap();

    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.logging.format, LogFormat::Json);
    assert!((config.hearing.max_level - 90.0).abs() < f64::EPSILON);
    assert_eq!(config.hearing.step_sizes, vec![10.0, 5.0, 2.5]);
    // omitted field takes its serde default
    assert_eq!(config.hearing.threshold_reversals, None);
    assert_eq!(config.hearing.threshold_window(), 6);

    let defaults = AppConfig::default();
    assert_eq!(config.convergence, defaults.convergence);
    assert_eq!(config.beat_pattern, defaults.beat_pattern);
    assert_eq!(
        config.staircase(TestKind::TempoDirection).adaptation_mode,
        AdaptationMode::Multiplicative
    );
}

#[test]
fn test_invalid_section_is_reported_by_name() {
    let file = yaml_file(
        r"
convergence:
  min_reversals: 12
  target_reversals: 8
",
    );

    let err = ConfigLoader::load_from_file(file.path()).unwrap_err();
    match err.downcast_ref::<ConfigError>() {
        Some(ConfigError::InvalidSection { section, .. }) => assert_eq!(*section, "convergence"),
        other => panic!("unexpected error: {other:?} ({err})"),
    }
}

#[test]
fn test_missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ConfigLoader::load_from_file(dir.path().join("absent.yaml")).unwrap_err();
    assert!(err.to_string().contains("not found"));
}

#[test]
fn test_environment_overrides_nested_values() {
    temp_env::with_vars(
        [
            ("STAIRCASE_CONVERGENCE__MAX_TRIALS", Some("80")),
            ("STAIRCASE_STIMULUS__FIXED_OFFSET_DB", Some("35.5")),
        ],
        || {
            let config = ConfigLoader::load().unwrap();
            assert_eq!(config.convergence.max_trials, 80);
            assert!((config.stimulus.fixed_offset_db - 35.5).abs() < f64::EPSILON);
            // untouched sections keep their defaults
            assert_eq!(config.hearing, AppConfig::default().hearing);
        },
    );
}

#[test]
fn test_environment_log_level_is_validated() {
    temp_env::with_var("STAIRCASE_LOGGING__LEVEL", Some("verbose"), || {
        let err = ConfigLoader::load().unwrap_err();
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::InvalidLogLevel("verbose".to_string()))
        );
    });
}

#[test]
fn test_defaults_validate() {
    assert!(ConfigLoader::validate(&AppConfig::default()).is_ok());
}
