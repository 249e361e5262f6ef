//! Infrastructure layer module
//!
//! - Configuration management (figment, YAML and environment overrides)
//! - Logging infrastructure (tracing with optional rolling file output)

pub mod config;
pub mod logging;
