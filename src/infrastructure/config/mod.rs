//! Configuration management infrastructure
//!
//! Hierarchical configuration using figment:
//! - YAML file loading
//! - Environment variable overrides
//! - Configuration validation
//! - Type-safe config structs

pub mod app_config;
pub mod loader;

pub use app_config::AppConfig;
pub use loader::{ConfigError, ConfigLoader};
