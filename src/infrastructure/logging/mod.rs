//! Logging infrastructure
//!
//! Structured logging using tracing and tracing-subscriber:
//! - JSON or pretty console output on stderr
//! - Optional rolling JSON log files via tracing-appender
//! - `RUST_LOG` overrides through `EnvFilter`
//!
//! Library code only emits events; installing the subscriber is left to the
//! binary.

pub mod config;
pub mod logger;

pub use config::{LogConfig, LogFormat, RotationPolicy, LOG_LEVELS};
pub use logger::LoggerImpl;
