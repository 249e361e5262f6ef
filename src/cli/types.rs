//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use super::commands::config::ConfigArgs;
use super::commands::replay::ReplayArgs;
use super::commands::simulate::SimulateArgs;
use crate::services::TestKind;

#[derive(Parser, Debug)]
#[command(name = "staircase")]
#[command(about = "Adaptive staircase threshold testing", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Configuration file layered over the defaults
    #[arg(short, long, global = true, env = "STAIRCASE_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a staircase over a recorded sequence of responses
    Replay(ReplayArgs),

    /// Run staircases against a simulated observer with a known threshold
    Simulate(SimulateArgs),

    /// Inspect the effective configuration
    Config(ConfigArgs),
}

/// Test selector accepted on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestArg {
    Hearing,
    BeatPattern,
    TempoDirection,
    ComplexRhythm,
}

impl From<TestArg> for TestKind {
    fn from(arg: TestArg) -> Self {
        match arg {
            TestArg::Hearing => Self::Hearing,
            TestArg::BeatPattern => Self::BeatPattern,
            TestArg::TempoDirection => Self::TempoDirection,
            TestArg::ComplexRhythm => Self::ComplexRhythm,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "staircase",
            "replay",
            "--test",
            "beat-pattern",
            "--responses",
            "0110",
            "--json",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Replay(args) => {
                assert_eq!(TestKind::from(args.test), TestKind::BeatPattern);
                assert_eq!(args.responses, "0110");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
