//! Configuration inspection commands.

use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;

use crate::cli::output::{level, list_table, output, CommandOutput};
use crate::infrastructure::config::{AppConfig, ConfigLoader};
use crate::services::TestKind;

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,
    /// Validate the effective configuration
    Validate,
    /// Summarise the staircase settings of every test
    Tests,
}

#[derive(Debug, Serialize)]
pub struct ConfigShowOutput {
    pub config: AppConfig,
}

impl CommandOutput for ConfigShowOutput {
    fn to_human(&self) -> String {
        serde_yaml::to_string(&self.config)
            .unwrap_or_else(|e| format!("Failed to render configuration: {e}"))
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.config).unwrap_or_default()
    }
}

#[derive(Debug, Serialize)]
pub struct ConfigValidateOutput {
    pub valid: bool,
    pub message: String,
}

impl CommandOutput for ConfigValidateOutput {
    fn to_human(&self) -> String {
        self.message.clone()
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[derive(Debug, Serialize)]
pub struct TestSettings {
    pub test: TestKind,
    pub unit: &'static str,
    pub mode: String,
    pub initial_level: f64,
    pub min_level: f64,
    pub max_level: f64,
    pub steps: Vec<f64>,
    pub target_reversals: u32,
    pub max_trials: u32,
}

#[derive(Debug, Serialize)]
pub struct ConfigTestsOutput {
    pub tests: Vec<TestSettings>,
}

impl ConfigTestsOutput {
    pub fn from_config(config: &AppConfig) -> Self {
        let tests = TestKind::ALL
            .into_iter()
            .map(|kind| {
                let staircase = config.staircase(kind);
                TestSettings {
                    test: kind,
                    unit: kind.level_unit(),
                    mode: staircase.adaptation_mode.to_string(),
                    initial_level: staircase.initial_level,
                    min_level: staircase.min_level,
                    max_level: staircase.max_level,
                    steps: staircase.step_sizes.clone(),
                    target_reversals: staircase.target_reversals,
                    max_trials: staircase.max_trials,
                }
            })
            .collect();
        Self { tests }
    }
}

impl CommandOutput for ConfigTestsOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["test", "unit", "mode", "start", "range", "steps", "reversals", "max trials"]);
        for t in &self.tests {
            let steps: Vec<String> = t.steps.iter().map(|s| format!("{s}")).collect();
            table.add_row(vec![
                t.test.to_string(),
                t.unit.to_string(),
                t.mode.clone(),
                level(t.initial_level),
                format!("{}..{}", level(t.min_level), level(t.max_level)),
                steps.join(" "),
                t.target_reversals.to_string(),
                t.max_trials.to_string(),
            ]);
        }
        table.to_string()
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub fn execute(args: ConfigArgs, config: &AppConfig, json_mode: bool) -> Result<()> {
    match args.command {
        ConfigCommands::Show => {
            let out = ConfigShowOutput {
                config: config.clone(),
            };
            output(&out, json_mode);
        }

        ConfigCommands::Validate => {
            ConfigLoader::validate(config)?;
            let out = ConfigValidateOutput {
                valid: true,
                message: "Configuration is valid".to_string(),
            };
            output(&out, json_mode);
        }

        ConfigCommands::Tests => {
            output(&ConfigTestsOutput::from_config(config), json_mode);
        }
    }

    Ok(())
}
