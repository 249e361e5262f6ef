//! Replay a recorded response sequence through a staircase session.

use anyhow::{bail, Result};
use chrono::{DateTime, Duration, Utc};
use clap::Args;
use serde::Serialize;

use super::report::{outcome_summary, trial_table, TrialRow};
use crate::cli::output::{output, CommandOutput};
use crate::cli::types::TestArg;
use crate::infrastructure::config::AppConfig;
use crate::services::{SessionOutcome, TestKind, TestSession};

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// Test whose staircase settings to use
    #[arg(short, long, value_enum)]
    pub test: TestArg,

    /// Responses in order, `1` correct and `0` wrong (e.g. 0011010111)
    #[arg(short, long)]
    pub responses: String,

    /// Time between responses in milliseconds
    #[arg(long, default_value_t = 3000)]
    pub interval_ms: u32,
}

#[derive(Debug, Serialize)]
pub struct ReplayOutput {
    pub test: TestKind,
    pub unit: &'static str,
    pub session_id: String,
    pub trials: Vec<TrialRow>,
    /// Responses left over after the session finished.
    pub ignored: usize,
    pub outcome: SessionOutcome,
}

impl CommandOutput for ReplayOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![
            format!("Replay: {} ({} responses)", self.test, self.trials.len()),
            trial_table(&self.trials),
            String::new(),
            outcome_summary(&self.outcome, self.unit),
        ];
        if self.ignored > 0 {
            lines.push(format!(
                "\n{} response(s) after completion were ignored",
                self.ignored
            ));
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Parse a `0`/`1` response string. Whitespace, commas and underscores are
/// accepted as separators.
pub fn parse_responses(raw: &str) -> Result<Vec<bool>> {
    let responses = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',' && *c != '_')
        .map(|c| match c {
            '1' => Ok(true),
            '0' => Ok(false),
            other => bail!("Invalid response '{other}': expected 0 or 1"),
        })
        .collect::<Result<Vec<_>>>()?;

    if responses.is_empty() {
        bail!("No responses given");
    }
    Ok(responses)
}

/// Feed `responses` through a fresh session, one every `interval`.
pub fn replay(
    config: &AppConfig,
    kind: TestKind,
    responses: &[bool],
    started_at: DateTime<Utc>,
    interval: Duration,
) -> Result<ReplayOutput> {
    let mut session = TestSession::starting_at(
        config.staircase(kind).clone(),
        config.convergence_for(kind),
        config.statistics.clone(),
        started_at,
    )?;

    let mut trials = Vec::with_capacity(responses.len());
    let mut at = started_at;
    for &correct in responses {
        if session.is_complete() {
            break;
        }
        at += interval;
        let step = session.respond_at(correct, None, at)?;
        trials.push(TrialRow::from(&step.trial));
    }

    let outcome = session.outcome_at(at)?;
    Ok(ReplayOutput {
        test: kind,
        unit: kind.level_unit(),
        session_id: session.id().to_string(),
        ignored: responses.len() - trials.len(),
        trials,
        outcome,
    })
}

pub fn execute(args: ReplayArgs, config: &AppConfig, json_mode: bool) -> Result<()> {
    let responses = parse_responses(&args.responses)?;
    let out = replay(
        config,
        args.test.into(),
        &responses,
        Utc::now(),
        Duration::milliseconds(i64::from(args.interval_ms)),
    )?;
    output(&out, json_mode);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bits(s: &str) -> Vec<bool> {
        parse_responses(s).unwrap()
    }

    #[test]
    fn test_parse_accepts_separators() {
        assert_eq!(bits("01 1,0_1"), vec![false, true, true, false, true]);
    }

    #[test]
    fn test_parse_rejects_other_characters() {
        assert!(parse_responses("01x").is_err());
        assert!(parse_responses("  ").is_err());
    }

    #[test]
    fn test_replay_reports_each_trial() {
        let config = AppConfig::default();
        let out = replay(
            &config,
            TestKind::Hearing,
            &bits("0011"),
            Utc::now(),
            Duration::seconds(3),
        )
        .unwrap();

        assert_eq!(out.trials.len(), 4);
        assert_eq!(out.trials[0].trial, 1);
        assert!((out.trials[0].level - 40.0).abs() < f64::EPSILON);
        assert!((out.trials[0].next_level - 48.0).abs() < f64::EPSILON);
        assert_eq!(out.ignored, 0);
        assert!(!out.outcome.is_converged());
    }

    #[test]
    fn test_replay_stops_when_session_completes() {
        let mut config = AppConfig::default();
        config.hearing.max_trials = 3;
        config.hearing.min_trials = 1;
        let out = replay(
            &config,
            TestKind::Hearing,
            &bits("111111"),
            Utc::now(),
            Duration::seconds(3),
        )
        .unwrap();

        assert_eq!(out.trials.len(), 3);
        assert_eq!(out.ignored, 3);
        assert!(out.outcome.is_converged());
        assert!(out.to_human().contains("ignored"));
    }

    #[test]
    fn test_json_output_tags_outcome() {
        let out = replay(
            &AppConfig::default(),
            TestKind::BeatPattern,
            &bits("1"),
            Utc::now(),
            Duration::seconds(3),
        )
        .unwrap();
        let json = out.to_json();
        assert_eq!(json["test"], "beat_pattern");
        assert_eq!(json["outcome"]["status"], "not_converged");
    }
}
