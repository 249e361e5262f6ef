//! Run staircases against a deterministic simulated observer.
//!
//! The observer answers correctly whenever the presented level is at or above
//! its true threshold, so a well-tuned staircase should oscillate around that
//! value and report it back.

use anyhow::{bail, Result};
use chrono::{DateTime, Duration, Utc};
use clap::Args;
use serde::Serialize;

use crate::cli::output::{level, list_table, output, summary_table, CommandOutput};
use crate::cli::types::TestArg;
use crate::domain::models::staircase::StaircaseResult;
use crate::domain::models::statistics::SessionComparison;
use crate::infrastructure::config::AppConfig;
use crate::services::{
    BeatPattern, CategorizedOutcome, CategorizedTest, ComplexRhythm, Hearing, PerceptualTest,
    ResponseCategory, TempoDirection, TestKind,
};

/// Gap between simulated sessions so they sort chronologically.
const SESSION_GAP_HOURS: i64 = 24;

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Test to simulate
    #[arg(short, long, value_enum)]
    pub test: TestArg,

    /// Threshold of the simulated observer, in the test's level unit
    #[arg(long)]
    pub true_threshold: f64,

    /// Number of sessions to run and compare
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..=100))]
    pub sessions: u32,

    /// Time between responses in milliseconds
    #[arg(long, default_value_t = 3000)]
    pub interval_ms: u32,
}

/// Answers correctly iff the level is at or above `threshold`.
#[derive(Debug, Clone, Copy)]
pub struct Observer {
    pub threshold: f64,
}

impl Observer {
    pub fn responds_correctly(self, level: f64) -> bool {
        level >= self.threshold
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulatedRun {
    pub session_id: String,
    pub threshold: f64,
    /// Estimated minus true threshold.
    pub error: f64,
    pub confidence: f64,
    pub low_confidence: bool,
    pub trials: u32,
    pub reversals: u32,
    pub overall_accuracy: f64,
    pub duration_secs: f64,
}

#[derive(Debug, Serialize)]
pub struct SimulationOutput {
    pub test: TestKind,
    pub unit: &'static str,
    pub true_threshold: f64,
    pub runs: Vec<SimulatedRun>,
    pub comparison: Option<SessionComparison>,
}

impl CommandOutput for SimulationOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![format!(
            "Simulated {} observer at {} {}",
            self.test,
            level(self.true_threshold),
            self.unit
        )];

        let mut table = list_table(&[
            "session",
            "threshold",
            "error",
            "confidence",
            "trials",
            "reversals",
            "accuracy",
        ]);
        for (i, run) in self.runs.iter().enumerate() {
            table.add_row(vec![
                (i + 1).to_string(),
                level(run.threshold),
                format!("{:+.2}", run.error),
                format!(
                    "{:.3}{}",
                    run.confidence,
                    if run.low_confidence { " (low)" } else { "" }
                ),
                run.trials.to_string(),
                run.reversals.to_string(),
                format!("{:.0}%", run.overall_accuracy * 100.0),
            ]);
        }
        lines.push(table.to_string());

        if let Some(cmp) = &self.comparison {
            lines.push(String::new());
            lines.push(
                summary_table(&[
                    ("Trend", cmp.trend.to_string()),
                    ("Improvement", format!("{:+.1}%", cmp.improvement * 100.0)),
                    ("Consistency", format!("{:.3}", cmp.consistency)),
                    ("Reliability", format!("{:.3}", cmp.reliability)),
                ])
                .to_string(),
            );
        }

        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Drive one adapter to completion against `observer`.
///
/// Presented categories alternate; a wrong answer picks the next category.
pub fn simulate_session<T: PerceptualTest>(
    config: &AppConfig,
    observer: Observer,
    started_at: DateTime<Utc>,
    interval: Duration,
) -> Result<(SimulatedRun, StaircaseResult)> {
    let mut test = CategorizedTest::<T>::starting_at(
        config.staircase(T::KIND).clone(),
        config.convergence_for(T::KIND),
        config.statistics.clone(),
        config.stimulus.clone(),
        started_at,
    )?;

    let categories = T::Category::ALL;
    let mut at = started_at;
    let mut presented = 0usize;
    while !test.is_complete() {
        let actual = categories[presented % categories.len()];
        let chosen = if observer.responds_correctly(test.current_level()) {
            actual
        } else {
            categories[(presented + 1) % categories.len()]
        };
        at += interval;
        test.record_response_at(actual, chosen, None, at)?;
        presented += 1;
    }

    let CategorizedOutcome::Converged(outcome) = test.outcome_at(at)? else {
        bail!("Session ended without a result");
    };

    let result = outcome.result;
    let run = SimulatedRun {
        session_id: test.session().id().to_string(),
        threshold: result.threshold,
        error: result.threshold - observer.threshold,
        confidence: result.confidence,
        low_confidence: result.low_confidence,
        trials: result.total_trials,
        reversals: result.total_reversals,
        overall_accuracy: outcome.overall_accuracy,
        duration_secs: result.duration.as_secs_f64(),
    };
    Ok((run, result))
}

fn simulate_sessions<T: PerceptualTest>(
    config: &AppConfig,
    observer: Observer,
    sessions: u32,
    started_at: DateTime<Utc>,
    interval: Duration,
) -> Result<(Vec<SimulatedRun>, Option<SessionComparison>)> {
    let mut runs = Vec::new();
    let mut results = Vec::new();
    for n in 0..sessions {
        let start = started_at + Duration::hours(SESSION_GAP_HOURS * i64::from(n));
        let (run, result) = simulate_session::<T>(config, observer, start, interval)?;
        runs.push(run);
        results.push(result);
    }

    let comparison = if results.len() >= 2 {
        Some(CategorizedTest::<T>::compare(&results)?)
    } else {
        None
    };
    Ok((runs, comparison))
}

pub fn simulate(
    config: &AppConfig,
    kind: TestKind,
    observer: Observer,
    sessions: u32,
    started_at: DateTime<Utc>,
    interval: Duration,
) -> Result<SimulationOutput> {
    if !observer.threshold.is_finite() {
        bail!("True threshold must be finite");
    }

    let (runs, comparison) = match kind {
        TestKind::Hearing => {
            simulate_sessions::<Hearing>(config, observer, sessions, started_at, interval)?
        }
        TestKind::BeatPattern => {
            simulate_sessions::<BeatPattern>(config, observer, sessions, started_at, interval)?
        }
        TestKind::TempoDirection => {
            simulate_sessions::<TempoDirection>(config, observer, sessions, started_at, interval)?
        }
        TestKind::ComplexRhythm => {
            simulate_sessions::<ComplexRhythm>(config, observer, sessions, started_at, interval)?
        }
    };

    tracing::info!(test = %kind, sessions, "simulation finished");

    Ok(SimulationOutput {
        test: kind,
        unit: kind.level_unit(),
        true_threshold: observer.threshold,
        runs,
        comparison,
    })
}

pub fn execute(args: SimulateArgs, config: &AppConfig, json_mode: bool) -> Result<()> {
    let out = simulate(
        config,
        args.test.into(),
        Observer {
            threshold: args.true_threshold,
        },
        args.sessions,
        Utc::now(),
        Duration::milliseconds(i64::from(args.interval_ms)),
    )?;
    output(&out, json_mode);
    Ok(())
}
