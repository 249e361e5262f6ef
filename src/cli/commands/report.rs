//! Rendering shared by the commands that run staircases.

use serde::Serialize;

use crate::cli::output::{level, list_table, summary_table};
use crate::domain::models::convergence::ConvergenceAnalysis;
use crate::domain::models::staircase::{StaircaseResult, Trial};
use crate::services::SessionOutcome;

/// One row of a trial log.
#[derive(Debug, Clone, Serialize)]
pub struct TrialRow {
    pub trial: u32,
    pub level: f64,
    pub correct: bool,
    pub reversal: bool,
    pub direction: String,
    pub next_level: f64,
}

impl From<&Trial> for TrialRow {
    fn from(trial: &Trial) -> Self {
        Self {
            trial: trial.index + 1,
            level: trial.level,
            correct: trial.correct,
            reversal: trial.is_reversal,
            direction: trial.direction.to_string(),
            next_level: trial.next_level,
        }
    }
}

pub fn trial_table(rows: &[TrialRow]) -> String {
    let mut table = list_table(&["trial", "level", "response", "reversal", "direction", "next"]);
    for row in rows {
        table.add_row(vec![
            row.trial.to_string(),
            level(row.level),
            if row.correct { "correct" } else { "wrong" }.to_string(),
            if row.reversal { "yes" } else { "" }.to_string(),
            row.direction.clone(),
            level(row.next_level),
        ]);
    }
    table.to_string()
}

pub fn result_summary(result: &StaircaseResult, unit: &str) -> String {
    let mut rows = vec![
        ("Threshold", format!("{} {unit}", level(result.threshold))),
        ("Confidence", format!("{:.3}", result.confidence)),
    ];
    if let Some(ci) = &result.confidence_interval {
        rows.push(("95% CI", format!("[{}, {}]", level(ci.lower), level(ci.upper))));
    }
    rows.push(("Trials", result.total_trials.to_string()));
    rows.push(("Reversals", result.total_reversals.to_string()));
    rows.push(("Converged after", format!("{} trials", result.convergence_trials)));
    rows.push(("Duration", format!("{:.1}s", result.duration.as_secs_f64())));

    let mut out = summary_table(&rows).to_string();
    if result.low_confidence {
        out.push_str("\nWarning: too few reversals, threshold is low confidence");
    }
    out
}

pub fn analysis_summary(analysis: &ConvergenceAnalysis) -> String {
    let rows = [
        ("Status", analysis.reason.to_string()),
        ("Quality", analysis.quality.to_string()),
        ("Confidence", format!("{:.3}", analysis.confidence)),
        ("Stability", format!("{:.3}", analysis.stability)),
        ("Trials", analysis.metrics.total_trials.to_string()),
        ("Reversals", analysis.metrics.total_reversals.to_string()),
        ("Current level", level(analysis.metrics.current_level)),
    ];

    let mut out = summary_table(&rows).to_string();
    for warning in &analysis.warnings {
        out.push_str(&format!("\nWarning: {warning}"));
    }
    out
}

pub fn outcome_summary(outcome: &SessionOutcome, unit: &str) -> String {
    match outcome {
        SessionOutcome::Converged(result) => result_summary(result, unit),
        SessionOutcome::NotConverged(analysis) => {
            format!("Not converged yet\n{}", analysis_summary(analysis))
        }
    }
}
