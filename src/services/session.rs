//! Test session driver.
//!
//! Pairs one staircase controller with a convergence analyzer. Each response
//! is recorded by the controller and then analysed; if the analyzer decides
//! the run is over before the controller's own terminal rule fires, the
//! session finishes the controller at that moment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::domain::errors::StaircaseError;
use crate::domain::models::convergence::{ConvergenceAnalysis, ConvergenceAnalyzer, ConvergenceConfig};
use crate::domain::models::staircase::{StaircaseConfig, StaircaseController, StaircaseResult, Trial};
use crate::domain::models::statistics::StatisticsConfig;

/// One recorded response and the analysis that followed it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStep {
    pub trial: Trial,
    pub analysis: ConvergenceAnalysis,
}

/// Where a session stands. Not converging yet is a normal state, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum SessionOutcome {
    Converged(StaircaseResult),
    NotConverged(ConvergenceAnalysis),
}

impl SessionOutcome {
    pub fn is_converged(&self) -> bool {
        matches!(self, Self::Converged(_))
    }

    pub fn result(&self) -> Option<&StaircaseResult> {
        match self {
            Self::Converged(result) => Some(result),
            Self::NotConverged(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TestSession {
    id: Uuid,
    controller: StaircaseController,
    analyzer: ConvergenceAnalyzer,
    statistics: StatisticsConfig,
}

impl TestSession {
    /// Validate every config and start a session now.
    pub fn new(
        staircase: StaircaseConfig,
        convergence: ConvergenceConfig,
        statistics: StatisticsConfig,
    ) -> Result<Self, StaircaseError> {
        Self::starting_at(staircase, convergence, statistics, Utc::now())
    }

    pub fn starting_at(
        staircase: StaircaseConfig,
        convergence: ConvergenceConfig,
        statistics: StatisticsConfig,
        started_at: DateTime<Utc>,
    ) -> Result<Self, StaircaseError> {
        statistics.validate()?;
        let analyzer = ConvergenceAnalyzer::new(convergence)?;
        let controller = StaircaseController::starting_at(staircase, started_at)?;
        let id = Uuid::new_v4();
        info!(session_id = %id, "test session started");
        Ok(Self {
            id,
            controller,
            analyzer,
            statistics,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn controller(&self) -> &StaircaseController {
        &self.controller
    }

    pub fn analyzer(&self) -> &ConvergenceAnalyzer {
        &self.analyzer
    }

    pub fn current_level(&self) -> f64 {
        self.controller.current_level()
    }

    pub fn is_complete(&self) -> bool {
        self.controller.is_complete()
    }

    pub fn respond(
        &mut self,
        correct: bool,
        reaction_time_ms: Option<f64>,
    ) -> Result<SessionStep, StaircaseError> {
        self.respond_at(correct, reaction_time_ms, Utc::now())
    }

    /// Record a response at `at` and analyse the resulting history.
    pub fn respond_at(
        &mut self,
        correct: bool,
        reaction_time_ms: Option<f64>,
        at: DateTime<Utc>,
    ) -> Result<SessionStep, StaircaseError> {
        let trial = self.controller.record_trial_at(correct, reaction_time_ms, at)?;
        let analysis = self.analysis_at(at);
        self.finish_if_converged(&analysis, at)?;
        Ok(SessionStep { trial, analysis })
    }

    /// Analysis of the current history as of `now`.
    pub fn analysis_at(&self, now: DateTime<Utc>) -> ConvergenceAnalysis {
        self.analyzer.analyze_since(
            self.controller.trials(),
            self.controller.state().started_at,
            now,
            self.controller.current_level(),
        )
    }

    pub fn outcome(&mut self) -> Result<SessionOutcome, StaircaseError> {
        self.outcome_at(Utc::now())
    }

    /// Where the session stands at `now`.
    ///
    /// Timeouts are evaluated here, so a session nobody responded to for
    /// too long converges on the next call.
    pub fn outcome_at(&mut self, now: DateTime<Utc>) -> Result<SessionOutcome, StaircaseError> {
        if !self.controller.is_complete() {
            let analysis = self.analysis_at(now);
            if !analysis.has_converged {
                return Ok(SessionOutcome::NotConverged(analysis));
            }
            self.finish_if_converged(&analysis, now)?;
        }
        let result = self.controller.result_with(&self.statistics)?;
        Ok(SessionOutcome::Converged(result))
    }

    /// Start over with the same configuration and a new session id.
    pub fn reset(&mut self) {
        self.controller.reset();
        self.id = Uuid::new_v4();
        info!(session_id = %self.id, "test session reset");
    }

    fn finish_if_converged(
        &mut self,
        analysis: &ConvergenceAnalysis,
        at: DateTime<Utc>,
    ) -> Result<(), StaircaseError> {
        if analysis.has_converged && !self.controller.is_complete() {
            info!(
                session_id = %self.id,
                reason = %analysis.reason,
                quality = %analysis.quality,
                "analyzer ended the run"
            );
            self.controller.finish(at)?;
        }
        Ok(())
    }
}
