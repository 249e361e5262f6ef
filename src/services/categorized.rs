//! Generic two-alternative test built on a [`TestSession`].
//!
//! Each perceptual test presents one of two stimulus categories and asks the
//! subject which one they heard. A [`PerceptualTest`] supplies the category
//! type, the default staircase and how the presentation level is derived; the
//! [`CategorizedTest`] wires responses through the session and keeps the
//! per-category bookkeeping.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::session::{SessionOutcome, TestSession};
use super::stimulus::StimulusContext;
use super::TestKind;
use crate::domain::errors::{StaircaseError, StatisticsError};
use crate::domain::models::convergence::{ConvergenceAnalysis, ConvergenceConfig, Polarity};
use crate::domain::models::staircase::{StaircaseConfig, StaircaseResult, Trial};
use crate::domain::models::statistics::{compare_sessions, SessionComparison, StatisticsConfig};

/// A stimulus category the subject has to identify.
pub trait ResponseCategory: Copy + Eq + fmt::Debug + Serialize + 'static {
    /// Every category, in reporting order.
    const ALL: &'static [Self];

    /// Stable label used in reports and on the command line.
    fn label(self) -> &'static str;
}

/// Domain knowledge one perceptual test adds on top of the generic staircase.
pub trait PerceptualTest {
    type Category: ResponseCategory;

    const KIND: TestKind;

    /// Which way the threshold moves when perception improves.
    const POLARITY: Polarity = Polarity::LowerIsBetter;

    /// Staircase tuned to this test's stimulus dimension.
    fn default_staircase() -> StaircaseConfig;

    /// Presentation level in dB SPL for a trial at staircase `level`.
    ///
    /// Rhythm tests play at a fixed distance above the subject's hearing
    /// threshold whatever the staircase level is.
    fn presentation_db(stimulus: &StimulusContext, _level: f64) -> f64 {
        stimulus.sound_level_db()
    }
}

/// A generic trial decorated with the categories involved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorizedTrial<C> {
    #[serde(flatten)]
    pub trial: Trial,
    pub actual: C,
    pub chosen: C,
    pub sound_level_db: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorizedStep<C> {
    pub trial: CategorizedTrial<C>,
    pub analysis: ConvergenceAnalysis,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryAccuracy {
    pub category: String,
    pub trials: usize,
    pub correct: usize,
    /// Fraction correct, `0` when the category was never presented.
    pub accuracy: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorizedResult<C> {
    pub test: TestKind,
    #[serde(flatten)]
    pub result: StaircaseResult,
    pub overall_accuracy: f64,
    pub categories: Vec<CategoryAccuracy>,
    pub trials: Vec<CategorizedTrial<C>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum CategorizedOutcome<C> {
    Converged(CategorizedResult<C>),
    NotConverged(ConvergenceAnalysis),
}

impl<C> CategorizedOutcome<C> {
    pub fn is_converged(&self) -> bool {
        matches!(self, Self::Converged(_))
    }
}

/// Adapter driving one perceptual test.
#[derive(Debug, Clone)]
pub struct CategorizedTest<T: PerceptualTest> {
    session: TestSession,
    stimulus: StimulusContext,
    trials: Vec<CategorizedTrial<T::Category>>,
}

impl<T: PerceptualTest> CategorizedTest<T> {
    pub fn new(
        staircase: StaircaseConfig,
        convergence: ConvergenceConfig,
        statistics: StatisticsConfig,
        stimulus: StimulusContext,
    ) -> Result<Self, StaircaseError> {
        Self::starting_at(staircase, convergence, statistics, stimulus, Utc::now())
    }

    /// Start with the test's default staircase and the stock statistics
    /// settings. The analyzer takes its trial and reversal caps from the
    /// staircase.
    pub fn with_defaults(stimulus: StimulusContext) -> Result<Self, StaircaseError> {
        let staircase = T::default_staircase();
        let convergence = ConvergenceConfig::default().with_staircase_limits(&staircase);
        Self::new(staircase, convergence, StatisticsConfig::default(), stimulus)
    }

    pub fn starting_at(
        staircase: StaircaseConfig,
        convergence: ConvergenceConfig,
        statistics: StatisticsConfig,
        stimulus: StimulusContext,
        started_at: DateTime<Utc>,
    ) -> Result<Self, StaircaseError> {
        stimulus.validate()?;
        let session = TestSession::starting_at(staircase, convergence, statistics, started_at)?;
        tracing::debug!(test = %T::KIND, session_id = %session.id(), "adapter ready");
        Ok(Self {
            session,
            stimulus,
            trials: Vec::new(),
        })
    }

    pub fn kind(&self) -> TestKind {
        T::KIND
    }

    pub fn session(&self) -> &TestSession {
        &self.session
    }

    pub fn stimulus(&self) -> &StimulusContext {
        &self.stimulus
    }

    /// Staircase level for the next stimulus.
    pub fn current_level(&self) -> f64 {
        self.session.current_level()
    }

    pub fn trials(&self) -> &[CategorizedTrial<T::Category>] {
        &self.trials
    }

    pub fn is_complete(&self) -> bool {
        self.session.is_complete()
    }

    pub fn record_response(
        &mut self,
        actual: T::Category,
        chosen: T::Category,
        reaction_time_ms: Option<f64>,
    ) -> Result<CategorizedStep<T::Category>, StaircaseError> {
        self.record_response_at(actual, chosen, reaction_time_ms, Utc::now())
    }

    /// Score the answer against the presented category and record it.
    pub fn record_response_at(
        &mut self,
        actual: T::Category,
        chosen: T::Category,
        reaction_time_ms: Option<f64>,
        at: DateTime<Utc>,
    ) -> Result<CategorizedStep<T::Category>, StaircaseError> {
        let step = self
            .session
            .respond_at(actual == chosen, reaction_time_ms, at)?;
        let trial = CategorizedTrial {
            sound_level_db: T::presentation_db(&self.stimulus, step.trial.level),
            trial: step.trial,
            actual,
            chosen,
        };
        self.trials.push(trial.clone());
        Ok(CategorizedStep {
            trial,
            analysis: step.analysis,
        })
    }

    /// Per-category accuracy in [`ResponseCategory::ALL`] order.
    pub fn category_accuracy(&self) -> Vec<CategoryAccuracy> {
        T::Category::ALL
            .iter()
            .map(|&category| {
                let presented: Vec<&CategorizedTrial<T::Category>> =
                    self.trials.iter().filter(|t| t.actual == category).collect();
                let correct = presented.iter().filter(|t| t.trial.correct).count();
                CategoryAccuracy {
                    category: category.label().to_string(),
                    trials: presented.len(),
                    correct,
                    accuracy: ratio(correct, presented.len()),
                }
            })
            .collect()
    }

    pub fn overall_accuracy(&self) -> f64 {
        let correct = self.trials.iter().filter(|t| t.trial.correct).count();
        ratio(correct, self.trials.len())
    }

    pub fn outcome(&mut self) -> Result<CategorizedOutcome<T::Category>, StaircaseError> {
        self.outcome_at(Utc::now())
    }

    pub fn outcome_at(
        &mut self,
        now: DateTime<Utc>,
    ) -> Result<CategorizedOutcome<T::Category>, StaircaseError> {
        Ok(match self.session.outcome_at(now)? {
            SessionOutcome::Converged(result) => {
                CategorizedOutcome::Converged(self.categorized(result))
            }
            SessionOutcome::NotConverged(analysis) => CategorizedOutcome::NotConverged(analysis),
        })
    }

    pub fn reset(&mut self) {
        self.session.reset();
        self.trials.clear();
    }

    /// Compare completed runs of this test in chronological order.
    pub fn compare(results: &[StaircaseResult]) -> Result<SessionComparison, StatisticsError> {
        compare_sessions(results, T::POLARITY)
    }

    fn categorized(&self, result: StaircaseResult) -> CategorizedResult<T::Category> {
        CategorizedResult {
            test: T::KIND,
            result,
            overall_accuracy: self.overall_accuracy(),
            categories: self.category_accuracy(),
            trials: self.trials.clone(),
        }
    }
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}
