//! The staircase controller.
//!
//! Owns the configuration, the mutable [`StaircaseState`], the trial history
//! and the diagnostics. One `record_trial` call consumes one response:
//!
//! 1. decide the next direction from the rule,
//! 2. detect a reversal against the direction recorded on the previous trial
//!    and advance the step schedule,
//! 3. compute the next level (additive or multiplicative),
//! 4. clamp to `[min_level, max_level]`,
//! 5. append the trial and evaluate the terminal condition.
//!
//! Non-finite intermediates never reach the state. They are replaced by the
//! last known-good value and recorded as [`NumericAnomaly`]s.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::config::{AdaptationMode, Direction, StaircaseConfig, StaircaseRule};
use super::diagnostics::{AnomalyKind, ControllerDiagnostics, NumericAnomaly, DIAGNOSTICS_VERSION};
use super::estimate::{same_pass_estimate, EstimateBasis, StaircaseResult, ThresholdEstimate};
use super::state::StaircaseState;
use super::trial::Trial;
use crate::domain::errors::{StaircaseError, StatisticsError};
use crate::domain::models::statistics::{threshold_from_reversals, StatisticsConfig};

/// What the rule decided for one response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Decision {
    direction: Direction,
    moves: bool,
}

/// Adaptive up/down staircase for a single test run.
///
/// Not designed for shared mutable access; give each subject or session its
/// own controller.
#[derive(Debug, Clone)]
pub struct StaircaseController {
    config: StaircaseConfig,
    state: StaircaseState,
    trials: Vec<Trial>,
    anomalies: Vec<NumericAnomaly>,
    last_move: Option<Direction>,
}

impl StaircaseController {
    /// Validate `config` and start a run now.
    pub fn new(config: StaircaseConfig) -> Result<Self, StaircaseError> {
        Self::starting_at(config, Utc::now())
    }

    /// Validate `config` and start a run at `started_at`.
    pub fn starting_at(
        config: StaircaseConfig,
        started_at: DateTime<Utc>,
    ) -> Result<Self, StaircaseError> {
        config.validate()?;
        let state = StaircaseState::initial(&config, started_at);
        Ok(Self {
            config,
            state,
            trials: Vec::new(),
            anomalies: Vec::new(),
            last_move: None,
        })
    }

    pub fn config(&self) -> &StaircaseConfig {
        &self.config
    }

    /// Level to present on the next trial. Always within the configured bounds.
    pub fn current_level(&self) -> f64 {
        self.state.current_level
    }

    /// Read-only view of the state.
    pub fn state(&self) -> &StaircaseState {
        &self.state
    }

    /// Trial history in trial order.
    pub fn trials(&self) -> &[Trial] {
        &self.trials
    }

    pub fn is_complete(&self) -> bool {
        self.state.is_complete()
    }

    pub fn progress(&self) -> f64 {
        self.state.progress(&self.config)
    }

    pub fn diagnostics(&self) -> ControllerDiagnostics {
        ControllerDiagnostics {
            version: DIAGNOSTICS_VERSION,
            step_index: self.config.step_index_for(self.state.total_reversals),
            consecutive_correct: self.state.consecutive_correct,
            last_move: self.last_move,
            anomalies: self.anomalies.clone(),
        }
    }

    /// Record a response timestamped now.
    pub fn record_trial(
        &mut self,
        correct: bool,
        reaction_time_ms: Option<f64>,
    ) -> Result<Trial, StaircaseError> {
        self.record_trial_at(correct, reaction_time_ms, Utc::now())
    }

    /// Record a response with an explicit timestamp.
    pub fn record_trial_at(
        &mut self,
        correct: bool,
        reaction_time_ms: Option<f64>,
        timestamp: DateTime<Utc>,
    ) -> Result<Trial, StaircaseError> {
        if let Some(completed_at) = self.state.completed_at {
            return Err(StaircaseError::SessionCompleted { completed_at });
        }
        if let Some(rt) = reaction_time_ms {
            if !rt.is_finite() {
                return Err(StaircaseError::NonFiniteReactionTime);
            }
            if rt < 0.0 {
                return Err(StaircaseError::NegativeReactionTime(rt));
            }
        }

        let index = self.state.total_trials;
        let level = self.state.current_level;

        let decision = self.decide(correct);

        let is_reversal = self
            .trials
            .last()
            .is_some_and(|previous| previous.direction != decision.direction);
        if is_reversal {
            self.state.reversal_levels.push(level);
            self.state.total_reversals += 1;
            self.state.current_step_size = self.scheduled_step(index);
        }

        let next_level = if decision.moves {
            let stepped = self.step_level(level, decision.direction, index);
            self.last_move = Some(decision.direction);
            if decision.direction == Direction::Down {
                self.state.consecutive_correct = 0;
            }
            stepped.clamp(self.config.min_level, self.config.max_level)
        } else {
            level
        };

        let trial = Trial {
            index,
            level,
            correct,
            is_reversal,
            step_size: self.state.current_step_size,
            direction: decision.direction,
            next_level,
            reaction_time_ms,
            timestamp,
        };

        self.state.current_level = next_level;
        self.state.current_direction = decision.direction;
        self.state.total_trials += 1;
        self.trials.push(trial.clone());

        debug!(
            trial = index,
            correct,
            level,
            next_level,
            direction = %decision.direction,
            reversal = is_reversal,
            step_size = trial.step_size,
            "trial recorded"
        );

        if self.terminal_condition_met() {
            self.complete(timestamp);
        }

        Ok(trial)
    }

    /// Freeze a running staircase because an external verdict ended the run.
    pub fn finish(&mut self, at: DateTime<Utc>) -> Result<&ThresholdEstimate, StaircaseError> {
        if let Some(completed_at) = self.state.completed_at {
            return Err(StaircaseError::SessionCompleted { completed_at });
        }
        self.complete(at);
        self.state
            .final_estimate
            .as_ref()
            .ok_or(StaircaseError::NotCompleted)
    }

    /// Same-pass threshold estimate from the current reversal window.
    ///
    /// Once the run is complete this is the estimate frozen at completion.
    pub fn threshold_estimate(&self) -> ThresholdEstimate {
        self.state.final_estimate.clone().unwrap_or_else(|| {
            same_pass_estimate(
                &self.state.reversal_levels,
                self.state.current_level,
                self.config.threshold_window() as usize,
            )
        })
    }

    /// Terminal result using the plain mean of the reversal window.
    pub fn result(&self) -> Result<StaircaseResult, StaircaseError> {
        self.result_with(&StatisticsConfig::plain_mean())
    }

    /// Terminal result using the given threshold statistics.
    ///
    /// Too few reversals is not an error: the result falls back to the
    /// same-pass estimate and is flagged low-confidence.
    pub fn result_with(
        &self,
        statistics: &StatisticsConfig,
    ) -> Result<StaircaseResult, StaircaseError> {
        let completed_at = self.state.completed_at.ok_or(StaircaseError::NotCompleted)?;
        let final_levels = self.threshold_window().to_vec();

        let (threshold, confidence, low_confidence, confidence_interval) =
            match threshold_from_reversals(&final_levels, statistics) {
                Ok(stats) => (
                    stats.threshold,
                    stats.confidence,
                    false,
                    Some(stats.confidence_interval),
                ),
                Err(
                    StatisticsError::InsufficientSamples { .. }
                    | StatisticsError::NonFiniteResult { .. },
                ) => {
                    let estimate = self.threshold_estimate();
                    (
                        estimate.threshold,
                        estimate.confidence,
                        estimate.is_low_confidence(),
                        None,
                    )
                }
                Err(other) => return Err(other.into()),
            };

        Ok(StaircaseResult {
            threshold,
            confidence,
            low_confidence,
            confidence_interval,
            total_trials: self.state.total_trials,
            total_reversals: self.state.total_reversals,
            convergence_trials: self.convergence_trials(final_levels.len()),
            final_levels,
            started_at: self.state.started_at,
            completed_at,
            duration: (completed_at - self.state.started_at)
                .to_std()
                .unwrap_or_default(),
        })
    }

    /// Discard all history and start a fresh run from the stored config.
    pub fn reset(&mut self) {
        self.reset_at(Utc::now());
    }

    pub fn reset_at(&mut self, started_at: DateTime<Utc>) {
        self.state = StaircaseState::initial(&self.config, started_at);
        self.trials.clear();
        self.anomalies.clear();
        self.last_move = None;
        debug!("staircase reset");
    }

    fn decide(&mut self, correct: bool) -> Decision {
        if !correct {
            self.state.consecutive_correct = 0;
            return Decision {
                direction: Direction::Up,
                moves: true,
            };
        }

        self.state.consecutive_correct += 1;
        match self.config.rule {
            StaircaseRule::OneDownOneUp => Decision {
                direction: Direction::Down,
                moves: true,
            },
            StaircaseRule::TwoDownOneUp if self.state.consecutive_correct >= 2 => Decision {
                direction: Direction::Down,
                moves: true,
            },
            StaircaseRule::TwoDownOneUp => Decision {
                direction: self.state.current_direction,
                moves: false,
            },
        }
    }

    fn scheduled_step(&mut self, trial_index: u32) -> f64 {
        let step = self.config.step_for_reversals(self.state.total_reversals);
        if step.is_finite() {
            return step;
        }
        let fallback = self.config.initial_step_size;
        self.record_anomaly(Some(trial_index), AnomalyKind::NonFiniteStepSize, fallback);
        fallback
    }

    fn step_level(&mut self, level: f64, direction: Direction, trial_index: u32) -> f64 {
        let step = self.state.current_step_size;
        let next = match (self.config.adaptation_mode, direction) {
            (AdaptationMode::Additive, Direction::Down) => level - step,
            (AdaptationMode::Additive, Direction::Up) => level + step,
            (AdaptationMode::Multiplicative, Direction::Down) => level * step,
            (AdaptationMode::Multiplicative, Direction::Up) => level / step,
        };
        if next.is_finite() {
            next
        } else {
            self.record_anomaly(Some(trial_index), AnomalyKind::NonFiniteLevel, level);
            level
        }
    }

    fn record_anomaly(&mut self, trial_index: Option<u32>, kind: AnomalyKind, fallback: f64) {
        warn!(
            trial = ?trial_index,
            kind = ?kind,
            fallback,
            "non-finite value replaced with last known-good value"
        );
        self.anomalies.push(NumericAnomaly {
            trial_index,
            kind,
            fallback,
        });
    }

    fn terminal_condition_met(&self) -> bool {
        let reversals_done = self.state.total_reversals >= self.config.target_reversals
            && self.state.total_trials >= self.config.min_trials;
        reversals_done || self.state.total_trials >= self.config.max_trials
    }

    fn complete(&mut self, at: DateTime<Utc>) {
        let estimate = same_pass_estimate(
            &self.state.reversal_levels,
            self.state.current_level,
            self.config.threshold_window() as usize,
        );
        if estimate.basis == EstimateBasis::NonFiniteFallback {
            self.record_anomaly(None, AnomalyKind::NonFiniteThreshold, estimate.threshold);
        }

        info!(
            trials = self.state.total_trials,
            reversals = self.state.total_reversals,
            threshold = estimate.threshold,
            confidence = estimate.confidence,
            low_confidence = estimate.is_low_confidence(),
            "staircase completed"
        );

        self.state.completed_at = Some(at);
        self.state.final_estimate = Some(estimate);
    }

    fn threshold_window(&self) -> &[f64] {
        let levels = &self.state.reversal_levels;
        let take = (self.config.threshold_window() as usize).min(levels.len());
        &levels[levels.len() - take..]
    }

    /// 1-based trial number of the first reversal in the threshold window.
    fn convergence_trials(&self, window_len: usize) -> u32 {
        let reversal_trials: Vec<u32> = self
            .trials
            .iter()
            .filter(|t| t.is_reversal)
            .map(|t| t.index + 1)
            .collect();
        if window_len == 0 || reversal_trials.is_empty() {
            return self.state.total_trials;
        }
        reversal_trials[reversal_trials.len() - window_len]
    }
}
