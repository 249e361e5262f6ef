use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::config::Direction;

/// One recorded response. Immutable once created; the history is kept in
/// trial order and never reordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trial {
    /// Zero-based position in the history.
    pub index: u32,

    /// Level the stimulus was presented at.
    pub level: f64,

    /// Whether the response was correct.
    pub correct: bool,

    /// Whether this trial flipped the direction recorded on the previous one.
    pub is_reversal: bool,

    /// Step size in effect after any reversal on this trial.
    pub step_size: f64,

    /// Direction recorded after this trial.
    pub direction: Direction,

    /// Level that will be presented next (after clamping).
    pub next_level: f64,

    pub reaction_time_ms: Option<f64>,

    pub timestamp: DateTime<Utc>,
}

impl Trial {
    /// Whether the level changed as a result of this trial.
    pub fn moved(&self) -> bool {
        self.next_level != self.level
    }
}
