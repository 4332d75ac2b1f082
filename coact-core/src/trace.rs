//! Replayable execution traces

use serde::{Deserialize, Serialize};

use crate::reward::RewardBreakdown;
use crate::space::Value;

/// What happened during one round of the four-phase cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundRecord {
    /// Round counter at the time the record was opened
    pub round_index: u64,
    /// Action the user took in phase 0, if that phase ran
    pub user_action: Option<Value>,
    /// Action the assistant took in phase 2, if that phase ran
    pub assistant_action: Option<Value>,
    /// Accumulated reward breakdown of the round
    pub rewards: RewardBreakdown,
    /// Whether a task transition terminated the bundle this round
    pub done: bool,
}

impl RoundRecord {
    pub(crate) fn open(round_index: u64) -> Self {
        Self {
            round_index,
            user_action: None,
            assistant_action: None,
            rewards: RewardBreakdown::default(),
            done: false,
        }
    }
}

/// Ordered record of every round since the last reset
///
/// Replaying the recorded actions against a bundle reset with the same seed
/// reproduces the trajectory bit for bit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trace {
    /// Unique trace id
    pub id: String,
    /// Seed the bundle was reset with, if any
    pub seed: Option<u64>,
    /// When the trace started
    pub started_at: chrono::DateTime<chrono::Utc>,
    /// One record per (possibly partial) round, in order
    pub records: Vec<RoundRecord>,
}

impl Trace {
    /// Open a fresh trace
    #[must_use]
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            seed,
            started_at: chrono::Utc::now(),
            records: Vec::new(),
        }
    }

    /// Number of recorded rounds
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no rounds have completed yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sum of all recorded reward components
    #[must_use]
    pub fn total_reward(&self) -> f64 {
        self.records.iter().map(|r| r.rewards.total()).sum()
    }

    /// The recorded `(user, assistant)` action pairs, for replay
    pub fn actions(&self) -> impl Iterator<Item = (Option<&Value>, Option<&Value>)> {
        self.records
            .iter()
            .map(|r| (r.user_action.as_ref(), r.assistant_action.as_ref()))
    }

    pub(crate) fn push(&mut self, record: RoundRecord) {
        self.records.push(record);
    }
}
