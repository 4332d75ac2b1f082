//! Single-agent training facade over a bundle
//!
//! Wraps a two-agent bundle so that one side is driven externally (the
//! trained agent) while the other side keeps playing its own policy. The
//! facade speaks flat numeric arrays and scalar rewards, the dialect RL
//! training loops expect.

use indexmap::IndexMap;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use tracing::warn;

use coact_core::agent::Role;
use coact_core::bundle::Bundle;
use coact_core::error::Result;
use coact_core::reward::RewardBreakdown;
use coact_core::space::{Space, Value};
use coact_core::state::{FilterSpec, ResetDict};
use coact_core::task::InteractionTask;

/// Flat description of a space for external training stacks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AdapterSpace {
    /// `n` categorical choices, indexed `0..n`
    Finite {
        /// Number of choices
        n: usize,
    },
    /// Elementwise bounded box
    Box {
        /// Lower bounds
        low: Vec<f64>,
        /// Upper bounds
        high: Vec<f64>,
    },
}

/// Flatten a typed space into its adapter description
#[must_use]
pub fn convert_space(space: &Space) -> AdapterSpace {
    match space {
        Space::Discrete(set) => AdapterSpace::Finite { n: set.len() },
        Space::Continuous(num) => AdapterSpace::Box {
            low: num.low().to_vec(),
            high: num.high().to_vec(),
        },
    }
}

/// How the two task rewards are split between the agents
///
/// Each row is `(share to user, share to assistant)`. The default splits
/// both task rewards evenly; rows that do not sum to one are accepted but
/// logged, since they silently scale the returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardWeights {
    /// Split of the reward from applying the user action
    pub first_task: [f64; 2],
    /// Split of the reward from applying the assistant action
    pub second_task: [f64; 2],
}

impl Default for RewardWeights {
    fn default() -> Self {
        Self {
            first_task: [0.5, 0.5],
            second_task: [0.5, 0.5],
        }
    }
}

impl RewardWeights {
    fn check(&self) {
        for (name, row) in [("first_task", self.first_task), ("second_task", self.second_task)] {
            let sum: f64 = row.iter().sum();
            if (sum - 1.0).abs() > 1e-9 {
                warn!(row = name, sum, "task reward split does not sum to one");
            }
        }
    }

    /// Scalar return for one side: its own engine rewards plus its share of
    /// the task rewards
    #[must_use]
    pub fn scalar_for(&self, role: Role, rewards: &RewardBreakdown) -> f64 {
        let idx = match role {
            Role::User => 0,
            Role::Assistant => 1,
        };
        let own = match role {
            Role::User => {
                rewards.user_observation_reward
                    + rewards.user_inference_reward
                    + rewards.user_policy_reward
            }
            Role::Assistant => {
                rewards.assistant_observation_reward
                    + rewards.assistant_inference_reward
                    + rewards.assistant_policy_reward
            }
        };
        own + self.first_task[idx] * rewards.first_task_reward
            + self.second_task[idx] * rewards.second_task_reward
    }
}

/// One externally-driven side of a bundle, flattened for training
pub struct SingleAgentEnv<T: InteractionTask> {
    bundle: Bundle<T>,
    trained: Role,
    observed: FilterSpec,
    weights: RewardWeights,
    reset_dic: Option<ResetDict>,
}

impl<T: InteractionTask> SingleAgentEnv<T> {
    /// Train `trained` inside `bundle`, observing the keys `observed` selects
    pub fn new(bundle: Bundle<T>, trained: Role, observed: FilterSpec) -> Self {
        let weights = RewardWeights::default();
        weights.check();
        Self {
            bundle,
            trained,
            observed,
            weights,
            reset_dic: None,
        }
    }

    /// Replace the default even task-reward split
    #[must_use]
    pub fn with_weights(mut self, weights: RewardWeights) -> Self {
        weights.check();
        self.weights = weights;
        self
    }

    /// Pin parts of the bundle state on every reset
    #[must_use]
    pub fn with_reset_dic(mut self, dic: ResetDict) -> Self {
        self.reset_dic = Some(dic);
        self
    }

    /// The wrapped bundle
    #[must_use]
    pub fn bundle(&self) -> &Bundle<T> {
        &self.bundle
    }

    /// Phase at which the trained side acts
    #[must_use]
    pub fn home_phase(&self) -> u8 {
        match self.trained {
            Role::User => 0,
            Role::Assistant => 2,
        }
    }

    /// Flat observation spaces, keyed by `/`-joined state paths
    #[must_use]
    pub fn observation_spaces(&self) -> IndexMap<String, AdapterSpace> {
        self.bundle
            .game_state()
            .filter_spaces(&self.observed)
            .iter()
            .map(|(k, s)| (k.clone(), convert_space(s)))
            .collect()
    }

    /// Flat action space of the trained side
    #[must_use]
    pub fn action_space(&self) -> AdapterSpace {
        let agent = match self.trained {
            Role::User => self.bundle.user(),
            Role::Assistant => self.bundle.assistant(),
        };
        convert_space(agent.action().space())
    }

    /// Reset the bundle and self-drive it to the trained side's phase
    pub fn reset(
        &mut self,
        seed: Option<u64>,
    ) -> Result<(IndexMap<String, Array1<f64>>, serde_json::Map<String, serde_json::Value>)> {
        let home = self.home_phase();
        let state = self
            .bundle
            .reset(self.reset_dic.as_ref(), Some(home), seed)?;
        let mut info = serde_json::Map::new();
        info.insert(
            "turn_index".into(),
            serde_json::json!(self.bundle.turn_index()),
        );
        info.insert(
            "round_index".into(),
            serde_json::json!(self.bundle.round_index()),
        );
        Ok((state.filter_arrays(&self.observed), info))
    }

    /// Apply the trained side's action, then let the other side play until
    /// the trained side is up again (or the episode ends)
    pub fn step(
        &mut self,
        action: Value,
    ) -> Result<(IndexMap<String, Array1<f64>>, f64, bool)> {
        let home = self.home_phase();
        let (_, rewards, mut done) = match self.trained {
            Role::User => self.bundle.step(Some(action), None)?,
            Role::Assistant => self.bundle.step(None, Some(action))?,
        };
        let mut total = self.weights.scalar_for(self.trained, &rewards);

        while !done && self.bundle.turn_index() != home {
            let (_, rewards, d) = self.bundle.quarter_step()?;
            total += self.weights.scalar_for(self.trained, &rewards);
            done = d;
        }
        let obs = self.bundle.game_state().filter_arrays(&self.observed);
        Ok((obs, total, done))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use coact_core::space::CatSet;

    #[test]
    fn spaces_flatten() {
        let discrete = Space::Discrete(CatSet::new(vec![-1, 0, 1]).unwrap());
        assert_eq!(convert_space(&discrete), AdapterSpace::Finite { n: 3 });

        let boxed = Space::continuous(vec![0.0, 0.0], vec![1.0, 2.0]).unwrap();
        assert_eq!(
            convert_space(&boxed),
            AdapterSpace::Box {
                low: vec![0.0, 0.0],
                high: vec![1.0, 2.0],
            }
        );
    }

    #[test]
    fn scalar_combines_own_and_split_task_rewards() {
        let weights = RewardWeights::default();
        let rewards = RewardBreakdown {
            user_policy_reward: 1.0,
            first_task_reward: -1.0,
            second_task_reward: -0.5,
            assistant_observation_reward: 2.0,
            ..Default::default()
        };
        let user = weights.scalar_for(Role::User, &rewards);
        assert_abs_diff_eq!(user, 1.0 - 0.5 - 0.25);
        let assistant = weights.scalar_for(Role::Assistant, &rewards);
        assert_abs_diff_eq!(assistant, 2.0 - 0.5 - 0.25);
    }
}
