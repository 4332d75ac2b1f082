//! Per-phase reward bookkeeping

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// The fixed eight-component reward breakdown of one round
///
/// The core never recombines these into a scalar; callers weight and sum
/// the components however they see fit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RewardBreakdown {
    /// Reward issued by the user's observation engine
    pub user_observation_reward: f64,
    /// Reward issued by the user's inference engine
    pub user_inference_reward: f64,
    /// Reward issued by the user's policy
    pub user_policy_reward: f64,
    /// Task reward for applying the user action
    pub first_task_reward: f64,
    /// Reward issued by the assistant's observation engine
    pub assistant_observation_reward: f64,
    /// Reward issued by the assistant's inference engine
    pub assistant_inference_reward: f64,
    /// Reward issued by the assistant's policy
    pub assistant_policy_reward: f64,
    /// Task reward for applying the assistant action
    pub second_task_reward: f64,
}

impl RewardBreakdown {
    /// Unweighted sum of all eight components
    #[must_use]
    pub fn total(&self) -> f64 {
        self.user_observation_reward
            + self.user_inference_reward
            + self.user_policy_reward
            + self.first_task_reward
            + self.assistant_observation_reward
            + self.assistant_inference_reward
            + self.assistant_policy_reward
            + self.second_task_reward
    }

    /// Fixed-key view for external consumers
    #[must_use]
    pub fn as_map(&self) -> IndexMap<&'static str, f64> {
        IndexMap::from([
            ("user_observation_reward", self.user_observation_reward),
            ("user_inference_reward", self.user_inference_reward),
            ("user_policy_reward", self.user_policy_reward),
            ("first_task_reward", self.first_task_reward),
            (
                "assistant_observation_reward",
                self.assistant_observation_reward,
            ),
            (
                "assistant_inference_reward",
                self.assistant_inference_reward,
            ),
            ("assistant_policy_reward", self.assistant_policy_reward),
            ("second_task_reward", self.second_task_reward),
        ])
    }
}

impl std::ops::Add for RewardBreakdown {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        Self {
            user_observation_reward: self.user_observation_reward + other.user_observation_reward,
            user_inference_reward: self.user_inference_reward + other.user_inference_reward,
            user_policy_reward: self.user_policy_reward + other.user_policy_reward,
            first_task_reward: self.first_task_reward + other.first_task_reward,
            assistant_observation_reward: self.assistant_observation_reward
                + other.assistant_observation_reward,
            assistant_inference_reward: self.assistant_inference_reward
                + other.assistant_inference_reward,
            assistant_policy_reward: self.assistant_policy_reward + other.assistant_policy_reward,
            second_task_reward: self.second_task_reward + other.second_task_reward,
        }
    }
}

impl std::ops::AddAssign for RewardBreakdown {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn total_matches_map_sum() {
        let rewards = RewardBreakdown {
            user_policy_reward: 1.0,
            first_task_reward: -0.5,
            second_task_reward: -0.5,
            ..Default::default()
        };
        let map_sum: f64 = rewards.as_map().values().sum();
        assert_abs_diff_eq!(rewards.total(), map_sum);
        assert_eq!(rewards.as_map().len(), 8);
    }

    #[test]
    fn addition_is_componentwise() {
        let a = RewardBreakdown {
            user_policy_reward: 1.0,
            second_task_reward: -0.5,
            ..Default::default()
        };
        let b = RewardBreakdown {
            user_policy_reward: 0.5,
            first_task_reward: -1.0,
            ..Default::default()
        };
        let sum = a + b;
        assert_abs_diff_eq!(sum.user_policy_reward, 1.5);
        assert_abs_diff_eq!(sum.first_task_reward, -1.0);
        assert_abs_diff_eq!(sum.second_task_reward, -0.5);
    }
}
