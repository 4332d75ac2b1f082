//! Policies: how an agent turns an observation into an action

use crate::element::StateElement;
use crate::error::Result;
use crate::seed::SeedSequence;
use crate::space::Value;
use crate::state::State;

/// Produces an action candidate from the agent's latest observation
///
/// The engine validates the returned value against the agent's declared
/// action space before applying it, so a policy that strays outside its
/// space fails the step with `ActionOutOfSpace`.
pub trait Policy: Send {
    /// Sample an action and a policy reward
    fn sample(
        &mut self,
        observation: &State,
        action_state: &mut StateElement,
    ) -> Result<(Value, f64)>;

    /// Receive a seed stream (policies without randomness ignore this)
    fn set_seed(&mut self, _seq: &mut SeedSequence) {}
}

/// Uniform random policy drawing from the action element's own seed stream
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomPolicy;

impl Policy for RandomPolicy {
    fn sample(
        &mut self,
        _observation: &State,
        action_state: &mut StateElement,
    ) -> Result<(Value, f64)> {
        Ok((action_state.sample_value(), 0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::SeedSequence;
    use crate::space::Space;

    #[test]
    fn random_policy_stays_in_space() {
        let space = Space::discrete(vec![-1, 0, 1]).unwrap();
        let mut action = StateElement::new(0i64, space.clone()).unwrap();
        action.attach_rng(SeedSequence::new(1).spawn_rng());
        let mut policy = RandomPolicy;
        for _ in 0..50 {
            let (value, reward) = policy.sample(&State::new(), &mut action).unwrap();
            assert!(space.contains(&value));
            assert_eq!(reward, 0.0);
        }
    }
}
