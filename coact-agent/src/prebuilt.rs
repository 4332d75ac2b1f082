//! Ready-made agents for pointing-style tasks

use tracing::debug;

use coact_core::agent::{Agent, Role};
use coact_core::element::StateElement;
use coact_core::error::{CoactError, Result};
use coact_core::space::Space;
use coact_core::state::State;

use crate::policy::{ConstantPolicy, GoalSeekingPolicy, PseudoRandomPolicy};

/// A user holding a goal in its state and stepping toward it
///
/// The goal resamples uniformly from `goal_support` on every reset; pin it
/// with a reset dictionary when a fixed goal is needed.
pub fn goal_user(goal_support: impl Into<Vec<i64>>) -> Result<Agent> {
    let goal_support = goal_support.into();
    let first = *goal_support.first().ok_or_else(|| {
        CoactError::InvalidValue("goal support must not be empty".into())
    })?;
    let state = State::new()
        .with_element("goal", StateElement::new(first, Space::discrete(goal_support)?)?);
    debug!("assembling goal-seeking user");
    Agent::builder(Role::User)
        .state(state)
        .action(StateElement::new(0i64, Space::discrete(vec![-1, 0, 1])?)?)
        .policy(GoalSeekingPolicy::new(
            "user_state/goal",
            "task_state/position",
        ))
        .build()
}

/// A stateless user choosing from `action_support` by scrambling the value
/// observed at `task_state/position`
pub fn pseudo_random_user(
    p0: i64,
    p1: i64,
    p2: i64,
    action_support: impl Into<Vec<i64>>,
) -> Result<Agent> {
    debug!(p0, p1, p2, "assembling pseudo-random user");
    Agent::builder(Role::User)
        .action(StateElement::new(0i64, Space::discrete(action_support)?)?)
        .policy(PseudoRandomPolicy::new(p0, p1, p2, "task_state/position"))
        .build()
}

/// An assistant that always emits the same gain
pub fn constant_gain_assistant(gain: i64) -> Result<Agent> {
    debug!(gain, "assembling constant-gain assistant");
    Agent::builder(Role::Assistant)
        .action(StateElement::new(gain, Space::discrete(vec![gain])?)?)
        .policy(ConstantPolicy::new(gain))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use coact_core::seed::SeedSequence;
    use coact_core::space::Value;
    use coact_core::state::ResetDict;

    #[test]
    fn goal_user_requires_support() {
        assert!(goal_user(Vec::new()).is_err());
        let agent = goal_user((0..31).collect::<Vec<_>>()).unwrap();
        assert_eq!(agent.role(), Role::User);
        assert!(agent.state().element("goal").is_ok());
    }

    #[test]
    fn goal_resamples_unless_pinned() {
        let mut agent = goal_user((0..31).collect::<Vec<_>>()).unwrap();
        agent.set_seed(&mut SeedSequence::new(4));
        let dic = ResetDict::new().with("goal", 4i64);
        agent.reset(Some(&dic), None).unwrap();
        assert_eq!(agent.state().element("goal").unwrap().value(), &Value::Int(4));
    }

    #[test]
    fn constant_gain_assistant_has_singleton_action() {
        let agent = constant_gain_assistant(1).unwrap();
        assert_eq!(agent.role(), Role::Assistant);
        assert_eq!(agent.action().value(), &Value::Int(1));
    }
}
