//! Agent roles: a user or assistant with observation, inference and policy
//!
//! An [`Agent`] is a plain struct rather than an inheritance hierarchy: each
//! of its three capabilities is an independently replaceable engine, and the
//! core supplies identity defaults for all of them.

use crate::element::StateElement;
use crate::error::{CoactError, Result};
use crate::inference::{InferenceEngine, NoInference};
use crate::observation::{FullObservation, ObservationEngine};
use crate::policy::{Policy, RandomPolicy};
use crate::seed::SeedSequence;
use crate::space::Value;
use crate::state::{ResetDict, State};

/// Which side of the interaction an agent plays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// The human-side decision maker, acting in phase 0
    User,
    /// The machine-side decision maker, acting in phase 2
    Assistant,
}

impl Role {
    /// Lowercase role name as used in composed state keys
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// Hook run after an agent's random base reset, for deterministic overrides
pub type ResetHook = Box<dyn FnMut(&mut State) -> Result<()> + Send>;

/// A semi-autonomous decision maker owning its state and action channel
pub struct Agent {
    role: Role,
    state: State,
    action: StateElement,
    last_observation: Option<State>,
    observation_engine: Box<dyn ObservationEngine>,
    inference_engine: Box<dyn InferenceEngine>,
    policy: Box<dyn Policy>,
    on_reset: Option<ResetHook>,
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("role", &self.role)
            .field("state", &self.state)
            .field("action", &self.action)
            .finish_non_exhaustive()
    }
}

impl Agent {
    /// Start building an agent for the given role
    #[must_use]
    pub fn builder(role: Role) -> AgentBuilder {
        AgentBuilder::new(role)
    }

    /// The agent's role
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    /// The agent's internal state
    #[must_use]
    pub fn state(&self) -> &State {
        &self.state
    }

    /// Mutable access to the agent's internal state
    pub fn state_mut(&mut self) -> &mut State {
        &mut self.state
    }

    /// The agent's action element (last action taken)
    #[must_use]
    pub fn action(&self) -> &StateElement {
        &self.action
    }

    /// The agent's most recent observation
    pub fn observation(&self) -> Result<&State> {
        self.last_observation
            .as_ref()
            .ok_or(CoactError::MissingCollaborator(
                "agent has not observed yet; run its observation phase first",
            ))
    }

    /// Run the observation engine against the composed game state
    pub fn observe(&mut self, game_state: &State) -> Result<f64> {
        let (obs, reward) = self.observation_engine.observe(game_state)?;
        self.last_observation = Some(obs);
        Ok(reward)
    }

    /// Run the inference engine against the latest observation
    pub fn infer(&mut self) -> Result<f64> {
        let Agent {
            inference_engine,
            last_observation,
            state,
            ..
        } = self;
        let obs = last_observation
            .as_ref()
            .ok_or(CoactError::MissingCollaborator(
                "agent has not observed yet; run its observation phase first",
            ))?;
        inference_engine.infer(obs, state)
    }

    /// Produce and record this phase's action
    ///
    /// An injected value replaces the policy's sample. Either way the value
    /// is validated against the declared action space before it is applied.
    pub fn take_action(&mut self, injected: Option<&Value>) -> Result<(Value, f64)> {
        let Agent {
            policy,
            last_observation,
            action,
            role,
            ..
        } = self;
        let (candidate, reward) = match injected {
            Some(v) => (v.clone(), 0.0),
            None => {
                let obs = last_observation
                    .as_ref()
                    .ok_or(CoactError::MissingCollaborator(
                        "agent has not observed yet; run its observation phase first",
                    ))?;
                policy.sample(obs, action)?
            }
        };
        let cast = action
            .space()
            .cast(&candidate)
            .map_err(|e| CoactError::ActionOutOfSpace(format!("{} action: {e}", role.as_str())))?;
        if !action.space().contains(&cast) {
            return Err(CoactError::ActionOutOfSpace(format!(
                "{} action {cast:?} outside {:?}",
                role.as_str(),
                action.space()
            )));
        }
        action.set(cast.clone())?;
        Ok((cast, reward))
    }

    /// Reset internal state and action, honoring optional overrides
    pub fn reset(
        &mut self,
        state_dic: Option<&ResetDict>,
        action_dic: Option<&ResetDict>,
    ) -> Result<()> {
        self.state.reset(state_dic)?;
        if let Some(hook) = &mut self.on_reset {
            hook(&mut self.state)?;
        }
        match action_dic.and_then(|d| d.get("action")) {
            Some(crate::state::ResetEntry::Value(v)) => {
                self.action
                    .set(v.clone())
                    .map_err(|e| CoactError::InvalidResetValue {
                        key: "action".into(),
                        reason: e.to_string(),
                    })?;
            }
            Some(crate::state::ResetEntry::Element(el)) => self.action = el.clone(),
            Some(crate::state::ResetEntry::Nested(_)) => {
                return Err(CoactError::InvalidResetValue {
                    key: "action".into(),
                    reason: "nested overrides supplied for the action element".into(),
                });
            }
            None => self.action.reset(),
        }
        self.last_observation = None;
        Ok(())
    }

    /// Seed internal state, action stream and all three engines
    pub fn set_seed(&mut self, seq: &mut SeedSequence) {
        self.state.set_seed(seq);
        self.action.attach_rng(seq.spawn_rng());
        self.observation_engine.set_seed(seq);
        self.inference_engine.set_seed(seq);
        self.policy.set_seed(seq);
    }
}

/// Builder for [`Agent`]
pub struct AgentBuilder {
    role: Role,
    state: State,
    action: Option<StateElement>,
    observation_engine: Box<dyn ObservationEngine>,
    inference_engine: Box<dyn InferenceEngine>,
    policy: Box<dyn Policy>,
    on_reset: Option<ResetHook>,
}

impl AgentBuilder {
    fn new(role: Role) -> Self {
        Self {
            role,
            state: State::new(),
            action: None,
            observation_engine: Box::new(FullObservation),
            inference_engine: Box::new(NoInference),
            policy: Box::new(RandomPolicy),
            on_reset: None,
        }
    }

    /// Internal state owned by the agent
    #[must_use]
    pub fn state(mut self, state: State) -> Self {
        self.state = state;
        self
    }

    /// Declared action element (required)
    #[must_use]
    pub fn action(mut self, action: StateElement) -> Self {
        self.action = Some(action);
        self
    }

    /// Replace the default identity observation engine
    #[must_use]
    pub fn observation_engine(mut self, engine: impl ObservationEngine + 'static) -> Self {
        self.observation_engine = Box::new(engine);
        self
    }

    /// Replace the default identity inference engine
    #[must_use]
    pub fn inference_engine(mut self, engine: impl InferenceEngine + 'static) -> Self {
        self.inference_engine = Box::new(engine);
        self
    }

    /// Replace the default uniform random policy
    #[must_use]
    pub fn policy(mut self, policy: impl Policy + 'static) -> Self {
        self.policy = Box::new(policy);
        self
    }

    /// Hook run after each random base reset
    #[must_use]
    pub fn on_reset(
        mut self,
        hook: impl FnMut(&mut State) -> Result<()> + Send + 'static,
    ) -> Self {
        self.on_reset = Some(Box::new(hook));
        self
    }

    /// Finish the agent; fails if no action state was declared
    pub fn build(self) -> Result<Agent> {
        let action = self
            .action
            .ok_or(CoactError::MissingCollaborator("agent action state"))?;
        Ok(Agent {
            role: self.role,
            state: self.state,
            action,
            last_observation: None,
            observation_engine: self.observation_engine,
            inference_engine: self.inference_engine,
            policy: self.policy,
            on_reset: self.on_reset,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::space::Space;

    fn minimal_agent() -> Agent {
        Agent::builder(Role::User)
            .action(StateElement::new(0i64, Space::discrete(vec![-1, 0, 1]).unwrap()).unwrap())
            .build()
            .unwrap()
    }

    #[test]
    fn builder_requires_action_state() {
        let err = Agent::builder(Role::User).build().unwrap_err();
        assert!(matches!(err, CoactError::MissingCollaborator(_)));
    }

    #[test]
    fn injected_action_is_validated() {
        let mut agent = minimal_agent();
        agent.observe(&State::new()).unwrap();
        let err = agent.take_action(Some(&Value::Int(5))).unwrap_err();
        assert!(matches!(err, CoactError::ActionOutOfSpace(_)));

        let (value, _) = agent.take_action(Some(&Value::Int(1))).unwrap();
        assert_eq!(value, Value::Int(1));
        assert_eq!(agent.action().value(), &Value::Int(1));
    }

    #[test]
    fn policy_needs_an_observation_first() {
        let mut agent = minimal_agent();
        assert!(matches!(
            agent.take_action(None),
            Err(CoactError::MissingCollaborator(_))
        ));
    }

    #[test]
    fn reset_hook_overrides_sampled_state() {
        let state = State::new().with_element(
            "goal",
            StateElement::new(0i64, Space::discrete((0..10).collect::<Vec<_>>()).unwrap()).unwrap(),
        );
        let mut agent = Agent::builder(Role::User)
            .state(state)
            .action(StateElement::new(0i64, Space::discrete(vec![-1, 0, 1]).unwrap()).unwrap())
            .on_reset(|state| state.element_mut("goal")?.set(4i64))
            .build()
            .unwrap();
        let mut seq = SeedSequence::new(0);
        agent.set_seed(&mut seq);
        agent.reset(None, None).unwrap();
        assert_eq!(agent.state().element("goal").unwrap().value(), &Value::Int(4));
    }
}
