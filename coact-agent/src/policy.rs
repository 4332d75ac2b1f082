//! Concrete policies for synthetic users and assistants

use serde::{Deserialize, Serialize};

use coact_core::element::StateElement;
use coact_core::error::{CoactError, Result};
use coact_core::policy::Policy;
use coact_core::space::{Space, Value};
use coact_core::state::{State, StatePath};

/// Moves one step toward a goal read from the observation
///
/// Emits `sign(goal - cursor)` as a discrete action, so the declared action
/// space must contain `{-1, 0, 1}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalSeekingPolicy {
    goal: StatePath,
    cursor: StatePath,
}

impl GoalSeekingPolicy {
    /// Seek `goal` from `cursor`, both paths into the agent's observation
    #[must_use]
    pub fn new(goal: impl Into<StatePath>, cursor: impl Into<StatePath>) -> Self {
        Self {
            goal: goal.into(),
            cursor: cursor.into(),
        }
    }

    fn scalar(observation: &State, path: &StatePath) -> Result<f64> {
        let el = observation.at(path)?;
        el.value().as_scalar().ok_or_else(|| {
            CoactError::InvalidValue(format!("{path} does not hold a scalar value"))
        })
    }
}

impl Policy for GoalSeekingPolicy {
    fn sample(
        &mut self,
        observation: &State,
        _action_state: &mut StateElement,
    ) -> Result<(Value, f64)> {
        let goal = Self::scalar(observation, &self.goal)?;
        let cursor = Self::scalar(observation, &self.cursor)?;
        let step = (goal - cursor).signum() as i64;
        Ok((Value::Int(step), 0.0))
    }
}

/// Deterministic but scrambled choice over the action support
///
/// Picks support index `(p0 + p1*x + p2*x^2) mod n` where `x` is a discrete
/// value read from the observation. Useful as a fully reproducible stand-in
/// for a stochastic user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PseudoRandomPolicy {
    p0: i64,
    p1: i64,
    p2: i64,
    observed: StatePath,
}

impl PseudoRandomPolicy {
    /// Scramble with coefficients `(p0, p1, p2)` over the value at `observed`
    #[must_use]
    pub fn new(p0: i64, p1: i64, p2: i64, observed: impl Into<StatePath>) -> Self {
        Self {
            p0,
            p1,
            p2,
            observed: observed.into(),
        }
    }
}

impl Policy for PseudoRandomPolicy {
    fn sample(
        &mut self,
        observation: &State,
        action_state: &mut StateElement,
    ) -> Result<(Value, f64)> {
        let x = observation
            .at(&self.observed)?
            .value()
            .as_int()
            .ok_or_else(|| {
                CoactError::InvalidValue(format!(
                    "{} does not hold a discrete value",
                    self.observed
                ))
            })?;
        let Space::Discrete(set) = action_state.space() else {
            return Err(CoactError::InvalidValue(
                "pseudo-random policy requires a discrete action space".into(),
            ));
        };
        let n = set.len() as i64;
        let idx = (self.p0 + self.p1 * x + self.p2 * x * x).rem_euclid(n) as usize;
        Ok((Value::Int(set.support()[idx]), 0.0))
    }
}

/// Always emits the same action
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstantPolicy {
    value: Value,
}

impl ConstantPolicy {
    /// Emit `value` every phase
    #[must_use]
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

impl Policy for ConstantPolicy {
    fn sample(
        &mut self,
        _observation: &State,
        _action_state: &mut StateElement,
    ) -> Result<(Value, f64)> {
        Ok((self.value.clone(), 0.0))
    }
}
