//! Inference engines: how an agent updates its internal state

use crate::error::Result;
use crate::seed::SeedSequence;
use crate::state::State;

/// Updates an agent's internal state from its latest observation
pub trait InferenceEngine: Send {
    /// Infer against the agent's own state, returning an inference reward
    fn infer(&mut self, observation: &State, agent_state: &mut State) -> Result<f64>;

    /// Receive a seed stream (engines without randomness ignore this)
    fn set_seed(&mut self, _seq: &mut SeedSequence) {}
}

/// Identity inference: leaves the internal state untouched, zero reward
#[derive(Debug, Clone, Copy, Default)]
pub struct NoInference;

impl InferenceEngine for NoInference {
    fn infer(&mut self, _observation: &State, _agent_state: &mut State) -> Result<f64> {
        Ok(0.0)
    }
}
