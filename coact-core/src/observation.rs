//! Observation engines: how an agent sees the composed game state

use crate::error::Result;
use crate::seed::SeedSequence;
use crate::state::{FilterSpec, State};

/// Turns the composed game state into what one agent actually sees
///
/// Observation may be lossy or noisy; it never mutates the game state.
pub trait ObservationEngine: Send {
    /// Observe the composed game state, returning the observed view and an
    /// observation reward
    fn observe(&mut self, game_state: &State) -> Result<(State, f64)>;

    /// Receive a seed stream (engines without randomness ignore this)
    fn set_seed(&mut self, _seq: &mut SeedSequence) {}
}

/// Identity observation: full visibility, zero reward
#[derive(Debug, Clone, Copy, Default)]
pub struct FullObservation;

impl ObservationEngine for FullObservation {
    fn observe(&mut self, game_state: &State) -> Result<(State, f64)> {
        Ok((game_state.clone(), 0.0))
    }
}

/// Lossy observation restricted to the keys a filter spec selects
#[derive(Debug, Clone)]
pub struct FilteredObservation {
    spec: FilterSpec,
}

impl FilteredObservation {
    /// Observe only the selected subtree of the game state
    #[must_use]
    pub fn new(spec: FilterSpec) -> Self {
        Self { spec }
    }
}

impl ObservationEngine for FilteredObservation {
    fn observe(&mut self, game_state: &State) -> Result<(State, f64)> {
        Ok((game_state.filter(&self.spec), 0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::StateElement;
    use crate::space::Space;

    #[test]
    fn filtered_observation_restricts_view() {
        let gs = State::new()
            .with_substate(
                "task_state",
                State::new().with_element(
                    "position",
                    StateElement::new(1i64, Space::discrete(vec![0, 1, 2]).unwrap()).unwrap(),
                ),
            )
            .with_substate(
                "user_state",
                State::new().with_element(
                    "goal",
                    StateElement::new(2i64, Space::discrete(vec![0, 1, 2]).unwrap()).unwrap(),
                ),
            );

        let mut engine =
            FilteredObservation::new(FilterSpec::select([("task_state", FilterSpec::All)]));
        let (obs, reward) = engine.observe(&gs).unwrap();
        assert_eq!(reward, 0.0);
        assert!(obs.substate("task_state").is_ok());
        assert!(obs.substate("user_state").is_err());
    }
}
