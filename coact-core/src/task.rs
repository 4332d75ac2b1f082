//! The task contract: state transitions driven by agent actions

use indexmap::IndexMap;

use crate::element::StateElement;
use crate::error::Result;
use crate::seed::SeedSequence;
use crate::space::Value;
use crate::state::State;

/// Read-only view of the engine handed to a task during a transition
///
/// Replaces a mutable back-reference from task to engine: everything a
/// transition may legitimately read arrives through this facade, and the
/// task can mutate nothing but its own state.
#[derive(Debug)]
pub struct TurnContext<'a> {
    /// Phase about to be applied, in `{0,1,2,3}`
    pub turn_index: u8,
    /// Completed four-phase cycles since the last reset
    pub round_index: u64,
    /// The user's internal state
    pub user_state: &'a State,
    /// The assistant's internal state
    pub assistant_state: &'a State,
    /// The user's action element (most recent action)
    pub user_action: &'a StateElement,
    /// The assistant's action element (most recent action)
    pub assistant_action: &'a StateElement,
    /// The bundle's explicit parameter table
    pub parameters: &'a IndexMap<String, serde_json::Value>,
}

/// A controlled process with a mutable state and transition rules
///
/// Implementations confine their side effects to their own state; the
/// engine enforces this in debug builds with a pre/post snapshot diff.
pub trait InteractionTask: Send {
    /// The task's current state
    fn state(&self) -> &State;

    /// Mutable access to the task's state
    fn state_mut(&mut self) -> &mut State;

    /// Apply the user's action, returning `(task reward, done)`
    fn on_user_action(&mut self, action: &Value, ctx: &TurnContext<'_>) -> Result<(f64, bool)>;

    /// Apply the assistant's action, returning `(task reward, done)`
    fn on_assistant_action(&mut self, action: &Value, ctx: &TurnContext<'_>)
        -> Result<(f64, bool)>;

    /// Task-defined initialization, run after the random base reset
    fn reset(&mut self) -> Result<()> {
        Ok(())
    }

    /// Seed the task; the default seeds the task state's leaf streams
    fn set_seed(&mut self, seq: &mut SeedSequence) {
        self.state_mut().set_seed(seq);
    }
}
