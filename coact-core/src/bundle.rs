//! The turn-based interaction engine
//!
//! A [`Bundle`] owns one task and two agents and sequences them through a
//! fixed four-phase cycle per round:
//!
//! | phase | what runs                         |
//! |-------|-----------------------------------|
//! | 0     | user observes, infers, acts       |
//! | 1     | task applies the user action      |
//! | 2     | assistant observes, infers, acts  |
//! | 3     | task applies the assistant action |
//!
//! The engine exclusively owns and sequences all three component states;
//! agents only reach the task through their declared action channel. In
//! debug builds every phase is wrapped in a snapshot diff asserting that
//! nothing but the active component's state changed.

use indexmap::IndexMap;
use tracing::debug;

use crate::agent::{Agent, Role};
use crate::element::StateElement;
use crate::error::{CoactError, Result};
use crate::reward::RewardBreakdown;
use crate::seed::SeedSequence;
use crate::space::{Space, Value};
use crate::state::{ResetDict, State};
use crate::task::{InteractionTask, TurnContext};
use crate::trace::{RoundRecord, Trace};

/// Orchestrates task + user + assistant through the four-phase turn cycle
pub struct Bundle<T: InteractionTask> {
    task: T,
    user: Agent,
    assistant: Agent,
    turn: u8,
    round: u64,
    terminated: bool,
    seed: Option<u64>,
    seedseq: Option<SeedSequence>,
    parameters: IndexMap<String, serde_json::Value>,
    trace: Trace,
    pending: RoundRecord,
    turn_template: StateElement,
    round_template: StateElement,
}

#[cfg(debug_assertions)]
struct DisciplineSnapshot {
    task: State,
    user_state: State,
    user_action: StateElement,
    assistant_state: State,
    assistant_action: StateElement,
}

impl<T: InteractionTask> Bundle<T> {
    /// Assemble a bundle from its three collaborators
    ///
    /// Fails with `MissingCollaborator` when an agent carries the wrong role.
    pub fn new(task: T, user: Agent, assistant: Agent) -> Result<Self> {
        if user.role() != Role::User {
            return Err(CoactError::MissingCollaborator(
                "user slot requires an agent with the user role",
            ));
        }
        if assistant.role() != Role::Assistant {
            return Err(CoactError::MissingCollaborator(
                "assistant slot requires an agent with the assistant role",
            ));
        }
        let turn_template = StateElement::new(0i64, Space::discrete(vec![0, 1, 2, 3])?)?;
        let round_template = StateElement::new(0i64, Space::interval(0.0, f64::MAX)?)?;
        Ok(Self {
            task,
            user,
            assistant,
            turn: 0,
            round: 0,
            terminated: false,
            seed: None,
            seedseq: None,
            parameters: IndexMap::new(),
            trace: Trace::new(None),
            pending: RoundRecord::open(0),
            turn_template,
            round_template,
        })
    }

    /// Start building a bundle
    #[must_use]
    pub fn builder() -> BundleBuilder<T> {
        BundleBuilder::new()
    }

    /// Phase about to execute, in `{0,1,2,3}`
    #[must_use]
    pub fn turn_index(&self) -> u8 {
        self.turn
    }

    /// Completed four-phase cycles since the last reset
    #[must_use]
    pub fn round_index(&self) -> u64 {
        self.round
    }

    /// Whether a terminal transition has latched
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// The task collaborator
    #[must_use]
    pub fn task(&self) -> &T {
        &self.task
    }

    /// The user agent
    #[must_use]
    pub fn user(&self) -> &Agent {
        &self.user
    }

    /// The assistant agent
    #[must_use]
    pub fn assistant(&self) -> &Agent {
        &self.assistant
    }

    /// Execution record since the last reset
    #[must_use]
    pub fn trace(&self) -> &Trace {
        &self.trace
    }

    /// Set an entry in the explicit parameter table
    pub fn set_parameter(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.parameters.insert(key.into(), value);
    }

    /// Look up a parameter; unknown keys fail instead of falling through
    pub fn parameter(&self, key: &str) -> Result<&serde_json::Value> {
        self.parameters
            .get(key)
            .ok_or_else(|| CoactError::UnknownKey(key.into()))
    }

    /// Compose the read-only global snapshot in its canonical key order
    #[must_use]
    pub fn game_state(&self) -> State {
        let mut turn_el = self.turn_template.clone();
        turn_el.write_raw(Value::Int(i64::from(self.turn)));
        let mut round_el = self.round_template.clone();
        round_el.write_raw(Value::Vector(vec![self.round as f64]));

        let game_info = State::new()
            .with_element("turn_index", turn_el)
            .with_element("round_index", round_el);

        State::new()
            .with_substate("game_info", game_info)
            .with_substate("task_state", self.task.state().clone())
            .with_substate("user_state", self.user.state().clone())
            .with_substate(
                "user_action",
                State::new().with_element("action", self.user.action().clone()),
            )
            .with_substate("assistant_state", self.assistant.state().clone())
            .with_substate(
                "assistant_action",
                State::new().with_element("action", self.assistant.action().clone()),
            )
    }

    /// Reseed, reset all component states and advance to `go_to`
    ///
    /// `dic` overrides are keyed by component name (`task_state`,
    /// `user_state`, `user_action`, `assistant_state`, `assistant_action`).
    /// Phases `0..go_to` are self-driven with each agent's own policy so the
    /// returned snapshot is internally consistent.
    pub fn reset(
        &mut self,
        dic: Option<&ResetDict>,
        go_to: Option<u8>,
        seed: Option<u64>,
    ) -> Result<State> {
        let go_to = go_to.unwrap_or(0);
        if go_to > 3 {
            return Err(CoactError::InvalidValue(format!(
                "go_to must be within 0..=3, got {go_to}"
            )));
        }

        self.terminated = false;
        self.turn = 0;
        self.round = 0;

        if let Some(entropy) = seed {
            self.seed = Some(entropy);
            let mut seq = SeedSequence::new(entropy);
            self.task.set_seed(&mut seq);
            self.user.set_seed(&mut seq);
            self.assistant.set_seed(&mut seq);
            self.seedseq = Some(seq);
        }
        debug!(go_to, seed = ?seed, "resetting bundle");

        self.task.state_mut().reset(None)?;
        self.task.reset()?;
        if let Some(d) = dic.and_then(|d| d.nested("task_state")) {
            self.task.state_mut().force(d)?;
        }
        self.user.reset(
            dic.and_then(|d| d.nested("user_state")),
            dic.and_then(|d| d.nested("user_action")),
        )?;
        self.assistant.reset(
            dic.and_then(|d| d.nested("assistant_state")),
            dic.and_then(|d| d.nested("assistant_action")),
        )?;

        self.trace = Trace::new(self.seed);
        self.pending = RoundRecord::open(0);

        for _ in 0..go_to {
            let (_, done) = self.drive(None)?;
            if done {
                break;
            }
        }
        Ok(self.game_state())
    }

    /// Execute the phases implied by the supplied actions
    ///
    /// user-only runs phases `{0,1}` (from phase 0), assistant-only runs
    /// `{2,3}` (from phase 2), both run all four in order, neither runs the
    /// remaining policy-driven phases of the current round. Supplying an
    /// action for a phase that is not about to execute fails with
    /// `MisorderedAction`.
    pub fn step(
        &mut self,
        user_action: Option<Value>,
        assistant_action: Option<Value>,
    ) -> Result<(State, RewardBreakdown, bool)> {
        if self.terminated {
            return Err(CoactError::BundleTerminated);
        }
        let plan: Vec<Option<Value>> = match (user_action, assistant_action) {
            (Some(u), Some(a)) => {
                self.expect_turn(0, "user")?;
                vec![Some(u), None, Some(a), None]
            }
            (Some(u), None) => {
                self.expect_turn(0, "user")?;
                vec![Some(u), None]
            }
            (None, Some(a)) => {
                self.expect_turn(2, "assistant")?;
                vec![Some(a), None]
            }
            (None, None) => vec![None; 4 - usize::from(self.turn)],
        };

        let mut rewards = RewardBreakdown::default();
        for injected in plan {
            let (delta, done) = self.drive(injected.as_ref())?;
            rewards += delta;
            if done {
                break;
            }
        }
        Ok((self.game_state(), rewards, self.terminated))
    }

    /// Advance exactly one policy-driven phase
    pub fn quarter_step(&mut self) -> Result<(State, RewardBreakdown, bool)> {
        if self.terminated {
            return Err(CoactError::BundleTerminated);
        }
        let (rewards, _) = self.drive(None)?;
        Ok((self.game_state(), rewards, self.terminated))
    }

    fn expect_turn(&self, expected: u8, who: &str) -> Result<()> {
        if self.turn != expected {
            return Err(CoactError::MisorderedAction(format!(
                "{who} action supplied while the engine awaits phase {}",
                self.turn
            )));
        }
        Ok(())
    }

    /// Run one phase; any error latches the terminal-error state so a
    /// half-mutated snapshot can never be stepped further.
    fn drive(&mut self, injected: Option<&Value>) -> Result<(RewardBreakdown, bool)> {
        match self.run_phase(injected) {
            Ok(out) => Ok(out),
            Err(e) => {
                self.terminated = true;
                Err(e)
            }
        }
    }

    fn run_phase(&mut self, injected: Option<&Value>) -> Result<(RewardBreakdown, bool)> {
        #[cfg(debug_assertions)]
        let snapshot = self.discipline_snapshot();
        let phase = self.turn;
        debug!(phase, round = self.round, "executing phase");

        let mut delta = RewardBreakdown::default();
        let mut done = false;
        match phase {
            0 => {
                let gs = self.game_state();
                delta.user_observation_reward = self.user.observe(&gs)?;
                delta.user_inference_reward = self.user.infer()?;
                let (action, reward) = self.user.take_action(injected)?;
                delta.user_policy_reward = reward;
                self.pending.user_action = Some(action);
            }
            1 => {
                let action = self.user.action().value().clone();
                let ctx = TurnContext {
                    turn_index: phase,
                    round_index: self.round,
                    user_state: self.user.state(),
                    assistant_state: self.assistant.state(),
                    user_action: self.user.action(),
                    assistant_action: self.assistant.action(),
                    parameters: &self.parameters,
                };
                let (reward, d) = self.task.on_user_action(&action, &ctx)?;
                delta.first_task_reward = reward;
                done = d;
            }
            2 => {
                let gs = self.game_state();
                delta.assistant_observation_reward = self.assistant.observe(&gs)?;
                delta.assistant_inference_reward = self.assistant.infer()?;
                let (action, reward) = self.assistant.take_action(injected)?;
                delta.assistant_policy_reward = reward;
                self.pending.assistant_action = Some(action);
            }
            3 => {
                let action = self.assistant.action().value().clone();
                let ctx = TurnContext {
                    turn_index: phase,
                    round_index: self.round,
                    user_state: self.user.state(),
                    assistant_state: self.assistant.state(),
                    user_action: self.user.action(),
                    assistant_action: self.assistant.action(),
                    parameters: &self.parameters,
                };
                let (reward, d) = self.task.on_assistant_action(&action, &ctx)?;
                delta.second_task_reward = reward;
                done = d;
            }
            _ => unreachable!("turn index is always in 0..=3"),
        }

        #[cfg(debug_assertions)]
        self.assert_discipline(phase, &snapshot);

        self.pending.rewards += delta;
        self.turn = (phase + 1) % 4;
        if done {
            self.terminated = true;
            self.pending.done = true;
            self.close_round();
        } else if self.turn == 0 {
            self.round += 1;
            self.close_round();
        }
        Ok((delta, done))
    }

    fn close_round(&mut self) {
        let record = std::mem::replace(&mut self.pending, RoundRecord::open(self.round));
        self.trace.push(record);
    }

    #[cfg(debug_assertions)]
    fn discipline_snapshot(&self) -> DisciplineSnapshot {
        DisciplineSnapshot {
            task: self.task.state().clone(),
            user_state: self.user.state().clone(),
            user_action: self.user.action().clone(),
            assistant_state: self.assistant.state().clone(),
            assistant_action: self.assistant.action().clone(),
        }
    }

    #[cfg(debug_assertions)]
    fn assert_discipline(&self, phase: u8, snap: &DisciplineSnapshot) {
        match phase {
            0 => {
                debug_assert!(snap.task == *self.task.state(), "phase 0 mutated task state");
                debug_assert!(
                    snap.assistant_state == *self.assistant.state()
                        && snap.assistant_action == *self.assistant.action(),
                    "phase 0 mutated assistant state"
                );
            }
            1 | 3 => {
                debug_assert!(
                    snap.user_state == *self.user.state()
                        && snap.user_action == *self.user.action(),
                    "task transition mutated user state"
                );
                debug_assert!(
                    snap.assistant_state == *self.assistant.state()
                        && snap.assistant_action == *self.assistant.action(),
                    "task transition mutated assistant state"
                );
            }
            2 => {
                debug_assert!(snap.task == *self.task.state(), "phase 2 mutated task state");
                debug_assert!(
                    snap.user_state == *self.user.state()
                        && snap.user_action == *self.user.action(),
                    "phase 2 mutated user state"
                );
            }
            _ => {}
        }
    }
}

/// Builder for [`Bundle`]
pub struct BundleBuilder<T> {
    task: Option<T>,
    user: Option<Agent>,
    assistant: Option<Agent>,
    parameters: IndexMap<String, serde_json::Value>,
}

impl<T: InteractionTask> BundleBuilder<T> {
    fn new() -> Self {
        Self {
            task: None,
            user: None,
            assistant: None,
            parameters: IndexMap::new(),
        }
    }

    /// The task collaborator (required)
    #[must_use]
    pub fn task(mut self, task: T) -> Self {
        self.task = Some(task);
        self
    }

    /// The user agent (required)
    #[must_use]
    pub fn user(mut self, user: Agent) -> Self {
        self.user = Some(user);
        self
    }

    /// The assistant agent (required)
    #[must_use]
    pub fn assistant(mut self, assistant: Agent) -> Self {
        self.assistant = Some(assistant);
        self
    }

    /// Seed the explicit parameter table
    #[must_use]
    pub fn parameter(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }

    /// Finish the bundle; fails if a collaborator is missing
    pub fn build(self) -> Result<Bundle<T>> {
        let task = self.task.ok_or(CoactError::MissingCollaborator("task"))?;
        let user = self.user.ok_or(CoactError::MissingCollaborator("user agent"))?;
        let assistant = self
            .assistant
            .ok_or(CoactError::MissingCollaborator("assistant agent"))?;
        let mut bundle = Bundle::new(task, user, assistant)?;
        bundle.parameters = self.parameters;
        Ok(bundle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::StateElement;
    use crate::state::StatePath;

    /// Ten-cell line task: user moves the cursor, assistant phase is a no-op,
    /// done when the cursor reaches the last cell.
    struct LineTask {
        state: State,
    }

    impl LineTask {
        fn new() -> Self {
            let state = State::new().with_element(
                "position",
                StateElement::new(0i64, Space::discrete((0..=10).collect::<Vec<_>>()).unwrap())
                    .unwrap(),
            );
            Self { state }
        }
    }

    impl InteractionTask for LineTask {
        fn state(&self) -> &State {
            &self.state
        }

        fn state_mut(&mut self) -> &mut State {
            &mut self.state
        }

        fn on_user_action(&mut self, action: &Value, _ctx: &TurnContext<'_>) -> Result<(f64, bool)> {
            let delta = action.as_int().unwrap_or(0);
            let pos = self.state.element("position")?.value().as_int().unwrap_or(0);
            let next = (pos + delta).clamp(0, 10);
            self.state.element_mut("position")?.set(next)?;
            Ok((-1.0, next == 10))
        }

        fn on_assistant_action(
            &mut self,
            _action: &Value,
            _ctx: &TurnContext<'_>,
        ) -> Result<(f64, bool)> {
            Ok((0.0, false))
        }
    }

    fn line_bundle() -> Bundle<LineTask> {
        let user = Agent::builder(Role::User)
            .action(StateElement::new(0i64, Space::discrete(vec![-1, 0, 1]).unwrap()).unwrap())
            .build()
            .unwrap();
        let assistant = Agent::builder(Role::Assistant)
            .action(StateElement::new(1i64, Space::discrete(vec![1]).unwrap()).unwrap())
            .build()
            .unwrap();
        Bundle::builder()
            .task(LineTask::new())
            .user(user)
            .assistant(assistant)
            .build()
            .unwrap()
    }

    #[test]
    fn identical_seeds_identical_trajectories() {
        let mut a = line_bundle();
        let mut b = line_bundle();
        a.reset(None, None, Some(17)).unwrap();
        b.reset(None, None, Some(17)).unwrap();
        for _ in 0..5 {
            let (gs_a, r_a, done_a) = a.step(None, None).unwrap();
            let (gs_b, r_b, done_b) = b.step(None, None).unwrap();
            assert_eq!(gs_a, gs_b);
            assert_eq!(r_a, r_b);
            assert_eq!(done_a, done_b);
            if done_a {
                break;
            }
        }
    }

    #[test]
    fn rounds_increment_once_per_cycle() {
        let mut bundle = line_bundle();
        bundle.reset(None, None, Some(3)).unwrap();
        assert_eq!(bundle.round_index(), 0);
        bundle.step(Some(Value::Int(0)), Some(Value::Int(1))).unwrap();
        assert_eq!(bundle.round_index(), 1);
        assert_eq!(bundle.turn_index(), 0);
    }

    #[test]
    fn misordered_actions_rejected() {
        let mut bundle = line_bundle();
        bundle.reset(None, None, Some(3)).unwrap();
        // engine awaits phase 0, assistant action cannot be consumed
        let err = bundle.step(None, Some(Value::Int(1))).unwrap_err();
        assert!(matches!(err, CoactError::MisorderedAction(_)));

        // advance to phase 2, now a user action is misordered
        bundle.step(Some(Value::Int(0)), None).unwrap();
        assert_eq!(bundle.turn_index(), 2);
        let err = bundle.step(Some(Value::Int(0)), None).unwrap_err();
        assert!(matches!(err, CoactError::MisorderedAction(_)));
    }

    #[test]
    fn terminal_latches_until_reset() {
        let mut bundle = line_bundle();
        let dic = ResetDict::new()
            .with_nested("task_state", ResetDict::new().with("position", 9i64));
        bundle.reset(Some(&dic), None, Some(1)).unwrap();

        let (_, _, done) = bundle
            .step(Some(Value::Int(1)), Some(Value::Int(1)))
            .unwrap();
        assert!(done);
        assert!(bundle.is_terminated());
        assert!(matches!(
            bundle.step(Some(Value::Int(0)), None),
            Err(CoactError::BundleTerminated)
        ));
        assert!(matches!(
            bundle.quarter_step(),
            Err(CoactError::BundleTerminated)
        ));

        bundle.reset(None, None, None).unwrap();
        bundle.step(Some(Value::Int(0)), None).unwrap();
    }

    #[test]
    fn go_to_matches_self_driven_prefix() {
        let mut direct = line_bundle();
        direct.reset(None, Some(2), Some(23)).unwrap();
        for _ in 0..2 {
            direct.quarter_step().unwrap();
        }

        let mut full = line_bundle();
        full.reset(None, Some(0), Some(23)).unwrap();
        for _ in 0..4 {
            full.quarter_step().unwrap();
        }

        assert_eq!(direct.game_state(), full.game_state());
        assert_eq!(direct.round_index(), full.round_index());
    }

    #[test]
    fn out_of_space_injection_fails_before_applying() {
        let mut bundle = line_bundle();
        bundle.reset(None, None, Some(5)).unwrap();
        let before = bundle.task().state().element("position").unwrap().value().clone();
        let err = bundle.step(Some(Value::Int(7)), None).unwrap_err();
        assert!(matches!(err, CoactError::ActionOutOfSpace(_)));
        assert_eq!(
            bundle.task().state().element("position").unwrap().value(),
            &before
        );
    }

    #[test]
    fn trace_records_rounds_and_actions() {
        let mut bundle = line_bundle();
        bundle.reset(None, None, Some(2)).unwrap();
        bundle.step(Some(Value::Int(1)), Some(Value::Int(1))).unwrap();
        bundle.step(Some(Value::Int(-1)), Some(Value::Int(1))).unwrap();

        let trace = bundle.trace();
        assert_eq!(trace.len(), 2);
        let actions: Vec<_> = trace.actions().collect();
        assert_eq!(actions[0].0, Some(&Value::Int(1)));
        assert_eq!(actions[1].0, Some(&Value::Int(-1)));
        assert_eq!(trace.seed, Some(2));
    }

    #[test]
    fn game_state_key_order_is_canonical() {
        let mut bundle = line_bundle();
        bundle.reset(None, None, Some(0)).unwrap();
        let gs = bundle.game_state();
        let keys: Vec<_> = gs.keys().cloned().collect();
        assert_eq!(
            keys,
            vec![
                "game_info",
                "task_state",
                "user_state",
                "user_action",
                "assistant_state",
                "assistant_action"
            ]
        );
        assert_eq!(
            gs.at(&StatePath::from("game_info/turn_index")).unwrap().value(),
            &Value::Int(0)
        );
    }

    #[test]
    fn unknown_parameter_fails() {
        let mut bundle = line_bundle();
        bundle.set_parameter("timestep", serde_json::json!(0.1));
        assert!(bundle.parameter("timestep").is_ok());
        assert!(matches!(
            bundle.parameter("nope"),
            Err(CoactError::UnknownKey(_))
        ));
    }
}
