//! One-dimensional pointing task
//!
//! A cursor lives on a discrete grid scattered with targets. The user picks
//! a direction each round, the assistant picks a gain, and the task moves
//! the cursor by their product. The round-by-round cost of `-0.5` per task
//! transition makes shorter trajectories strictly better.

use rand::rngs::StdRng;
use rand::{thread_rng, Rng};
use tracing::debug;

use coact_core::element::StateElement;
use coact_core::error::{CoactError, Result};
use coact_core::seed::SeedSequence;
use coact_core::space::{Space, Value};
use coact_core::state::State;
use coact_core::task::{InteractionTask, TurnContext};

/// Cursor-on-a-grid task driven by a user direction and an assistant gain
pub struct SimplePointingTask {
    grid_size: i64,
    num_targets: usize,
    state: State,
    rng: Option<StdRng>,
}

impl SimplePointingTask {
    /// A grid of `grid_size` cells holding `num_targets` distinct targets
    pub fn new(grid_size: i64, num_targets: usize) -> Result<Self> {
        if grid_size < 2 {
            return Err(CoactError::InvalidValue(format!(
                "grid needs at least two cells, got {grid_size}"
            )));
        }
        if num_targets == 0 || num_targets as i64 >= grid_size {
            return Err(CoactError::InvalidValue(format!(
                "target count must be in 1..{grid_size}, got {num_targets}"
            )));
        }
        let cells: Vec<i64> = (0..grid_size).collect();
        let max = (grid_size - 1) as f64;
        let state = State::new()
            .with_element("position", StateElement::new(0i64, Space::discrete(cells)?)?)
            .with_element(
                "targets",
                StateElement::new(
                    (0..num_targets).map(|i| i as f64).collect::<Vec<_>>(),
                    Space::continuous(vec![0.0; num_targets], vec![max; num_targets])?,
                )?,
            );
        Ok(Self {
            grid_size,
            num_targets,
            state,
            rng: None,
        })
    }

    /// Number of grid cells
    #[must_use]
    pub fn grid_size(&self) -> i64 {
        self.grid_size
    }

    /// Number of targets scattered at reset
    #[must_use]
    pub fn num_targets(&self) -> usize {
        self.num_targets
    }

    /// Current target cells, sorted ascending
    pub fn targets(&self) -> Result<Vec<i64>> {
        match self.state.element("targets")?.value() {
            Value::Vector(v) => Ok(v.iter().map(|x| *x as i64).collect()),
            Value::Int(_) => Err(CoactError::InvalidValue(
                "targets leaf does not hold a vector".into(),
            )),
        }
    }

    fn scatter<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<()> {
        let mut targets: Vec<i64> =
            rand::seq::index::sample(rng, self.grid_size as usize, self.num_targets)
                .into_iter()
                .map(|i| i as i64)
                .collect();
        targets.sort_unstable();

        // cursor starts off-target so the first round is never already solved
        let position = loop {
            let candidate = rng.gen_range(0..self.grid_size);
            if !targets.contains(&candidate) {
                break candidate;
            }
        };
        debug!(?targets, position, "scattered pointing task");
        self.state
            .element_mut("targets")?
            .set(targets.iter().map(|t| *t as f64).collect::<Vec<_>>())?;
        self.state.element_mut("position")?.set(position)
    }

    fn goal_reached(&self, position: i64, ctx: &TurnContext<'_>) -> Result<bool> {
        // a goal-holding user defines success; otherwise any target does
        match ctx.user_state.element("goal") {
            Ok(goal) => Ok(goal.value().as_int() == Some(position)),
            Err(_) => Ok(self.targets()?.contains(&position)),
        }
    }
}

impl InteractionTask for SimplePointingTask {
    fn state(&self) -> &State {
        &self.state
    }

    fn state_mut(&mut self) -> &mut State {
        &mut self.state
    }

    fn on_user_action(&mut self, _action: &Value, _ctx: &TurnContext<'_>) -> Result<(f64, bool)> {
        // the cursor only moves once the assistant has supplied its gain
        Ok((0.0, false))
    }

    fn on_assistant_action(
        &mut self,
        action: &Value,
        ctx: &TurnContext<'_>,
    ) -> Result<(f64, bool)> {
        let gain = action.as_int().ok_or_else(|| {
            CoactError::InvalidValue("assistant gain must be a discrete scalar".into())
        })?;
        let direction = ctx.user_action.value().as_int().ok_or_else(|| {
            CoactError::InvalidValue("user direction must be a discrete scalar".into())
        })?;
        let position = self
            .state
            .element("position")?
            .value()
            .as_int()
            .unwrap_or(0);
        let next = (position + direction * gain).clamp(0, self.grid_size - 1);
        self.state.element_mut("position")?.set(next)?;
        let done = self.goal_reached(next, ctx)?;
        Ok((-0.5, done))
    }

    fn reset(&mut self) -> Result<()> {
        match self.rng.take() {
            Some(mut rng) => {
                let out = self.scatter(&mut rng);
                self.rng = Some(rng);
                out
            }
            None => self.scatter(&mut thread_rng()),
        }
    }

    fn set_seed(&mut self, seq: &mut SeedSequence) {
        self.rng = Some(seq.spawn_rng());
        self.state.set_seed(seq);
    }
}
