//! Imperfect observation models

use rand::rngs::StdRng;
use rand::{thread_rng, Rng};
use rand_distr::{Distribution, Normal};

use coact_core::error::{CoactError, Result};
use coact_core::observation::ObservationEngine;
use coact_core::seed::SeedSequence;
use coact_core::space::{Space, Value};
use coact_core::state::{State, StatePath};

/// Adds Gaussian noise to selected continuous leaves of the observation
///
/// Noisy components are clamped back into their declared bounds so the
/// observed view stays a valid state. Targeting a discrete leaf is an error;
/// noise has no meaning on a categorical support.
pub struct NoisyObservation {
    std_dev: f64,
    targets: Vec<StatePath>,
    rng: Option<StdRng>,
}

impl NoisyObservation {
    /// Perturb each target path with `N(0, std_dev)` noise per component
    pub fn new<I, P>(std_dev: f64, targets: I) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<StatePath>,
    {
        if !std_dev.is_finite() || std_dev < 0.0 {
            return Err(CoactError::InvalidValue(format!(
                "noise standard deviation must be finite and non-negative, got {std_dev}"
            )));
        }
        Ok(Self {
            std_dev,
            targets: targets.into_iter().map(Into::into).collect(),
            rng: None,
        })
    }

    fn perturb<R: Rng + ?Sized>(
        observed: &mut State,
        path: &StatePath,
        noise: &Normal<f64>,
        rng: &mut R,
    ) -> Result<()> {
        let el = observed.at_mut(path)?;
        let Space::Continuous(num) = el.space().clone() else {
            return Err(CoactError::InvalidValue(format!(
                "{path} is discrete; noise applies to continuous leaves only"
            )));
        };
        let Value::Vector(v) = el.value().clone() else {
            return Err(CoactError::InvalidValue(format!(
                "{path} does not hold a numeric vector"
            )));
        };
        let noisy: Vec<f64> = v
            .iter()
            .zip(num.low())
            .zip(num.high())
            .map(|((x, l), h)| (x + noise.sample(rng)).clamp(*l, *h))
            .collect();
        el.set(noisy)
    }
}

impl ObservationEngine for NoisyObservation {
    fn observe(&mut self, game_state: &State) -> Result<(State, f64)> {
        let mut observed = game_state.clone();
        let noise = Normal::new(0.0, self.std_dev)
            .map_err(|e| CoactError::InvalidValue(e.to_string()))?;
        match self.rng.as_mut() {
            Some(rng) => {
                for path in &self.targets {
                    Self::perturb(&mut observed, path, &noise, rng)?;
                }
            }
            None => {
                let mut rng = thread_rng();
                for path in &self.targets {
                    Self::perturb(&mut observed, path, &noise, &mut rng)?;
                }
            }
        }
        Ok((observed, 0.0))
    }

    fn set_seed(&mut self, seq: &mut SeedSequence) {
        self.rng = Some(seq.spawn_rng());
    }
}
