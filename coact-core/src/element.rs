//! A single named value bound to a space
//!
//! Every write routes through the space's cast and membership checks, so an
//! element can never hold an out-of-support value. Each element may carry its
//! own random stream, inherited from the owning state's seed sequence, so
//! resetting one element never perturbs the draws of its siblings.

use ndarray::{Array1, ArrayView1};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::error::{CoactError, Result};
use crate::space::{Space, Value};

/// A validated state variable: value plus space plus seed stream
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateElement {
    value: Value,
    space: Space,
    #[serde(skip)]
    rng: Option<StdRng>,
}

impl PartialEq for StateElement {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value && self.space == other.space
    }
}

impl PartialEq<Value> for StateElement {
    fn eq(&self, other: &Value) -> bool {
        &self.value == other
    }
}

impl StateElement {
    /// Create an element with an initial value, validated against the space
    pub fn new(value: impl Into<Value>, space: Space) -> Result<Self> {
        let value = space.cast(&value.into())?;
        if !space.contains(&value) {
            return Err(CoactError::InvalidValue(format!(
                "initial value {value:?} outside {space:?}"
            )));
        }
        Ok(Self {
            value,
            space,
            rng: None,
        })
    }

    /// The current value
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// The element's space
    #[must_use]
    pub fn space(&self) -> &Space {
        &self.space
    }

    /// Cast then assign; fails with `InvalidValue` if the value does not fit
    pub fn set(&mut self, value: impl Into<Value>) -> Result<()> {
        let cast = self.space.cast(&value.into())?;
        if !self.space.contains(&cast) {
            return Err(CoactError::InvalidValue(format!(
                "{cast:?} outside {:?}",
                self.space
            )));
        }
        self.value = cast;
        Ok(())
    }

    /// Engine-internal write for engine-owned counters. Callers must
    /// guarantee membership themselves.
    pub(crate) fn write_raw(&mut self, value: Value) {
        self.value = value;
    }

    /// Attach an inherited seed stream
    pub fn attach_rng(&mut self, rng: StdRng) {
        self.rng = Some(rng);
    }

    /// Draw a fresh value from the space without assigning it
    ///
    /// Uses the inherited stream when seeded, the thread generator otherwise.
    pub fn sample_value(&mut self) -> Value {
        match &mut self.rng {
            Some(rng) => self.space.sample(rng),
            None => self.space.sample(&mut rand::thread_rng()),
        }
    }

    /// Resample uniformly from the space using the inherited stream
    pub fn reset(&mut self) {
        self.value = self.sample_value();
    }

    /// Resample uniformly using an explicit generator
    pub fn reset_with<R: rand::Rng + ?Sized>(&mut self, rng: &mut R) {
        self.value = self.space.sample(rng);
    }

    /// Export as a flat numeric array
    #[must_use]
    pub fn to_array(&self) -> Array1<f64> {
        self.value.to_array()
    }

    /// Import from a flat numeric array
    ///
    /// Rejects buffers of the wrong length with `DimensionMismatch` and
    /// non-member contents with `InvalidValue`.
    pub fn from_array(&mut self, flat: ArrayView1<'_, f64>) -> Result<()> {
        if flat.len() != self.space.dim() {
            return Err(CoactError::DimensionMismatch {
                expected: self.space.dim(),
                actual: flat.len(),
            });
        }
        self.set(Value::Vector(flat.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::SeedSequence;
    use ndarray::arr1;
    use proptest::prelude::*;

    fn grid_element() -> StateElement {
        StateElement::new(2i64, Space::discrete((0..31).collect::<Vec<_>>()).unwrap()).unwrap()
    }

    #[test]
    fn set_validates() {
        let mut el = grid_element();
        el.set(30i64).unwrap();
        assert_eq!(el.value(), &Value::Int(30));
        assert!(matches!(el.set(31i64), Err(CoactError::InvalidValue(_))));
        // rejected writes leave the value untouched
        assert_eq!(el.value(), &Value::Int(30));
    }

    #[test]
    fn array_round_trip() {
        let mut el = StateElement::new(
            vec![0.25, -0.5],
            Space::continuous(vec![-1.0, -1.0], vec![1.0, 1.0]).unwrap(),
        )
        .unwrap();
        let arr = el.to_array();
        let before = el.value().clone();
        el.from_array(arr.view()).unwrap();
        assert_eq!(el.value(), &before);
    }

    #[test]
    fn from_array_rejects_wrong_length() {
        let mut el = grid_element();
        let err = el.from_array(arr1(&[1.0, 2.0]).view()).unwrap_err();
        assert!(matches!(err, CoactError::DimensionMismatch { .. }));
    }

    #[test]
    fn seeded_reset_is_deterministic() {
        let mut a = grid_element();
        let mut b = grid_element();
        a.attach_rng(SeedSequence::new(9).spawn_rng());
        b.attach_rng(SeedSequence::new(9).spawn_rng());
        for _ in 0..10 {
            a.reset();
            b.reset();
            assert_eq!(a.value(), b.value());
        }
    }

    proptest! {
        #[test]
        fn boxed_vectors_round_trip(xs in proptest::collection::vec(-10.0f64..10.0, 3)) {
            let mut el = StateElement::new(
                vec![0.0, 0.0, 0.0],
                Space::continuous(vec![-10.0; 3], vec![10.0; 3]).unwrap(),
            )
            .unwrap();
            el.set(xs.clone()).unwrap();
            let arr = el.to_array();
            el.from_array(arr.view()).unwrap();
            prop_assert_eq!(el.value(), &Value::Vector(xs));
        }
    }
}
