//! Typed, validated value domains
//!
//! A [`Space`] is the legal domain for exactly one state variable: either a
//! finite ordered set of integers ([`CatSet`]) or an elementwise bounded
//! numeric box ([`Numeric`]). Membership, casting and sampling are pure
//! functions over `(space, value)`; values that fail validation are rejected,
//! never clamped.

use ndarray::Array1;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{CoactError, Result};

/// Canonical representation of a state variable's value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// A discrete scalar
    Int(i64),
    /// A numeric vector (scalars are length-1 vectors)
    Vector(Vec<f64>),
}

impl Value {
    /// Number of scalar components
    #[must_use]
    pub fn dim(&self) -> usize {
        match self {
            Value::Int(_) => 1,
            Value::Vector(v) => v.len(),
        }
    }

    /// The discrete scalar, if this is an `Int`
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Vector(_) => None,
        }
    }

    /// A single scalar view of the value, if one-dimensional
    #[must_use]
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Vector(v) if v.len() == 1 => Some(v[0]),
            Value::Vector(_) => None,
        }
    }

    /// Flatten into a numeric array
    #[must_use]
    pub fn to_array(&self) -> Array1<f64> {
        match self {
            Value::Int(i) => Array1::from(vec![*i as f64]),
            Value::Vector(v) => Array1::from(v.clone()),
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Vector(vec![x])
    }
}

impl From<Vec<f64>> for Value {
    fn from(v: Vec<f64>) -> Self {
        Value::Vector(v)
    }
}

/// Finite ordered set of representable discrete values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatSet {
    support: Vec<i64>,
}

impl CatSet {
    /// Create a set from an ordered support
    pub fn new(support: impl Into<Vec<i64>>) -> Result<Self> {
        let support = support.into();
        if support.is_empty() {
            return Err(CoactError::InvalidValue(
                "discrete support must not be empty".into(),
            ));
        }
        Ok(Self { support })
    }

    /// Exact membership test
    #[must_use]
    pub fn contains(&self, value: i64) -> bool {
        self.support.contains(&value)
    }

    /// Number of representable values
    #[must_use]
    pub fn len(&self) -> usize {
        self.support.len()
    }

    /// Whether the support is empty (never true for a constructed set)
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.support.is_empty()
    }

    /// The ordered support
    #[must_use]
    pub fn support(&self) -> &[i64] {
        &self.support
    }
}

/// Elementwise bounded numeric box
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Numeric {
    low: Vec<f64>,
    high: Vec<f64>,
}

impl Numeric {
    /// Create a box from elementwise bounds
    pub fn new(low: Vec<f64>, high: Vec<f64>) -> Result<Self> {
        if low.len() != high.len() {
            return Err(CoactError::DimensionMismatch {
                expected: low.len(),
                actual: high.len(),
            });
        }
        if low.iter().zip(&high).any(|(l, h)| l > h) {
            return Err(CoactError::InvalidValue(
                "lower bound exceeds upper bound".into(),
            ));
        }
        Ok(Self { low, high })
    }

    /// Dimensionality of the box
    #[must_use]
    pub fn dim(&self) -> usize {
        self.low.len()
    }

    /// Lower bounds
    #[must_use]
    pub fn low(&self) -> &[f64] {
        &self.low
    }

    /// Upper bounds
    #[must_use]
    pub fn high(&self) -> &[f64] {
        &self.high
    }

    /// Elementwise bound check
    #[must_use]
    pub fn contains(&self, v: &[f64]) -> bool {
        v.len() == self.low.len()
            && v.iter()
                .zip(&self.low)
                .zip(&self.high)
                .all(|((x, l), h)| x >= l && x <= h)
    }
}

/// Validated domain for a scalar or vector state variable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Space {
    /// Discrete finite set
    Discrete(CatSet),
    /// Continuous bounded box
    Continuous(Numeric),
}

impl Space {
    /// Discrete space over an ordered support
    pub fn discrete(support: impl Into<Vec<i64>>) -> Result<Self> {
        Ok(Space::Discrete(CatSet::new(support)?))
    }

    /// Continuous box space with elementwise bounds
    pub fn continuous(low: Vec<f64>, high: Vec<f64>) -> Result<Self> {
        Ok(Space::Continuous(Numeric::new(low, high)?))
    }

    /// One-dimensional continuous interval
    pub fn interval(low: f64, high: f64) -> Result<Self> {
        Self::continuous(vec![low], vec![high])
    }

    /// Dimensionality of values in this space
    #[must_use]
    pub fn dim(&self) -> usize {
        match self {
            Space::Discrete(_) => 1,
            Space::Continuous(n) => n.dim(),
        }
    }

    /// Exact membership test
    #[must_use]
    pub fn contains(&self, value: &Value) -> bool {
        match (self, value) {
            (Space::Discrete(set), Value::Int(i)) => set.contains(*i),
            (Space::Continuous(num), Value::Vector(v)) => num.contains(v),
            _ => false,
        }
    }

    /// Coerce a compatible raw value into this space's canonical representation
    ///
    /// Integral floats cast into a discrete set; a discrete scalar casts into
    /// a one-dimensional box. Anything else fails with `InvalidValue`.
    pub fn cast(&self, value: &Value) -> Result<Value> {
        match (self, value) {
            (Space::Discrete(set), Value::Int(i)) => {
                if set.contains(*i) {
                    Ok(Value::Int(*i))
                } else {
                    Err(CoactError::InvalidValue(format!(
                        "{i} is not in the discrete support"
                    )))
                }
            }
            (Space::Discrete(set), Value::Vector(v)) if v.len() == 1 && v[0].fract() == 0.0 => {
                let i = v[0] as i64;
                if set.contains(i) {
                    Ok(Value::Int(i))
                } else {
                    Err(CoactError::InvalidValue(format!(
                        "{i} is not in the discrete support"
                    )))
                }
            }
            (Space::Continuous(num), Value::Vector(v)) => {
                if v.len() == num.dim() {
                    Ok(Value::Vector(v.clone()))
                } else {
                    Err(CoactError::DimensionMismatch {
                        expected: num.dim(),
                        actual: v.len(),
                    })
                }
            }
            (Space::Continuous(num), Value::Int(i)) if num.dim() == 1 => {
                Ok(Value::Vector(vec![*i as f64]))
            }
            _ => Err(CoactError::InvalidValue(format!(
                "cannot cast {value:?} into {self:?}"
            ))),
        }
    }

    /// Draw a value uniformly from the support
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Value {
        match self {
            Space::Discrete(set) => {
                let idx = rng.gen_range(0..set.len());
                Value::Int(set.support()[idx])
            }
            Space::Continuous(num) => {
                let v = num
                    .low()
                    .iter()
                    .zip(num.high())
                    .map(|(l, h)| rng.gen_range(*l..=*h))
                    .collect();
                Value::Vector(v)
            }
        }
    }
}
