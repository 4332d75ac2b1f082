//! Ordered hierarchical state containers
//!
//! A [`State`] maps names to elements or nested sub-states. Key order is
//! insertion order and is semantically meaningful: flattening and array
//! export walk entries in that order, and external consumers rely on it.
//! Raw-value writes always route through the target element's `set`; only a
//! whole [`StateElement`] may replace another structurally.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::element::StateElement;
use crate::error::{CoactError, Result};
use crate::seed::SeedSequence;
use crate::space::{Space, Value};

/// Path addressing a nested leaf, e.g. `task_state/position`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatePath(Vec<String>);

impl StatePath {
    /// Build a path from segments
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// The path segments in order
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl FromStr for StatePath {
    type Err = CoactError;

    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(CoactError::UnknownKey("<empty path>".into()));
        }
        Ok(Self(s.split('/').map(str::to_owned).collect()))
    }
}

impl From<&str> for StatePath {
    fn from(s: &str) -> Self {
        Self(s.split('/').map(str::to_owned).collect())
    }
}

impl fmt::Display for StatePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

/// One entry of a state: a leaf element or a nested sub-state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StateNode {
    /// A leaf state variable
    Element(StateElement),
    /// A nested sub-state
    State(State),
}

/// Overrides applied during a reset, keyed by (possibly nested) names
#[derive(Debug, Clone, Default)]
pub struct ResetDict {
    entries: IndexMap<String, ResetEntry>,
}

/// A single reset override
#[derive(Debug, Clone)]
pub enum ResetEntry {
    /// Force a leaf to this value (validated against its space)
    Value(Value),
    /// Structurally replace a leaf element (bypasses value validation)
    Element(StateElement),
    /// Overrides for a nested sub-state
    Nested(ResetDict),
}

impl ResetDict {
    /// Empty override set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value override
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entries
            .insert(key.into(), ResetEntry::Value(value.into()));
        self
    }

    /// Add a structural element replacement
    #[must_use]
    pub fn with_element(mut self, key: impl Into<String>, element: StateElement) -> Self {
        self.entries.insert(key.into(), ResetEntry::Element(element));
        self
    }

    /// Add overrides for a nested sub-state
    #[must_use]
    pub fn with_nested(mut self, key: impl Into<String>, nested: ResetDict) -> Self {
        self.entries.insert(key.into(), ResetEntry::Nested(nested));
        self
    }

    /// Look up an override
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ResetEntry> {
        self.entries.get(key)
    }

    /// Nested overrides under a key, if any
    #[must_use]
    pub fn nested(&self, key: &str) -> Option<&ResetDict> {
        match self.entries.get(key) {
            Some(ResetEntry::Nested(d)) => Some(d),
            _ => None,
        }
    }

    /// Whether no overrides are present
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Selects which keys of a state survive a filtered view
///
/// Unknown keys in a spec are ignored, so adapters may safely over-specify.
#[derive(Debug, Clone)]
pub enum FilterSpec {
    /// Keep the whole subtree
    All,
    /// Keep only the named keys, each pruned by its own sub-spec
    Keys(IndexMap<String, FilterSpec>),
}

impl FilterSpec {
    /// Build a key-selection spec
    pub fn select<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, FilterSpec)>,
        S: Into<String>,
    {
        Self::Keys(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    fn keeps(&self, key: &str) -> Option<&FilterSpec> {
        match self {
            FilterSpec::All => Some(&FilterSpec::All),
            FilterSpec::Keys(map) => map.get(key),
        }
    }
}

/// Ordered, possibly nested mapping from names to state variables
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    entries: IndexMap<String, StateNode>,
}

impl State {
    /// Empty state
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style element insertion
    #[must_use]
    pub fn with_element(mut self, name: impl Into<String>, element: StateElement) -> Self {
        self.insert_element(name, element);
        self
    }

    /// Builder-style sub-state insertion
    #[must_use]
    pub fn with_substate(mut self, name: impl Into<String>, state: State) -> Self {
        self.insert_state(name, state);
        self
    }

    /// Insert or replace a leaf element
    pub fn insert_element(&mut self, name: impl Into<String>, element: StateElement) {
        self.entries.insert(name.into(), StateNode::Element(element));
    }

    /// Insert or replace a nested sub-state
    pub fn insert_state(&mut self, name: impl Into<String>, state: State) {
        self.entries.insert(name.into(), StateNode::State(state));
    }

    /// Number of direct entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the state has no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &StateNode)> {
        self.entries.iter()
    }

    /// Keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    /// Direct entry lookup
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&StateNode> {
        self.entries.get(name)
    }

    /// Leaf element under a direct key
    pub fn element(&self, name: &str) -> Result<&StateElement> {
        match self.entries.get(name) {
            Some(StateNode::Element(el)) => Ok(el),
            _ => Err(CoactError::UnknownKey(name.into())),
        }
    }

    /// Mutable leaf element under a direct key
    pub fn element_mut(&mut self, name: &str) -> Result<&mut StateElement> {
        match self.entries.get_mut(name) {
            Some(StateNode::Element(el)) => Ok(el),
            _ => Err(CoactError::UnknownKey(name.into())),
        }
    }

    /// Nested sub-state under a direct key
    pub fn substate(&self, name: &str) -> Result<&State> {
        match self.entries.get(name) {
            Some(StateNode::State(s)) => Ok(s),
            _ => Err(CoactError::UnknownKey(name.into())),
        }
    }

    /// Mutable nested sub-state under a direct key
    pub fn substate_mut(&mut self, name: &str) -> Result<&mut State> {
        match self.entries.get_mut(name) {
            Some(StateNode::State(s)) => Ok(s),
            _ => Err(CoactError::UnknownKey(name.into())),
        }
    }

    /// Leaf element at a nested path
    pub fn at(&self, path: &StatePath) -> Result<&StateElement> {
        let (last, prefix) = path
            .segments()
            .split_last()
            .ok_or_else(|| CoactError::UnknownKey("<empty path>".into()))?;
        let mut cursor = self;
        for seg in prefix {
            cursor = cursor.substate(seg)?;
        }
        cursor.element(last)
    }

    /// Mutable leaf element at a nested path
    pub fn at_mut(&mut self, path: &StatePath) -> Result<&mut StateElement> {
        let (last, prefix) = path
            .segments()
            .split_last()
            .ok_or_else(|| CoactError::UnknownKey("<empty path>".into()))?;
        let mut cursor = self;
        for seg in prefix {
            cursor = cursor.substate_mut(seg)?;
        }
        cursor.element_mut(last)
    }

    /// Propagate a seed sequence depth-first
    ///
    /// Every leaf receives an independently spawned child stream, so a
    /// partial reset never shifts the draws of untouched elements.
    pub fn set_seed(&mut self, seq: &mut SeedSequence) {
        for node in self.entries.values_mut() {
            match node {
                StateNode::Element(el) => el.attach_rng(seq.spawn_rng()),
                StateNode::State(sub) => sub.set_seed(seq),
            }
        }
    }

    /// Recursively reset leaves, honoring `dic` overrides
    ///
    /// Leaves absent from `dic` resample from their own stream; present
    /// entries of the wrong shape fail with `InvalidResetValue`. Keys in
    /// `dic` that match nothing are ignored.
    pub fn reset(&mut self, dic: Option<&ResetDict>) -> Result<()> {
        for (key, node) in &mut self.entries {
            let entry = dic.and_then(|d| d.get(key));
            match (node, entry) {
                (StateNode::Element(el), None) => el.reset(),
                (StateNode::Element(el), Some(ResetEntry::Value(v))) => {
                    el.set(v.clone())
                        .map_err(|e| CoactError::InvalidResetValue {
                            key: key.clone(),
                            reason: e.to_string(),
                        })?;
                }
                (StateNode::Element(el), Some(ResetEntry::Element(new))) => {
                    *el = new.clone();
                }
                (StateNode::Element(_), Some(ResetEntry::Nested(_))) => {
                    return Err(CoactError::InvalidResetValue {
                        key: key.clone(),
                        reason: "nested overrides supplied for a leaf element".into(),
                    });
                }
                (StateNode::State(sub), None) => sub.reset(None)?,
                (StateNode::State(sub), Some(ResetEntry::Nested(d))) => sub.reset(Some(d))?,
                (StateNode::State(_), Some(_)) => {
                    return Err(CoactError::InvalidResetValue {
                        key: key.clone(),
                        reason: "leaf override supplied for a sub-state".into(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Apply overrides only, without resampling untouched leaves
    pub fn force(&mut self, dic: &ResetDict) -> Result<()> {
        for (key, node) in &mut self.entries {
            match (node, dic.get(key)) {
                (_, None) => {}
                (StateNode::Element(el), Some(ResetEntry::Value(v))) => {
                    el.set(v.clone())
                        .map_err(|e| CoactError::InvalidResetValue {
                            key: key.clone(),
                            reason: e.to_string(),
                        })?;
                }
                (StateNode::Element(el), Some(ResetEntry::Element(new))) => {
                    *el = new.clone();
                }
                (StateNode::State(sub), Some(ResetEntry::Nested(d))) => sub.force(d)?,
                (_, Some(_)) => {
                    return Err(CoactError::InvalidResetValue {
                        key: key.clone(),
                        reason: "override shape does not match the state entry".into(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Pruned nested view keeping only the keys the spec selects
    #[must_use]
    pub fn filter(&self, spec: &FilterSpec) -> State {
        let mut out = State::new();
        for (key, node) in &self.entries {
            if let Some(sub_spec) = spec.keeps(key) {
                match node {
                    StateNode::Element(el) => out.insert_element(key.clone(), el.clone()),
                    StateNode::State(sub) => out.insert_state(key.clone(), sub.filter(sub_spec)),
                }
            }
        }
        out
    }

    fn walk_flat<'a>(&'a self, prefix: &str, out: &mut IndexMap<String, &'a StateElement>) {
        for (key, node) in &self.entries {
            let path = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{prefix}/{key}")
            };
            match node {
                StateNode::Element(el) => {
                    out.insert(path, el);
                }
                StateNode::State(sub) => sub.walk_flat(&path, out),
            }
        }
    }

    /// Flattened leaf view keyed by `/`-joined paths, in insertion order
    #[must_use]
    pub fn flatten(&self) -> IndexMap<String, &StateElement> {
        let mut out = IndexMap::new();
        self.walk_flat("", &mut out);
        out
    }

    /// Filtered and flattened element view
    #[must_use]
    pub fn filter_flat(&self, spec: &FilterSpec) -> IndexMap<String, StateElement> {
        self.filter(spec)
            .flatten()
            .into_iter()
            .map(|(k, el)| (k, el.clone()))
            .collect()
    }

    /// Filtered and flattened numeric-array export
    #[must_use]
    pub fn filter_arrays(&self, spec: &FilterSpec) -> IndexMap<String, Array1<f64>> {
        self.filter(spec)
            .flatten()
            .into_iter()
            .map(|(k, el)| (k, el.to_array()))
            .collect()
    }

    /// Filtered and flattened space export
    #[must_use]
    pub fn filter_spaces(&self, spec: &FilterSpec) -> IndexMap<String, Space> {
        self.filter(spec)
            .flatten()
            .into_iter()
            .map(|(k, el)| (k, el.space().clone()))
            .collect()
    }
}
