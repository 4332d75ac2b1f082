//! Core state model and turn engine for human-machine interaction loops
//!
//! This crate provides the foundational abstractions for modeling a
//! two-agent interaction with a task: typed hierarchical state, validated
//! value spaces, capability-based agents and the four-phase turn scheduler
//! that sequences them deterministically.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod agent;
pub mod bundle;
pub mod element;
pub mod error;
pub mod inference;
pub mod observation;
pub mod policy;
pub mod reward;
pub mod seed;
pub mod space;
pub mod state;
pub mod task;
pub mod trace;

// Re-export core traits and types
pub use agent::{Agent, AgentBuilder, Role};
pub use bundle::{Bundle, BundleBuilder};
pub use element::StateElement;
pub use error::{CoactError, Result};
pub use inference::{InferenceEngine, NoInference};
pub use observation::{FilteredObservation, FullObservation, ObservationEngine};
pub use policy::{Policy, RandomPolicy};
pub use reward::RewardBreakdown;
pub use seed::SeedSequence;
pub use space::{CatSet, Numeric, Space, Value};
pub use state::{FilterSpec, ResetDict, ResetEntry, State, StateNode, StatePath};
pub use task::{InteractionTask, TurnContext};
pub use trace::{RoundRecord, Trace};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Agent, Bundle, CoactError, InteractionTask, ResetDict, Result, RewardBreakdown, Role,
        Space, State, StateElement, TurnContext, Value,
    };
}
