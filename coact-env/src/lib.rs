//! Interaction tasks and training adapters for coact
//!
//! Concrete tasks implementing the core task contract, plus a single-agent
//! facade that exposes one side of a bundle to standard RL training loops.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod adapter;
pub mod pointing;

pub use adapter::{convert_space, AdapterSpace, RewardWeights, SingleAgentEnv};
pub use pointing::SimplePointingTask;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{AdapterSpace, RewardWeights, SimplePointingTask, SingleAgentEnv};
}
