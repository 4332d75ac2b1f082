//! Ready-made user and assistant behaviors for coact bundles
//!
//! Concrete policies, imperfect observation models and prebuilt agents for
//! driving interaction tasks without writing custom engines.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod observation;
pub mod policy;
pub mod prebuilt;

pub use observation::NoisyObservation;
pub use policy::{ConstantPolicy, GoalSeekingPolicy, PseudoRandomPolicy};
pub use prebuilt::{constant_gain_assistant, goal_user, pseudo_random_user};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        constant_gain_assistant, goal_user, pseudo_random_user, ConstantPolicy, GoalSeekingPolicy,
        NoisyObservation, PseudoRandomPolicy,
    };
}
