//! Error types for the interaction core

use thiserror::Error;

/// Core error type for interaction engine operations
#[derive(Error, Debug)]
pub enum CoactError {
    /// A raw value cannot be cast into a space
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// A reset dictionary entry has the wrong shape or type
    #[error("invalid reset value for '{key}': {reason}")]
    InvalidResetValue {
        /// Key of the offending entry
        key: String,
        /// Why the entry was rejected
        reason: String,
    },

    /// A policy-produced or injected action fails space membership
    #[error("action outside declared space: {0}")]
    ActionOutOfSpace(String),

    /// An action was supplied for a phase that is not the next to execute
    #[error("misordered action: {0}")]
    MisorderedAction(String),

    /// step() was called after a terminal transition without a reset
    #[error("bundle is terminated; call reset() before stepping again")]
    BundleTerminated,

    /// A component or property was accessed before being attached
    #[error("missing collaborator: {0}")]
    MissingCollaborator(&'static str),

    /// A state key or path does not exist
    #[error("unknown state key: {0}")]
    UnknownKey(String),

    /// Dimension mismatch
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimensionality
        expected: usize,
        /// Actual dimensionality
        actual: usize,
    },

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Other errors
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoactError>;
