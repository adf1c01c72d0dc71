//! Run-time dispatch errors.

use thiserror::Error;

/// Errors that can occur while firing triggers.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EngineError {
    #[error("No transition is permitted from state '{state}' for trigger '{trigger}'")]
    UnhandledTrigger { state: String, trigger: String },

    #[error("Multiple transitions are permitted from state '{state}' for trigger '{trigger}'")]
    AmbiguousTransition { state: String, trigger: String },

    #[error("Deferred trigger queue still held {pending} trigger(s) after {limit} steps")]
    DrainLimitExceeded { limit: usize, pending: usize },

    #[error("Snapshot serialization failed: {0}")]
    Serialization(String),
}
