//! Build errors for machine and transition builders.

use thiserror::Error;

/// Errors that can occur when building state machines and transitions.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Initial state not specified. Call .initial(label) before .build()")]
    MissingInitialState,

    #[error("Invalid machine configuration: {0}")]
    InvalidConfig(String),

    #[error("Transition source state not specified. Call .from(state)")]
    MissingSource,

    #[error("Transition trigger not specified. Call .on(trigger)")]
    MissingTrigger,

    #[error("Transition destination not specified. Call .to(state) or .reentry()")]
    MissingDestination,
}
