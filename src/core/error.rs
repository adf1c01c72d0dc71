//! Configuration-time errors raised while assembling a hierarchy.

use thiserror::Error;

/// Inconsistent machine definition discovered during assembly.
///
/// These are programmer errors: they surface to whoever is building the
/// composite hierarchy and should abort construction.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StructureError {
    #[error("State id {id} does not belong to this machine")]
    UnknownState { id: usize },

    #[error("Source state '{state}' is not a child of composite '{composite}'")]
    SourceNotChild { composite: String, state: String },

    #[error(
        "Destination state '{state}' must be a child of composite '{composite}' \
         or the composite itself"
    )]
    DestinationNotChild { composite: String, state: String },

    #[error("Callbacks can only be attached to children of composite '{composite}', got '{state}'")]
    CallbackOnNonChild { composite: String, state: String },

    #[error("State '{state}' has no parent to propagate to")]
    MissingParent { state: String },

    #[error("Initial state '{state}' is not a child of composite '{composite}'")]
    InitialNotChild { composite: String, state: String },

    #[error("Composite '{composite}' has no behavior bound")]
    Unbound { composite: String },
}
