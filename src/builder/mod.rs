//! Builder API for ergonomic state machine construction.
//!
//! This module provides fluent builders for machines and transition values,
//! plus the serializable settings they are configured with.

pub mod config;
pub mod error;
pub mod machine;
pub mod transition;

pub use config::{MachineConfig, UnhandledPolicy};
pub use error::BuildError;
pub use machine::StateMachineBuilder;
pub use transition::TransitionBuilder;
