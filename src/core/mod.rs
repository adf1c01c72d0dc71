//! Core hierarchy types.
//!
//! This module contains the passive building blocks of a machine:
//! - Identities and the `Naming` counter that disambiguates them
//! - The state arena (`StateTree`) with parent/child links by index
//! - Guard predicates and transition history
//!
//! Nothing here dispatches triggers; that is the job of [`crate::engine`].

mod error;
mod guard;
mod history;
mod identity;
mod tree;

pub use error::StructureError;
pub use guard::Guard;
pub use history::{StateHistory, TransitionRecord};
pub use identity::{Identity, Naming, Trigger};
pub use tree::{StateId, StateNode, StateTree};
