//! Composite states layered over the flat engine.
//!
//! A composite is an ordinary state of the [`StateMachine`](crate::engine::StateMachine)
//! whose entry hook turns it into a nested machine:
//!
//! - every declared child is marked as a sub-state of the composite
//! - a synthetic start trigger is permitted from the composite to its initial child
//! - that start trigger is *deferred*, never fired, so the driving loop moves into the child
//!
//! Completion is signalled with the composite's done and failed triggers,
//! which the enclosing state permits like any other trigger.

mod rules;
mod state;

pub use rules::StructureCheck;
pub use state::{validate_all, Completion, Composite, CompositeState};
