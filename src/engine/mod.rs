//! Flat trigger-driven state machine.
//!
//! The engine knows about states, triggers, superstate links and entry/exit
//! callbacks. It has no notion of composites; those are layered on top in
//! [`crate::composite`] using only the public configuration surface.
//!
//! # Key Concepts
//!
//! - **Configuration**: `permit`, `permit_reentry`, `sub_state_of` and entry/exit callbacks per state
//! - **Dispatch**: `fire` runs exit actions, moves, then runs entry actions, synchronously
//! - **Deferred triggers**: callbacks queue triggers; the driving loop fires them in FIFO order

mod configuration;
mod dispatch;
mod error;
mod machine;
mod queue;
mod snapshot;
mod transition;

pub use configuration::{Action, StateConfiguration};
pub use dispatch::Dispatch;
pub use error::EngineError;
pub use machine::{StateMachine, TransitionObserver, UnhandledHandler};
pub use queue::{DeferredQueue, DeferredTriggers};
pub use snapshot::{MachineSnapshot, SNAPSHOT_VERSION};
pub use transition::Transition;
