//! Nested states: composite (hierarchical) states over a flat state machine.
//!
//! The [`engine`] is a plain trigger-driven machine: configure a state,
//! permit a trigger to another state, fire, run entry and exit callbacks.
//! The [`composite`] layer makes one of those states behave as a whole nested
//! machine with its own initial child and a uniform done/failed protocol
//! towards whatever encloses it.
//!
//! # Core Concepts
//!
//! - **Identity**: every state and trigger gets an ordinal-prefixed name, so equal labels never collide
//! - **State tree**: an append-only arena with parent/child links by [`StateId`]
//! - **Deferred triggers**: callbacks queue triggers instead of firing, and the driving loop drains them
//!
//! # Example
//!
//! ```rust
//! use nested_states::builder::StateMachineBuilder;
//! use nested_states::composite::{Composite, CompositeState};
//! use nested_states::core::{StateId, Trigger};
//! use nested_states::engine::Dispatch;
//! use std::rc::Rc;
//!
//! struct Brewing {
//!     state: CompositeState,
//!     heating: StateId,
//!     done: Trigger,
//!     failed: Trigger,
//! }
//!
//! impl Composite for Brewing {
//!     fn initial_state(&self) -> StateId {
//!         self.heating
//!     }
//!     fn done_trigger(&self) -> &Trigger {
//!         &self.done
//!     }
//!     fn failed_trigger(&self) -> &Trigger {
//!         &self.failed
//!     }
//! }
//!
//! let mut machine = StateMachineBuilder::new().initial("idle").build().unwrap();
//! let idle = machine.initial_state();
//! let served = machine.add_state("served", None).unwrap();
//! let order = machine.trigger("order");
//!
//! let brewing: Rc<Brewing> = CompositeState::new(&mut machine, "brewing", None, |machine, state| {
//!     let heating = machine.add_state("heating", Some(state.id()))?;
//!     let done = machine.trigger("brewing_done");
//!     let signal = (state.clone(), done.clone());
//!     state.add_transition_to_parent_state(machine, heating, &done)?;
//!     state.add_callback_on_entry(machine, heating, move |ctx: &mut Dispatch<'_>, _| {
//!         signal.0.deferred_fire(ctx, &signal.1);
//!     })?;
//!     Ok(Brewing {
//!         state: state.clone(),
//!         heating,
//!         done,
//!         failed: machine.trigger("brewing_failed"),
//!     })
//! })
//! .unwrap();
//!
//! machine.configure(idle).permit(&order, brewing.state.id());
//! machine.configure(brewing.state.id()).permit(&brewing.done, served);
//!
//! machine.fire_and_drain(&order).unwrap();
//! assert_eq!(machine.current_state(), served);
//! ```

pub mod builder;
pub mod composite;
pub mod core;
pub mod engine;

// Re-export commonly used types
pub use builder::{MachineConfig, StateMachineBuilder, UnhandledPolicy};
pub use composite::{Composite, CompositeState};
pub use core::{Identity, StateId, StructureError, Trigger};
pub use engine::{DeferredTriggers, Dispatch, EngineError, StateMachine, Transition};
