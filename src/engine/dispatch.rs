//! Restricted view of the machine handed to callbacks.

use super::configuration::StateConfiguration;
use super::machine::StateMachine;
use super::queue::DeferredTriggers;
use crate::core::{StateId, StateTree, Trigger};
use uuid::Uuid;

/// Context passed to entry and exit callbacks while a trigger is dispatched.
///
/// Callbacks may reconfigure states, read the hierarchy and defer further
/// triggers. They cannot fire or drain the queue: both are only available on
/// [`StateMachine`], which is mutably borrowed for the whole dispatch. A
/// callback that wants another transition calls
/// [`push_deferred_trigger`](DeferredTriggers::push_deferred_trigger) and the
/// driving loop fires it once the current dispatch has returned.
pub struct Dispatch<'a> {
    machine: &'a mut StateMachine,
}

impl<'a> Dispatch<'a> {
    pub(crate) fn new(machine: &'a mut StateMachine) -> Self {
        Self { machine }
    }

    pub fn configure(&mut self, state: StateId) -> StateConfiguration<'_> {
        self.machine.configure(state)
    }

    pub fn tree(&self) -> &StateTree {
        self.machine.tree()
    }

    pub fn state_name(&self, state: StateId) -> &str {
        self.machine.state_name(state)
    }

    pub fn superstate(&self, state: StateId) -> Option<StateId> {
        self.machine.superstate(state)
    }

    /// The state the machine has already moved to.
    pub fn current_state(&self) -> StateId {
        self.machine.current_state()
    }

    pub fn machine_id(&self) -> Uuid {
        self.machine.id()
    }

    /// Triggers waiting to be fired by the driving loop.
    pub fn deferred_triggers(&self) -> impl Iterator<Item = &Trigger> {
        self.machine.deferred_triggers()
    }

    pub(crate) fn start_trigger(&self) -> &Trigger {
        self.machine.start_trigger()
    }
}

impl DeferredTriggers for Dispatch<'_> {
    fn push_deferred_trigger(&mut self, trigger: Trigger) {
        self.machine.push_deferred_trigger(trigger);
    }
}
