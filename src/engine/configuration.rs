//! Per-state transition table entries and the fluent configuration builder.

use super::dispatch::Dispatch;
use super::transition::Transition;
use crate::core::{Guard, StateId, Trigger};
use std::collections::BTreeMap;
use std::rc::Rc;
use tracing::{trace, warn};

/// Callback run on entry to or exit from a state.
pub type Action = Rc<dyn Fn(&mut Dispatch<'_>, &Transition)>;

/// One permitted outcome of a trigger from a state.
#[derive(Clone, Debug)]
pub(crate) struct TriggerBehaviour {
    pub(crate) destination: StateId,
    pub(crate) guard: Option<Guard>,
}

impl TriggerBehaviour {
    pub(crate) fn permits(&self) -> bool {
        self.guard.as_ref().map_or(true, Guard::check)
    }
}

#[derive(Clone)]
pub(crate) struct EntryAction {
    /// Only run when entered through this trigger.
    pub(crate) from: Option<Trigger>,
    pub(crate) action: Action,
}

/// Everything the engine knows about one state.
#[derive(Clone, Default)]
pub(crate) struct StateRepresentation {
    pub(crate) superstate: Option<StateId>,
    pub(crate) behaviours: BTreeMap<Trigger, Vec<TriggerBehaviour>>,
    pub(crate) entry_actions: Vec<EntryAction>,
    pub(crate) exit_actions: Vec<Action>,
}

/// Fluent builder returned by [`StateMachine::configure`](super::StateMachine::configure).
///
/// # Example
///
/// ```rust
/// use nested_states::builder::StateMachineBuilder;
///
/// let mut machine = StateMachineBuilder::new().initial("open").build().unwrap();
/// let open = machine.initial_state();
/// let assigned = machine.add_state("assigned", None).unwrap();
/// let assign = machine.trigger("assign");
///
/// machine.configure(open).permit(&assign, assigned);
/// machine
///     .configure(assigned)
///     .sub_state_of(open)
///     .permit_reentry(&assign)
///     .on_entry(|_ctx, _transition| {});
///
/// machine.fire(&assign).unwrap();
/// assert!(machine.is_in_state(open));
/// ```
pub struct StateConfiguration<'a> {
    state: StateId,
    table: &'a mut BTreeMap<StateId, StateRepresentation>,
}

impl<'a> StateConfiguration<'a> {
    pub(crate) fn new(state: StateId, table: &'a mut BTreeMap<StateId, StateRepresentation>) -> Self {
        table.entry(state).or_default();
        Self { state, table }
    }

    fn representation(&mut self) -> &mut StateRepresentation {
        self.table.entry(self.state).or_default()
    }

    fn add_behaviour(&mut self, trigger: &Trigger, behaviour: TriggerBehaviour) {
        let state = self.state;
        let behaviours = self
            .representation()
            .behaviours
            .entry(trigger.clone())
            .or_default();
        let duplicate = behaviour.guard.is_none()
            && behaviours
                .iter()
                .any(|b| b.guard.is_none() && b.destination == behaviour.destination);
        if duplicate {
            trace!(%state, %trigger, "transition already permitted");
            return;
        }
        trace!(%state, %trigger, destination = %behaviour.destination, "permit");
        behaviours.push(behaviour);
    }

    /// The state being configured.
    pub fn state(&self) -> StateId {
        self.state
    }

    /// Permit `trigger` to move from this state to `destination`.
    ///
    /// Permitting the same unguarded pair again has no effect.
    pub fn permit(mut self, trigger: &Trigger, destination: StateId) -> Self {
        self.add_behaviour(
            trigger,
            TriggerBehaviour {
                destination,
                guard: None,
            },
        );
        self
    }

    /// Permit `trigger` only while `guard` holds.
    pub fn permit_if(mut self, trigger: &Trigger, destination: StateId, guard: Guard) -> Self {
        self.add_behaviour(
            trigger,
            TriggerBehaviour {
                destination,
                guard: Some(guard),
            },
        );
        self
    }

    /// Permit `trigger` to leave and re-enter this same state.
    pub fn permit_reentry(self, trigger: &Trigger) -> Self {
        let state = self.state;
        self.permit(trigger, state)
    }

    /// Declare this state as nested inside `parent`.
    ///
    /// Triggers unhandled here are looked up on `parent`, and moving between
    /// states that share `parent` does not exit or re-enter it. Links that
    /// would make the hierarchy cyclic are ignored.
    pub fn sub_state_of(mut self, parent: StateId) -> Self {
        let state = self.state;
        let mut cursor = Some(parent);
        let mut steps = 0;
        while let Some(ancestor) = cursor {
            if ancestor == state || steps > self.table.len() {
                warn!(%state, %parent, "ignoring cyclic sub-state declaration");
                return self;
            }
            cursor = self.table.get(&ancestor).and_then(|r| r.superstate);
            steps += 1;
        }
        self.table.entry(parent).or_default();
        self.representation().superstate = Some(parent);
        self
    }

    /// Run `action` whenever this state is entered.
    pub fn on_entry<F>(mut self, action: F) -> Self
    where
        F: Fn(&mut Dispatch<'_>, &Transition) + 'static,
    {
        self.representation().entry_actions.push(EntryAction {
            from: None,
            action: Rc::new(action),
        });
        self
    }

    /// Run `action` when this state is entered through `trigger`.
    pub fn on_entry_from<F>(mut self, trigger: &Trigger, action: F) -> Self
    where
        F: Fn(&mut Dispatch<'_>, &Transition) + 'static,
    {
        self.representation().entry_actions.push(EntryAction {
            from: Some(trigger.clone()),
            action: Rc::new(action),
        });
        self
    }

    /// Run `action` whenever this state is exited.
    pub fn on_exit<F>(mut self, action: F) -> Self
    where
        F: Fn(&mut Dispatch<'_>, &Transition) + 'static,
    {
        self.representation().exit_actions.push(Rc::new(action));
        self
    }
}
