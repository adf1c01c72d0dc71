//! Composite states: a flat-machine state that runs a nested sub-machine.

use super::rules::{self, StructureCheck};
use crate::core::{StateId, StructureError, Trigger};
use crate::engine::{DeferredTriggers, Dispatch, StateMachine, Transition};
use std::cell::OnceCell;
use std::rc::Rc;
use tracing::{debug, error, trace};

/// Behavior a concrete composite supplies.
///
/// The orchestration itself (hierarchy bookkeeping, the implicit move into
/// the initial child, completion signalling) is shared and lives in
/// [`CompositeState`]. Implementors only say where to start, which triggers
/// mean "done" and "failed", and optionally hook into entry and exit.
pub trait Composite {
    /// Child reached automatically every time the composite is entered.
    fn initial_state(&self) -> StateId;

    /// Trigger that tells the enclosing state this composite succeeded.
    fn done_trigger(&self) -> &Trigger;

    /// Trigger that tells the enclosing state this composite failed.
    fn failed_trigger(&self) -> &Trigger;

    /// Runs on every entry, after the start trigger is queued. No-op by default.
    fn on_entry(&self, _ctx: &mut Dispatch<'_>) {}

    /// Runs on every exit from the composite. No-op by default.
    fn on_exit(&self, _ctx: &mut Dispatch<'_>) {}
}

/// Values captured from a [`Composite`] once it has been assembled.
#[derive(Clone, Debug, PartialEq)]
pub struct Completion {
    pub initial: StateId,
    pub done: Trigger,
    pub failed: Trigger,
}

type Slot = Rc<OnceCell<Rc<dyn Composite>>>;

/// Handle to a composite's node in the flat machine.
///
/// Cheap to clone; clones share the completion triggers bound at the end of
/// [`CompositeState::new`]. Concrete composites usually keep one inside
/// themselves and move clones into their child callbacks.
#[derive(Clone, Debug)]
pub struct CompositeState {
    id: StateId,
    completion: Rc<OnceCell<Completion>>,
}

impl CompositeState {
    /// Create a composite node and wire it into `machine`.
    ///
    /// Entry and exit hooks are registered on the new node before anything
    /// else happens. `assemble` then declares the children, their transitions
    /// and callbacks, and returns the concrete behavior, which is bound to the
    /// hooks. Fails if any configuration call inside `assemble` fails, or if
    /// the returned initial state is not one of the declared children.
    ///
    /// # Example
    ///
    /// ```rust
    /// use nested_states::composite::{Composite, CompositeState};
    /// use nested_states::core::{StateId, Trigger};
    /// use nested_states::engine::StateMachine;
    ///
    /// struct Washing {
    ///     soaking: StateId,
    ///     done: Trigger,
    ///     failed: Trigger,
    /// }
    ///
    /// impl Composite for Washing {
    ///     fn initial_state(&self) -> StateId {
    ///         self.soaking
    ///     }
    ///     fn done_trigger(&self) -> &Trigger {
    ///         &self.done
    ///     }
    ///     fn failed_trigger(&self) -> &Trigger {
    ///         &self.failed
    ///     }
    /// }
    ///
    /// let mut machine = StateMachine::new("idle");
    /// let idle = machine.initial_state();
    /// let start = machine.trigger("start");
    ///
    /// let washing = CompositeState::new(&mut machine, "washing", None, |machine, composite| {
    ///     Ok(Washing {
    ///         soaking: machine.add_state("soaking", Some(composite.id()))?,
    ///         done: machine.trigger("washing_done"),
    ///         failed: machine.trigger("washing_failed"),
    ///     })
    /// })
    /// .unwrap();
    ///
    /// let composite = machine.tree().parent(washing.soaking).unwrap();
    /// machine.configure(idle).permit(&start, composite);
    /// machine.fire_and_drain(&start).unwrap();
    ///
    /// assert_eq!(machine.current_state(), washing.soaking);
    /// ```
    pub fn new<C, F>(
        machine: &mut StateMachine,
        label: &str,
        parent: Option<StateId>,
        assemble: F,
    ) -> Result<Rc<C>, StructureError>
    where
        C: Composite + 'static,
        F: FnOnce(&mut StateMachine, &CompositeState) -> Result<C, StructureError>,
    {
        let id = machine.add_state(label, parent)?;
        let handle = Self {
            id,
            completion: Rc::new(OnceCell::new()),
        };
        let slot: Slot = Rc::new(OnceCell::new());

        let on_entry = (handle.clone(), Rc::clone(&slot));
        let on_exit = (handle.clone(), Rc::clone(&slot));
        machine
            .configure(id)
            .on_entry(move |ctx, _transition| on_entry.0.enter(ctx, &on_entry.1))
            .on_exit(move |ctx, _transition| on_exit.0.exit(ctx, &on_exit.1));
        if let Some(parent) = parent {
            machine.configure(id).sub_state_of(parent);
        }

        let behavior = Rc::new(assemble(machine, &handle)?);
        let completion = Completion {
            initial: behavior.initial_state(),
            done: behavior.done_trigger().clone(),
            failed: behavior.failed_trigger().clone(),
        };
        if !machine.tree().is_child_of(completion.initial, id) {
            return Err(StructureError::InitialNotChild {
                composite: machine.state_name(id).to_string(),
                state: machine.state_name(completion.initial).to_string(),
            });
        }

        // Both cells are fresh, so neither set can fail.
        let _ = handle.completion.set(completion);
        let dynamic: Rc<dyn Composite> = behavior.clone();
        let _ = slot.set(dynamic);

        debug!(
            machine = %machine.id(),
            composite = machine.state_name(id),
            children = machine.tree().children(id).len(),
            "assembled composite state"
        );
        Ok(behavior)
    }

    pub fn id(&self) -> StateId {
        self.id
    }

    pub fn children<'m>(&self, machine: &'m StateMachine) -> &'m [StateId] {
        machine.tree().children(self.id)
    }

    /// Completion triggers, once the composite has been assembled.
    pub fn completion(&self) -> Option<&Completion> {
        self.completion.get()
    }

    pub fn done_trigger(&self) -> Option<&Trigger> {
        self.completion().map(|c| &c.done)
    }

    pub fn failed_trigger(&self) -> Option<&Trigger> {
        self.completion().map(|c| &c.failed)
    }

    fn is_completion(&self, trigger: &Trigger) -> bool {
        self.completion()
            .is_some_and(|c| &c.done == trigger || &c.failed == trigger)
    }

    fn enter(&self, ctx: &mut Dispatch<'_>, slot: &Slot) {
        let children = ctx.tree().children(self.id).to_vec();
        for child in children {
            ctx.configure(child).sub_state_of(self.id);
        }

        let Some(behavior) = slot.get().cloned() else {
            error!(
                machine = %ctx.machine_id(),
                composite = ctx.state_name(self.id),
                "entered composite state with no behavior bound"
            );
            return;
        };
        debug!(
            machine = %ctx.machine_id(),
            composite = ctx.state_name(self.id),
            parent = ctx.tree().parent(self.id).map(|p| ctx.state_name(p)),
            "starting composite state"
        );

        let start = ctx.start_trigger().clone();
        ctx.configure(self.id).permit(&start, behavior.initial_state());
        ctx.push_deferred_trigger(start);

        behavior.on_entry(ctx);
    }

    fn exit(&self, ctx: &mut Dispatch<'_>, slot: &Slot) {
        debug!(
            machine = %ctx.machine_id(),
            composite = ctx.state_name(self.id),
            "ending composite state"
        );
        if let Some(behavior) = slot.get().cloned() {
            behavior.on_exit(ctx);
        }
    }

    fn not_child(&self, machine: &StateMachine, state: StateId) -> bool {
        !machine.tree().is_child_of(state, self.id)
    }

    /// Permit `trigger` to move from child `source` to `destination`.
    ///
    /// `destination` must be a child as well, or the composite itself; the
    /// latter is a completion move that lets the enclosing state react to the
    /// same trigger.
    pub fn add_transition(
        &self,
        machine: &mut StateMachine,
        source: StateId,
        trigger: &Trigger,
        destination: StateId,
    ) -> Result<(), StructureError> {
        if self.not_child(machine, source) {
            return Err(StructureError::SourceNotChild {
                composite: machine.state_name(self.id).to_string(),
                state: machine.state_name(source).to_string(),
            });
        }
        if destination != self.id && self.not_child(machine, destination) {
            return Err(StructureError::DestinationNotChild {
                composite: machine.state_name(self.id).to_string(),
                state: machine.state_name(destination).to_string(),
            });
        }
        trace!(
            composite = machine.state_name(self.id),
            source = machine.state_name(source),
            %trigger,
            destination = machine.state_name(destination),
            "composite transition"
        );
        machine.configure(source).permit(trigger, destination);
        Ok(())
    }

    pub fn add_transition_from(
        &self,
        machine: &mut StateMachine,
        transition: &Transition,
    ) -> Result<(), StructureError> {
        self.add_transition(
            machine,
            transition.source(),
            transition.trigger(),
            transition.destination(),
        )
    }

    /// Permit `trigger` to move from `source` up to its parent.
    pub fn add_transition_to_parent_state(
        &self,
        machine: &mut StateMachine,
        source: StateId,
        trigger: &Trigger,
    ) -> Result<(), StructureError> {
        let parent = machine
            .tree()
            .parent(source)
            .ok_or_else(|| StructureError::MissingParent {
                state: machine.state_name(source).to_string(),
            })?;
        self.add_transition(machine, source, trigger, parent)
    }

    pub fn add_callback_on_entry<F>(
        &self,
        machine: &mut StateMachine,
        state: StateId,
        callback: F,
    ) -> Result<(), StructureError>
    where
        F: Fn(&mut Dispatch<'_>, &Transition) + 'static,
    {
        self.ensure_child_for_callback(machine, state)?;
        machine.configure(state).on_entry(callback);
        Ok(())
    }

    pub fn add_callback_on_exit<F>(
        &self,
        machine: &mut StateMachine,
        state: StateId,
        callback: F,
    ) -> Result<(), StructureError>
    where
        F: Fn(&mut Dispatch<'_>, &Transition) + 'static,
    {
        self.ensure_child_for_callback(machine, state)?;
        machine.configure(state).on_exit(callback);
        Ok(())
    }

    fn ensure_child_for_callback(
        &self,
        machine: &StateMachine,
        state: StateId,
    ) -> Result<(), StructureError> {
        if self.not_child(machine, state) {
            return Err(StructureError::CallbackOnNonChild {
                composite: machine.state_name(self.id).to_string(),
                state: machine.state_name(state).to_string(),
            });
        }
        Ok(())
    }

    /// Queue `trigger` for the driving loop.
    ///
    /// This composite's own done and failed triggers are queued twice: the
    /// first firing moves the active child up to the composite, the second is
    /// then resolved from the composite itself so the enclosing state can
    /// react to it.
    pub fn deferred_fire<Q>(&self, queue: &mut Q, trigger: &Trigger)
    where
        Q: DeferredTriggers + ?Sized,
    {
        queue.push_deferred_trigger(trigger.clone());
        if self.is_completion(trigger) {
            queue.push_deferred_trigger(trigger.clone());
        }
    }

    /// Check this composite's structure, reporting every violation.
    pub fn validate(&self, machine: &StateMachine) -> StructureCheck {
        rules::check_composite(machine.tree(), self.id, self.completion())
    }
}

/// Validate several composites at once, accumulating all violations.
pub fn validate_all<'a, I>(machine: &StateMachine, composites: I) -> StructureCheck
where
    I: IntoIterator<Item = &'a CompositeState>,
{
    rules::combine(
        composites
            .into_iter()
            .map(|composite| composite.validate(machine))
            .collect(),
    )
}
