//! Flat trigger-driven state machine with superstate links.

use super::configuration::{Action, StateConfiguration, StateRepresentation};
use super::dispatch::Dispatch;
use super::error::EngineError;
use super::queue::{DeferredQueue, DeferredTriggers};
use super::snapshot::MachineSnapshot;
use super::transition::Transition;
use crate::builder::{BuildError, MachineConfig, UnhandledPolicy};
use crate::core::{
    Naming, StateHistory, StateId, StateTree, StructureError, Trigger, TransitionRecord,
};
use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::rc::Rc;
use tracing::{debug, trace, warn};
use uuid::Uuid;

/// Observer notified after the current state changes.
pub type TransitionObserver = Rc<dyn Fn(&StateMachine, &Transition)>;

/// Handler invoked for triggers with no permitted transition.
pub type UnhandledHandler = Rc<dyn Fn(&StateMachine, StateId, &Trigger)>;

const START_TRIGGER_LABEL: &str = "start_composite_state";

/// Trigger-driven machine owning states, transition table and deferred queue.
///
/// Firing is synchronous: the exit actions of the current state run, the
/// current state is updated, observers are notified and the entry actions of
/// the new state run, all before [`fire`](Self::fire) returns. Callbacks get a
/// [`Dispatch`] and can only *defer* further triggers; the caller drains them
/// with [`run_deferred`](Self::run_deferred).
///
/// # Example
///
/// ```rust
/// use nested_states::builder::StateMachineBuilder;
/// use nested_states::engine::DeferredTriggers;
///
/// let mut machine = StateMachineBuilder::new().initial("idle").build().unwrap();
/// let idle = machine.initial_state();
/// let busy = machine.add_state("busy", None).unwrap();
/// let done = machine.add_state("done", None).unwrap();
/// let start = machine.trigger("start");
/// let finish = machine.trigger("finish");
///
/// machine.configure(idle).permit(&start, busy);
/// machine.configure(busy).permit(&finish, done).on_entry({
///     let finish = finish.clone();
///     move |ctx, _transition| ctx.push_deferred_trigger(finish.clone())
/// });
///
/// let drained = machine.fire_and_drain(&start).unwrap();
///
/// assert_eq!(drained, 1);
/// assert_eq!(machine.current_state(), done);
/// ```
pub struct StateMachine {
    id: Uuid,
    config: MachineConfig,
    naming: Naming,
    tree: StateTree,
    table: BTreeMap<StateId, StateRepresentation>,
    initial: StateId,
    current: StateId,
    deferred: DeferredQueue,
    history: StateHistory,
    observers: Vec<TransitionObserver>,
    unhandled: Option<UnhandledHandler>,
    start_trigger: Trigger,
}

impl StateMachine {
    /// Create a machine with default settings, starting in a new root state.
    pub fn new(initial: &str) -> Self {
        Self::assemble(initial, MachineConfig::default())
    }

    /// Create a machine starting in a new root state labelled `initial`.
    ///
    /// Fails with [`BuildError::InvalidConfig`] when `config` does not validate.
    pub fn with_config(initial: &str, config: MachineConfig) -> Result<Self, BuildError> {
        config.validate()?;
        Ok(Self::assemble(initial, config))
    }

    fn assemble(initial: &str, config: MachineConfig) -> Self {
        let mut naming = Naming::new();
        let mut tree = StateTree::new();
        let initial_id = tree.add_root(naming.identity(initial));
        let start_trigger = Trigger::new(naming.identity(START_TRIGGER_LABEL));
        let history = match config.history_limit {
            Some(limit) => StateHistory::bounded(limit),
            None => StateHistory::new(),
        };
        let id = Uuid::new_v4();
        debug!(machine = %id, initial = tree.name(initial_id), "created state machine");
        Self {
            id,
            config,
            naming,
            tree,
            table: BTreeMap::new(),
            initial: initial_id,
            current: initial_id,
            deferred: DeferredQueue::new(),
            history,
            observers: Vec::new(),
            unhandled: None,
            start_trigger,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    pub fn tree(&self) -> &StateTree {
        &self.tree
    }

    /// Add a state, appending it to `parent`'s children when given.
    pub fn add_state(
        &mut self,
        label: &str,
        parent: Option<StateId>,
    ) -> Result<StateId, StructureError> {
        let id = self.tree.add(self.naming.identity(label), parent)?;
        trace!(machine = %self.id, state = self.tree.name(id), "added state");
        Ok(id)
    }

    /// Allocate a new trigger identity.
    pub fn trigger(&mut self, label: &str) -> Trigger {
        Trigger::new(self.naming.identity(label))
    }

    pub fn state_name(&self, state: StateId) -> &str {
        self.tree.name(state)
    }

    pub fn initial_state(&self) -> StateId {
        self.initial
    }

    pub fn current_state(&self) -> StateId {
        self.current
    }

    /// Start (or continue) configuring `state`.
    pub fn configure(&mut self, state: StateId) -> StateConfiguration<'_> {
        StateConfiguration::new(state, &mut self.table)
    }

    /// Superstate declared through `sub_state_of`, if any.
    pub fn superstate(&self, state: StateId) -> Option<StateId> {
        self.table.get(&state).and_then(|r| r.superstate)
    }

    /// `state` followed by its chain of superstates.
    fn lineage(&self, state: StateId) -> Vec<StateId> {
        let mut chain = vec![state];
        let mut cursor = self.superstate(state);
        while let Some(next) = cursor {
            if chain.contains(&next) {
                break;
            }
            chain.push(next);
            cursor = self.superstate(next);
        }
        chain
    }

    /// Whether `other` is `state` or nested somewhere inside it.
    fn includes(&self, state: StateId, other: StateId) -> bool {
        self.lineage(other).contains(&state)
    }

    /// Whether the current state is `state` or one of its sub-states.
    pub fn is_in_state(&self, state: StateId) -> bool {
        self.includes(state, self.current)
    }

    /// Find the destination for `trigger`, searching superstates outward.
    fn resolve(&self, state: StateId, trigger: &Trigger) -> Result<Option<StateId>, EngineError> {
        for level in self.lineage(state) {
            let Some(behaviours) = self
                .table
                .get(&level)
                .and_then(|r| r.behaviours.get(trigger))
            else {
                continue;
            };
            let passing: Vec<_> = behaviours.iter().filter(|b| b.permits()).collect();
            match passing.as_slice() {
                [] => continue,
                [only] => return Ok(Some(only.destination)),
                _ => {
                    return Err(EngineError::AmbiguousTransition {
                        state: self.state_name(level).to_string(),
                        trigger: trigger.to_string(),
                    })
                }
            }
        }
        Ok(None)
    }

    /// Whether `trigger` would cause a transition from the current state.
    pub fn can_fire(&self, trigger: &Trigger) -> bool {
        matches!(self.resolve(self.current, trigger), Ok(Some(_)))
    }

    /// Triggers that currently have a permitted transition.
    ///
    /// The internal composite start trigger is never listed.
    pub fn permitted_triggers(&self) -> Vec<Trigger> {
        let mut permitted = BTreeSet::new();
        for level in self.lineage(self.current) {
            if let Some(representation) = self.table.get(&level) {
                permitted.extend(
                    representation
                        .behaviours
                        .iter()
                        .filter(|(_, behaviours)| behaviours.iter().any(|b| b.permits()))
                        .map(|(trigger, _)| trigger.clone()),
                );
            }
        }
        permitted.remove(&self.start_trigger);
        permitted.into_iter().collect()
    }

    /// Register an observer called after every state change.
    pub fn on_transition<F>(&mut self, observer: F)
    where
        F: Fn(&StateMachine, &Transition) + 'static,
    {
        self.observers.push(Rc::new(observer));
    }

    /// Report unhandled triggers to `handler` instead of failing.
    pub fn on_unhandled_trigger<F>(&mut self, handler: F)
    where
        F: Fn(&StateMachine, StateId, &Trigger) + 'static,
    {
        self.unhandled = Some(Rc::new(handler));
        self.config.unhandled = UnhandledPolicy::Report;
    }

    /// Dispatch `trigger` synchronously.
    ///
    /// Leaves the current state unchanged when no transition is permitted;
    /// the configured [`UnhandledPolicy`] then decides between an error and
    /// a report.
    pub fn fire(&mut self, trigger: &Trigger) -> Result<(), EngineError> {
        let source = self.current;
        let Some(destination) = self.resolve(source, trigger)? else {
            return self.handle_unhandled(source, trigger);
        };
        debug!(
            machine = %self.id,
            source = self.state_name(source),
            trigger = %trigger,
            destination = self.state_name(destination),
            "firing"
        );

        let transition = Transition::new(source, trigger.clone(), destination);
        self.exit(source, &transition);
        self.current = destination;
        self.history.record(TransitionRecord {
            source,
            trigger: trigger.clone(),
            destination,
            timestamp: Utc::now(),
        });
        let observers = self.observers.clone();
        for observer in &observers {
            observer(self, &transition);
        }
        self.enter(destination, &transition);
        Ok(())
    }

    fn handle_unhandled(&mut self, state: StateId, trigger: &Trigger) -> Result<(), EngineError> {
        match self.config.unhandled {
            UnhandledPolicy::Fail => Err(EngineError::UnhandledTrigger {
                state: self.state_name(state).to_string(),
                trigger: trigger.to_string(),
            }),
            UnhandledPolicy::Report => {
                warn!(
                    machine = %self.id,
                    state = self.state_name(state),
                    trigger = %trigger,
                    "ignoring unhandled trigger"
                );
                if let Some(handler) = self.unhandled.clone() {
                    handler(self, state, trigger);
                }
                Ok(())
            }
        }
    }

    fn exit(&mut self, state: StateId, transition: &Transition) {
        if transition.is_reentry() {
            self.run_exit_actions(state, transition);
            return;
        }
        if self.includes(state, transition.destination()) {
            return;
        }
        self.run_exit_actions(state, transition);
        if let Some(superstate) = self.superstate(state) {
            self.exit(superstate, transition);
        }
    }

    fn enter(&mut self, state: StateId, transition: &Transition) {
        if transition.is_reentry() {
            self.run_entry_actions(state, transition);
            return;
        }
        if self.includes(state, transition.source()) {
            return;
        }
        if let Some(superstate) = self.superstate(state) {
            self.enter(superstate, transition);
        }
        self.run_entry_actions(state, transition);
    }

    fn run_entry_actions(&mut self, state: StateId, transition: &Transition) {
        let actions: Vec<Action> = self
            .table
            .get(&state)
            .map(|r| {
                r.entry_actions
                    .iter()
                    .filter(|a| a.from.as_ref().map_or(true, |t| t == transition.trigger()))
                    .map(|a| Rc::clone(&a.action))
                    .collect()
            })
            .unwrap_or_default();
        self.run_actions(actions, transition);
    }

    fn run_exit_actions(&mut self, state: StateId, transition: &Transition) {
        let actions: Vec<Action> = self
            .table
            .get(&state)
            .map(|r| r.exit_actions.clone())
            .unwrap_or_default();
        self.run_actions(actions, transition);
    }

    fn run_actions(&mut self, actions: Vec<Action>, transition: &Transition) {
        let mut dispatch = Dispatch::new(self);
        for action in actions {
            action(&mut dispatch, transition);
        }
    }

    /// Remove the oldest deferred trigger without firing it.
    pub fn pop_deferred_trigger(&mut self) -> Option<Trigger> {
        let trigger = self.deferred.pop();
        if let Some(trigger) = &trigger {
            trace!(machine = %self.id, %trigger, "popped deferred trigger");
        }
        trigger
    }

    /// Triggers waiting to be fired, oldest first.
    pub fn deferred_triggers(&self) -> impl Iterator<Item = &Trigger> {
        self.deferred.iter()
    }

    pub fn has_deferred_triggers(&self) -> bool {
        !self.deferred.is_empty()
    }

    /// Driving loop: pop and fire deferred triggers until the queue is empty.
    ///
    /// Returns the number of triggers fired. Stops with
    /// [`EngineError::DrainLimitExceeded`] after `max_drain_steps` firings so a
    /// cycle of self-scheduling callbacks cannot spin forever; the remaining
    /// triggers stay queued.
    pub fn run_deferred(&mut self) -> Result<usize, EngineError> {
        let limit = self.config.max_drain_steps;
        let mut fired = 0;
        while !self.deferred.is_empty() {
            if fired >= limit {
                return Err(EngineError::DrainLimitExceeded {
                    limit,
                    pending: self.deferred.len(),
                });
            }
            if let Some(trigger) = self.pop_deferred_trigger() {
                self.fire(&trigger)?;
                fired += 1;
            }
        }
        Ok(fired)
    }

    /// Fire `trigger`, then drain the deferred queue.
    pub fn fire_and_drain(&mut self, trigger: &Trigger) -> Result<usize, EngineError> {
        self.fire(trigger)?;
        self.run_deferred()
    }

    pub fn history(&self) -> &StateHistory {
        &self.history
    }

    /// Capture current state, pending triggers and history for inspection.
    pub fn snapshot(&self) -> MachineSnapshot {
        MachineSnapshot {
            machine: self.id,
            taken_at: Utc::now(),
            current: self.state_name(self.current).to_string(),
            active: self
                .lineage(self.current)
                .into_iter()
                .map(|state| self.state_name(state).to_string())
                .collect(),
            pending: self.deferred.iter().cloned().collect(),
            history: self.history.clone(),
        }
    }

    pub(crate) fn start_trigger(&self) -> &Trigger {
        &self.start_trigger
    }
}

impl DeferredTriggers for StateMachine {
    fn push_deferred_trigger(&mut self, trigger: Trigger) {
        trace!(machine = %self.id, %trigger, "deferred trigger");
        self.deferred.push(trigger);
    }
}

impl fmt::Display for StateMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StateMachine {{ state: {}, permitted: [", self.state_name(self.current))?;
        for (index, trigger) in self.permitted_triggers().iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{trigger}")?;
        }
        f.write_str("] }")
    }
}

impl fmt::Debug for StateMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachine")
            .field("id", &self.id)
            .field("current", &self.state_name(self.current))
            .field("states", &self.tree.len())
            .field("deferred", &self.deferred.len())
            .finish()
    }
}
