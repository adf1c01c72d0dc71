//! Property-based tests for identities, the deferred queue and composites.
//!
//! These tests use proptest to verify properties hold across
//! many randomly generated inputs.

use nested_states::composite::{Composite, CompositeState};
use nested_states::core::{Naming, StateId, StructureError, Trigger};
use nested_states::engine::{DeferredQueue, DeferredTriggers, StateMachine};
use proptest::prelude::*;
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

/// One level of a nested composite chain.
struct Level {
    state: CompositeState,
    first: StateId,
    done: Trigger,
    failed: Trigger,
}

impl Composite for Level {
    fn initial_state(&self) -> StateId {
        self.first
    }

    fn done_trigger(&self) -> &Trigger {
        &self.done
    }

    fn failed_trigger(&self) -> &Trigger {
        &self.failed
    }
}

/// Build `depth` composites nested in each other; the innermost has one leaf
/// that signals done on entry. With `shared`, every level uses the same done
/// trigger; otherwise each level has its own and forwards the inner one.
fn nest(
    machine: &mut StateMachine,
    parent: Option<StateId>,
    depth: usize,
    shared: Option<&Trigger>,
    exits: &Rc<RefCell<Vec<StateId>>>,
) -> Result<Rc<Level>, StructureError> {
    CompositeState::new(machine, &format!("level{depth}"), parent, |machine, state| {
        let done = match shared {
            Some(trigger) => trigger.clone(),
            None => machine.trigger(&format!("level{depth}_done")),
        };
        let failed = machine.trigger(&format!("level{depth}_failed"));

        let first = if depth == 1 {
            let leaf = machine.add_state("leaf", Some(state.id()))?;
            let (handle, signal) = (state.clone(), done.clone());
            state.add_callback_on_entry(machine, leaf, move |ctx, _| {
                handle.deferred_fire(ctx, &signal);
            })?;
            state.add_transition_to_parent_state(machine, leaf, &done)?;
            leaf
        } else {
            let inner = nest(machine, Some(state.id()), depth - 1, shared, exits)?;
            if shared.is_none() {
                state.add_transition_to_parent_state(machine, inner.state.id(), &inner.done)?;
            }
            inner.state.id()
        };

        let (log, id) = (Rc::clone(exits), state.id());
        machine
            .configure(id)
            .on_exit(move |_, _| log.borrow_mut().push(id));

        Ok(Level {
            state: state.clone(),
            first,
            done,
            failed,
        })
    })
}

struct Chain {
    machine: StateMachine,
    go: Trigger,
    finished: StateId,
    levels: Vec<StateId>,
    exits: Rc<RefCell<Vec<StateId>>>,
}

fn chain(depth: usize, shared: bool) -> Chain {
    let mut machine = StateMachine::new("idle");
    let idle = machine.initial_state();
    let finished = machine.add_state("final", None).unwrap();
    let go = machine.trigger("go");
    let shared = shared.then(|| machine.trigger("done"));
    let exits = Rc::new(RefCell::new(Vec::new()));

    let root = nest(&mut machine, None, depth, shared.as_ref(), &exits).unwrap();
    machine.configure(idle).permit(&go, root.state.id());
    machine.configure(root.state.id()).permit(&root.done, finished);

    let mut levels = vec![root.state.id()];
    while let Some(&last) = levels.last() {
        match machine.tree().children(last).first() {
            Some(&next) if !machine.tree().children(next).is_empty() => levels.push(next),
            _ => break,
        }
    }

    Chain {
        machine,
        go,
        finished,
        levels,
        exits,
    }
}

proptest! {
    #[test]
    fn identities_never_collide(labels in prop::collection::vec("[a-z]{1,6}", 1..20)) {
        let mut naming = Naming::new();
        let identities: Vec<_> = labels.iter().map(|label| naming.identity(label)).collect();

        let distinct: HashSet<_> = identities.iter().collect();
        prop_assert_eq!(distinct.len(), labels.len());
        for (index, (identity, label)) in identities.iter().zip(&labels).enumerate() {
            prop_assert_eq!(identity.label(), label.as_str());
            prop_assert_eq!(identity.ordinal(), Some(index));
        }
        prop_assert_eq!(naming.issued(), labels.len());
    }

    #[test]
    fn same_label_identities_differ(label in "[a-z_]{1,12}") {
        let mut naming = Naming::new();
        let first = naming.identity(&label);
        let second = naming.identity(&label);

        prop_assert_ne!(&first, &second);
        prop_assert_eq!(first.label(), second.label());
    }

    #[test]
    fn deferred_queue_is_fifo(picks in prop::collection::vec(0..5usize, 0..30)) {
        let mut naming = Naming::new();
        let triggers: Vec<_> = (0..5).map(|i| Trigger::new(naming.identity(&format!("t{i}")))).collect();
        let mut queue = DeferredQueue::new();

        for &pick in &picks {
            queue.push_deferred_trigger(triggers[pick].clone());
        }
        let mut drained = Vec::new();
        while let Some(trigger) = queue.pop() {
            drained.push(trigger);
        }

        let expected: Vec<_> = picks.iter().map(|&pick| triggers[pick].clone()).collect();
        prop_assert_eq!(drained, expected);
    }

    #[test]
    fn driving_loop_fires_in_deferred_order(picks in prop::collection::vec(0..4usize, 1..20)) {
        let mut machine = StateMachine::new("hub");
        let hub = machine.initial_state();
        let triggers: Vec<_> = (0..4).map(|i| machine.trigger(&format!("t{i}"))).collect();
        for trigger in &triggers {
            machine.configure(hub).permit_reentry(trigger);
        }

        for &pick in &picks {
            machine.push_deferred_trigger(triggers[pick].clone());
        }
        let fired = machine.run_deferred().unwrap();

        prop_assert_eq!(fired, picks.len());
        let expected: Vec<_> = picks.iter().map(|&pick| &triggers[pick]).collect();
        prop_assert_eq!(machine.history().triggers(), expected);
    }

    #[test]
    fn only_completion_triggers_are_doubled(picks in prop::collection::vec(0..3usize, 1..10)) {
        let mut machine = StateMachine::new("idle");
        let other = machine.trigger("other");
        let level = nest(&mut machine, None, 1, None, &Rc::new(RefCell::new(Vec::new()))).unwrap();
        let choices = [level.done.clone(), level.failed.clone(), other];
        let mut queue = DeferredQueue::new();

        let mut expected = 0;
        for &pick in &picks {
            let before = queue.len();
            level.state.deferred_fire(&mut queue, &choices[pick]);
            let added = queue.len() - before;
            prop_assert_eq!(added, if pick < 2 { 2 } else { 1 });
            expected += added;
        }
        prop_assert_eq!(queue.len(), expected);
    }

    #[test]
    fn non_children_are_rejected(children in 1..5usize, outsiders in 1..5usize, pick in 0..5usize) {
        let mut machine = StateMachine::new("idle");
        let outside: Vec<_> = (0..outsiders)
            .map(|i| machine.add_state(&format!("outside{i}"), None).unwrap())
            .collect();
        let go = machine.trigger("go");
        let level = CompositeState::new(&mut machine, "composite", None, |machine, state| {
            let ids = (0..children)
                .map(|i| machine.add_state(&format!("child{i}"), Some(state.id())))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Level {
                state: state.clone(),
                first: ids[0],
                done: machine.trigger("done"),
                failed: machine.trigger("failed"),
            })
        })
        .unwrap();
        let stranger = outside[pick % outsiders];
        let child = machine.tree().children(level.state.id())[pick % children];
        let handle = level.state.clone();

        prop_assert!(matches!(
            handle.add_transition(&mut machine, stranger, &go, child),
            Err(StructureError::SourceNotChild { .. })
        ), "transition from a non-child was accepted");
        prop_assert!(matches!(
            handle.add_transition(&mut machine, child, &go, stranger),
            Err(StructureError::DestinationNotChild { .. })
        ), "transition to a non-child was accepted");
        prop_assert!(matches!(
            handle.add_callback_on_entry(&mut machine, stranger, |_, _| {}),
            Err(StructureError::CallbackOnNonChild { .. })
        ), "entry callback on a non-child was accepted");
        prop_assert!(matches!(
            handle.add_callback_on_exit(&mut machine, handle.id(), |_, _| {}),
            Err(StructureError::CallbackOnNonChild { .. })
        ), "exit callback on the composite itself was accepted");
        prop_assert!(handle.add_transition(&mut machine, child, &go, handle.id()).is_ok());
    }

    #[test]
    fn shared_done_trigger_unwinds_any_depth(depth in 1..7usize) {
        let mut chain = chain(depth, true);

        chain.machine.fire_and_drain(&chain.go).unwrap();

        prop_assert_eq!(chain.machine.current_state(), chain.finished);
        prop_assert_eq!(chain.levels.len(), depth);
        let mut exited = chain.exits.borrow().clone();
        exited.sort();
        let mut levels = chain.levels.clone();
        levels.sort();
        prop_assert_eq!(exited, levels);
    }

    #[test]
    fn distinct_done_triggers_lift_one_level(depth in 1..7usize) {
        let mut chain = chain(depth, false);

        chain.machine.fire_and_drain(&chain.go).unwrap();

        if depth == 1 {
            prop_assert_eq!(chain.machine.current_state(), chain.finished);
            prop_assert_eq!(chain.exits.borrow().len(), 1);
        } else {
            // The innermost composite hands over to its parent and stops there
            let innermost = chain.levels[depth - 1];
            prop_assert_eq!(chain.machine.current_state(), chain.levels[depth - 2]);
            prop_assert_eq!(chain.exits.borrow().clone(), vec![innermost]);
        }
        prop_assert!(!chain.machine.has_deferred_triggers());
    }
}
