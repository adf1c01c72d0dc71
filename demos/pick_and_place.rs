//! Pick and Place
//!
//! A robot cell that detects a part, picks it and places it. Picking and
//! placing are composite states nested inside the pick-and-place composite,
//! each with its own steps and done/failed triggers.
//!
//! Key concepts:
//! - Composites nested two levels deep
//! - Step callbacks that defer the next trigger instead of firing it
//! - Completion propagated to the enclosing composite through exit callbacks
//! - A hand-written driving loop that pops deferred triggers
//!
//! Run with: RUST_LOG=info cargo run --example pick_and_place

use nested_states::builder::StateMachineBuilder;
use nested_states::composite::{Composite, CompositeState};
use nested_states::core::{StateId, StructureError, Trigger};
use nested_states::engine::{Dispatch, StateMachine, Transition};
use std::error::Error;
use std::rc::Rc;
use stillwater::validation::Validation;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Which step, if any, should report a failure.
#[derive(Clone, Copy, Debug, Default)]
struct Faults {
    grasp: bool,
    drop: bool,
}

/// Entry callback that logs `step` and defers `trigger` through `state`.
fn step(
    state: &CompositeState,
    name: &'static str,
    trigger: &Trigger,
) -> impl Fn(&mut Dispatch<'_>, &Transition) + 'static {
    let state = state.clone();
    let trigger = trigger.clone();
    move |ctx, _transition| {
        info!(step = name, next = %trigger, "executing");
        state.deferred_fire(ctx, &trigger);
    }
}

struct Picking {
    state: CompositeState,
    approaching: StateId,
    done: Trigger,
    failed: Trigger,
}

impl Composite for Picking {
    fn initial_state(&self) -> StateId {
        self.approaching
    }

    fn done_trigger(&self) -> &Trigger {
        &self.done
    }

    fn failed_trigger(&self) -> &Trigger {
        &self.failed
    }
}

impl Picking {
    fn assemble(
        machine: &mut StateMachine,
        parent: StateId,
        faults: Faults,
    ) -> Result<Rc<Self>, StructureError> {
        CompositeState::new(machine, "picking", Some(parent), |machine, state| {
            let approaching = machine.add_state("approaching", Some(state.id()))?;
            let grasping = machine.add_state("grasping", Some(state.id()))?;
            let retracting = machine.add_state("retracting", Some(state.id()))?;

            let approached = machine.trigger("approached");
            let grasp_successful = machine.trigger("grasp_successful");
            let failed = machine.trigger("picking_failure");
            let done = machine.trigger("picking_done");

            state.add_callback_on_entry(
                machine,
                approaching,
                step(state, "picking approaching", &approached),
            )?;
            state.add_transition(machine, approaching, &approached, grasping)?;
            state.add_transition(machine, approaching, &failed, state.id())?;

            let grasped = if faults.grasp { &failed } else { &grasp_successful };
            state.add_callback_on_entry(machine, grasping, step(state, "picking grasping", grasped))?;
            state.add_transition(machine, grasping, &grasp_successful, retracting)?;
            state.add_transition(machine, grasping, &failed, state.id())?;

            state.add_callback_on_entry(
                machine,
                retracting,
                step(state, "picking retracting", &done),
            )?;
            state.add_transition_to_parent_state(machine, retracting, &done)?;
            state.add_transition_to_parent_state(machine, retracting, &failed)?;

            Ok(Picking {
                state: state.clone(),
                approaching,
                done,
                failed,
            })
        })
    }
}

struct Placing {
    state: CompositeState,
    approaching: StateId,
    done: Trigger,
    failed: Trigger,
}

impl Composite for Placing {
    fn initial_state(&self) -> StateId {
        self.approaching
    }

    fn done_trigger(&self) -> &Trigger {
        &self.done
    }

    fn failed_trigger(&self) -> &Trigger {
        &self.failed
    }
}

impl Placing {
    fn assemble(
        machine: &mut StateMachine,
        parent: StateId,
        faults: Faults,
    ) -> Result<Rc<Self>, StructureError> {
        CompositeState::new(machine, "placing", Some(parent), |machine, state| {
            let approaching = machine.add_state("approaching", Some(state.id()))?;
            let dropping = machine.add_state("dropping", Some(state.id()))?;
            let retracting = machine.add_state("retracting", Some(state.id()))?;
            let action_failed = machine.add_state("action_failed", Some(state.id()))?;

            let approached = machine.trigger("approached");
            let drop_successful = machine.trigger("drop_successful");
            let failed = machine.trigger("placing_failure");
            let done = machine.trigger("placing_done");

            state.add_callback_on_entry(
                machine,
                approaching,
                step(state, "placing approaching", &approached),
            )?;
            state.add_transition(machine, approaching, &approached, dropping)?;
            state.add_transition(machine, approaching, &failed, action_failed)?;

            let dropped = if faults.drop { &failed } else { &drop_successful };
            state.add_callback_on_entry(machine, dropping, step(state, "placing dropping", dropped))?;
            state.add_transition(machine, dropping, &drop_successful, retracting)?;
            state.add_transition(machine, dropping, &failed, action_failed)?;

            state.add_callback_on_entry(
                machine,
                retracting,
                step(state, "placing retracting", &done),
            )?;
            state.add_transition_to_parent_state(machine, retracting, &failed)?;
            state.add_transition_to_parent_state(machine, retracting, &done)?;

            state.add_callback_on_entry(
                machine,
                action_failed,
                step(state, "placing recovering", &failed),
            )?;
            state.add_transition_to_parent_state(machine, action_failed, &failed)?;

            Ok(Placing {
                state: state.clone(),
                approaching,
                done,
                failed,
            })
        })
    }
}

struct PickAndPlace {
    state: CompositeState,
    detecting_part: StateId,
    done: Trigger,
    failed: Trigger,
}

impl Composite for PickAndPlace {
    fn initial_state(&self) -> StateId {
        self.detecting_part
    }

    fn done_trigger(&self) -> &Trigger {
        &self.done
    }

    fn failed_trigger(&self) -> &Trigger {
        &self.failed
    }
}

impl PickAndPlace {
    fn assemble(machine: &mut StateMachine, faults: Faults) -> Result<Rc<Self>, StructureError> {
        CompositeState::new(machine, "pick_and_place", None, |machine, state| {
            let detecting_part = machine.add_state("detecting_part", Some(state.id()))?;
            let picking = Picking::assemble(machine, state.id(), faults)?;
            let placing = Placing::assemble(machine, state.id(), faults)?;

            let part_found = machine.trigger("part_found");
            let failed = machine.trigger("pick_and_place_failure");
            let done = machine.trigger("pick_and_place_done");

            state.add_callback_on_entry(
                machine,
                detecting_part,
                step(state, "detecting part", &part_found),
            )?;
            state.add_transition(machine, detecting_part, &part_found, picking.state.id())?;

            state.add_transition(machine, picking.state.id(), &picking.done, placing.state.id())?;
            state.add_transition_to_parent_state(machine, picking.state.id(), &picking.failed)?;
            state.add_transition_to_parent_state(machine, placing.state.id(), &placing.done)?;
            state.add_transition_to_parent_state(machine, placing.state.id(), &placing.failed)?;

            // A nested composite leaving for this one decides how we complete
            for (child, child_done, child_failed) in [
                (picking.state.id(), picking.done.clone(), picking.failed.clone()),
                (placing.state.id(), placing.done.clone(), placing.failed.clone()),
            ] {
                let outcome = (state.clone(), done.clone(), failed.clone());
                state.add_callback_on_exit(machine, child, move |ctx, transition| {
                    let (state, done, failed) = &outcome;
                    if transition.destination() != state.id() {
                        return;
                    }
                    if transition.trigger() == &child_done {
                        state.deferred_fire(ctx, done);
                    } else if transition.trigger() == &child_failed {
                        state.deferred_fire(ctx, failed);
                    }
                })?;
            }

            Ok(PickAndPlace {
                state: state.clone(),
                detecting_part,
                done,
                failed,
            })
        })
    }
}

fn run(faults: Faults) -> Result<(), Box<dyn Error>> {
    let mut machine = StateMachineBuilder::new().initial("idle").build()?;
    let idle = machine.initial_state();
    let finished = machine.add_state("DONE", None)?;
    let aborted = machine.add_state("FAILED", None)?;
    let start = machine.trigger("start");

    machine.on_transition(|machine, transition| {
        info!(
            from = machine.state_name(transition.source()),
            to = machine.state_name(transition.destination()),
            via = %transition.trigger(),
            "transition"
        );
    });
    machine.on_unhandled_trigger(|machine, state, trigger| {
        info!(state = machine.state_name(state), %trigger, "ignored unhandled trigger");
    });

    let pick_and_place = PickAndPlace::assemble(&mut machine, faults)?;
    if let Validation::Failure(errors) = pick_and_place.state.validate(&machine) {
        let errors: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        return Err(format!("invalid hierarchy: {}", errors.join("; ")).into());
    }

    machine.configure(idle).permit(&start, pick_and_place.state.id());
    machine
        .configure(pick_and_place.state.id())
        .permit(&pick_and_place.done, finished)
        .permit(&pick_and_place.failed, aborted);

    machine.fire(&start)?;
    while let Some(trigger) = machine.pop_deferred_trigger() {
        machine.fire(&trigger)?;
        info!("{machine}");
    }

    info!(
        final_state = machine.state_name(machine.current_state()),
        transitions = machine.history().len(),
        ?faults,
        "run finished"
    );
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    run(Faults::default())?;
    run(Faults {
        grasp: true,
        ..Faults::default()
    })?;
    run(Faults {
        drop: true,
        ..Faults::default()
    })?;
    Ok(())
}
