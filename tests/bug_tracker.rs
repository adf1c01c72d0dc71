//! Flat-machine workflow with a sub-state and reentrant assignment.

use nested_states::builder::StateMachineBuilder;
use nested_states::core::{StateId, Trigger};
use nested_states::engine::{EngineError, StateMachine};
use std::cell::RefCell;
use std::rc::Rc;

struct Tracker {
    machine: StateMachine,
    open: StateId,
    assigned: StateId,
    deferred: StateId,
    closed: StateId,
    assign: Trigger,
    defer: Trigger,
    close: Trigger,
    reopen: Trigger,
    assignee: Rc<RefCell<Option<String>>>,
    requested: Rc<RefCell<Option<String>>>,
    mail: Rc<RefCell<Vec<String>>>,
}

impl Tracker {
    fn new() -> Self {
        let mut machine = StateMachineBuilder::new().initial("open").build().unwrap();
        let open = machine.initial_state();
        let assigned = machine.add_state("assigned", None).unwrap();
        let deferred = machine.add_state("deferred", None).unwrap();
        let closed = machine.add_state("closed", None).unwrap();
        let assign = machine.trigger("assign");
        let defer = machine.trigger("defer");
        let close = machine.trigger("close");
        let reopen = machine.trigger("open");
        let assignee: Rc<RefCell<Option<String>>> = Rc::new(RefCell::new(None));
        let requested: Rc<RefCell<Option<String>>> = Rc::new(RefCell::new(None));
        let mail = Rc::new(RefCell::new(Vec::new()));

        machine.configure(open).permit(&assign, assigned);
        {
            let (assignee, requested, mail) =
                (Rc::clone(&assignee), Rc::clone(&requested), Rc::clone(&mail));
            let (leaving, outbox) = (Rc::clone(&assignee), Rc::clone(&mail));
            machine
                .configure(assigned)
                .sub_state_of(open)
                .permit_reentry(&assign)
                .permit(&defer, deferred)
                .permit(&close, closed)
                .on_entry_from(&assign, move |_, _| {
                    let next = requested.borrow_mut().take();
                    *assignee.borrow_mut() = next.clone();
                    mail.borrow_mut()
                        .push(format!("{}: you own it", next.unwrap_or_default()));
                })
                .on_exit(move |_, _| {
                    let current = leaving.borrow().clone().unwrap_or_default();
                    outbox.borrow_mut().push(format!("{current}: off the hook"));
                });
        }
        {
            let assignee = Rc::clone(&assignee);
            machine
                .configure(deferred)
                .on_entry(move |_, _| *assignee.borrow_mut() = None)
                .permit(&assign, assigned);
        }
        machine.configure(closed).permit(&reopen, open);

        Self {
            machine,
            open,
            assigned,
            deferred,
            closed,
            assign,
            defer,
            close,
            reopen,
            assignee,
            requested,
            mail,
        }
    }

    fn assign(&mut self, who: &str) -> Result<(), EngineError> {
        *self.requested.borrow_mut() = Some(who.to_string());
        self.machine.fire(&self.assign)
    }
}

#[test]
fn reassigning_reenters_assigned() {
    let mut tracker = Tracker::new();

    tracker.assign("Joe").unwrap();
    let entered_once = tracker.machine.history().len();
    tracker.assign("Fred").unwrap();

    assert_eq!(tracker.machine.current_state(), tracker.assigned);
    assert_eq!(tracker.machine.history().len(), entered_once + 1);
    assert_eq!(tracker.assignee.borrow().as_deref(), Some("Fred"));
    assert_eq!(
        *tracker.mail.borrow(),
        vec!["Joe: you own it", "Joe: off the hook", "Fred: you own it"]
    );
}

#[test]
fn assigned_bug_is_still_open() {
    let mut tracker = Tracker::new();

    tracker.assign("Joe").unwrap();

    assert!(tracker.machine.is_in_state(tracker.open));
    assert!(tracker.machine.is_in_state(tracker.assigned));
    assert_eq!(tracker.machine.superstate(tracker.assigned), Some(tracker.open));
}

#[test]
fn deferring_clears_the_assignee() {
    let mut tracker = Tracker::new();

    tracker.assign("Joe").unwrap();
    tracker.machine.fire(&tracker.defer).unwrap();

    assert_eq!(tracker.machine.current_state(), tracker.deferred);
    assert!(!tracker.machine.is_in_state(tracker.open));
    assert!(tracker.assignee.borrow().is_none());
    assert!(tracker.machine.can_fire(&tracker.assign));
}

#[test]
fn closed_bug_cannot_be_assigned() {
    let mut tracker = Tracker::new();

    tracker.assign("Joe").unwrap();
    tracker.machine.fire(&tracker.close).unwrap();

    assert_eq!(tracker.machine.current_state(), tracker.closed);
    assert!(!tracker.machine.can_fire(&tracker.assign));
    assert!(matches!(
        tracker.assign("Harry"),
        Err(EngineError::UnhandledTrigger { .. })
    ));
    assert_eq!(tracker.machine.current_state(), tracker.closed);

    tracker.machine.fire(&tracker.reopen).unwrap();
    assert_eq!(tracker.machine.current_state(), tracker.open);
}
