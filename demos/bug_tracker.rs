//! Bug Tracker
//!
//! A bug moves between open, assigned, deferred, resolved and closed.
//! Assigned is a sub-state of open, and re-assigning an assigned bug
//! re-enters the assigned state so the new owner gets notified.
//!
//! Key concepts:
//! - `sub_state_of` on a flat machine, without composites
//! - `permit_reentry` and `on_entry_from` a specific trigger
//! - Trigger arguments carried in shared state next to the machine
//!
//! Run with: RUST_LOG=info cargo run --example bug_tracker

use nested_states::builder::StateMachineBuilder;
use nested_states::core::{StateId, Trigger};
use nested_states::engine::{EngineError, StateMachine};
use std::cell::RefCell;
use std::error::Error;
use std::rc::Rc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Default)]
struct Inbox {
    assignee: Option<String>,
    requested: Option<String>,
}

impl Inbox {
    fn send(&self, title: &str, message: &str) {
        let to = self.assignee.as_deref().unwrap_or("nobody");
        info!(to, re = title, message, "email");
    }
}

struct Triggers {
    assign: Trigger,
    defer: Trigger,
    resolve: Trigger,
    close: Trigger,
    reopen: Trigger,
}

struct Bug {
    title: String,
    machine: StateMachine,
    inbox: Rc<RefCell<Inbox>>,
    triggers: Triggers,
    open: StateId,
}

impl Bug {
    fn new(title: &str) -> Result<Self, Box<dyn Error>> {
        let mut machine = StateMachineBuilder::new().initial("open").build()?;
        let open = machine.initial_state();
        let assigned = machine.add_state("assigned", None)?;
        let deferred = machine.add_state("deferred", None)?;
        let resolved = machine.add_state("resolved", None)?;
        let closed = machine.add_state("closed", None)?;
        let triggers = Triggers {
            assign: machine.trigger("assign"),
            defer: machine.trigger("defer"),
            resolve: machine.trigger("resolve"),
            close: machine.trigger("close"),
            reopen: machine.trigger("open"),
        };
        let inbox = Rc::new(RefCell::new(Inbox::default()));
        let title = title.to_string();

        machine.configure(open).permit(&triggers.assign, assigned);

        {
            let (entry_inbox, exit_inbox) = (Rc::clone(&inbox), Rc::clone(&inbox));
            let (entry_title, exit_title) = (title.clone(), title.clone());
            machine
                .configure(assigned)
                .sub_state_of(open)
                .on_entry_from(&triggers.assign, move |_, _| {
                    let mut inbox = entry_inbox.borrow_mut();
                    let Some(requested) = inbox.requested.take() else {
                        return;
                    };
                    if inbox.assignee.as_ref().is_some_and(|current| current != &requested) {
                        inbox.send(&entry_title, "Don't forget to help the new guy.");
                    }
                    inbox.assignee = Some(requested);
                    inbox.send(&entry_title, "You own it.");
                })
                .permit_reentry(&triggers.assign)
                .permit(&triggers.resolve, resolved)
                .permit(&triggers.close, closed)
                .permit(&triggers.defer, deferred)
                .on_exit(move |_, _| exit_inbox.borrow().send(&exit_title, "You're off the hook."));
        }

        {
            let inbox = Rc::clone(&inbox);
            machine
                .configure(deferred)
                .on_entry(move |_, _| inbox.borrow_mut().assignee = None)
                .permit(&triggers.assign, assigned);
        }

        {
            let (inbox, title) = (Rc::clone(&inbox), title.clone());
            machine
                .configure(resolved)
                .on_entry(move |_, _| {
                    let mut inbox = inbox.borrow_mut();
                    if let Some(requested) = inbox.requested.take() {
                        inbox.assignee = Some(requested);
                    }
                    inbox.send(&title, "It's fixed and ready for test.");
                })
                .permit(&triggers.close, closed)
                .permit(&triggers.reopen, open);
        }

        machine.configure(closed).permit(&triggers.reopen, open);

        Ok(Self {
            title,
            machine,
            inbox,
            triggers,
            open,
        })
    }

    fn assign(&mut self, assignee: &str) -> Result<(), EngineError> {
        self.inbox.borrow_mut().requested = Some(assignee.to_string());
        self.machine.fire(&self.triggers.assign)
    }

    fn can_assign(&self) -> bool {
        self.machine.can_fire(&self.triggers.assign)
    }

    fn defer(&mut self) -> Result<(), EngineError> {
        self.machine.fire(&self.triggers.defer)
    }

    fn resolve(&mut self, assignee: &str) -> Result<(), EngineError> {
        self.inbox.borrow_mut().requested = Some(assignee.to_string());
        self.machine.fire(&self.triggers.resolve)
    }

    fn close(&mut self) -> Result<(), EngineError> {
        self.machine.fire(&self.triggers.close)
    }

    fn reopen(&mut self) -> Result<(), EngineError> {
        self.machine.fire(&self.triggers.reopen)
    }

    fn report(&self) {
        info!(
            bug = %self.title,
            state = self.machine.state_name(self.machine.current_state()),
            still_open = self.machine.is_in_state(self.open),
            can_assign = self.can_assign(),
            "status"
        );
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut bug = Bug::new("Incorrect stock count")?;

    bug.assign("Joe")?;
    bug.report();
    bug.defer()?;
    bug.report();
    bug.assign("Harry")?;
    bug.assign("Fred")?;
    bug.report();
    bug.resolve("Fred")?;
    bug.close()?;
    bug.report();
    bug.reopen()?;
    bug.report();

    info!("{}", bug.machine);
    Ok(())
}
