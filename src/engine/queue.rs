//! FIFO of triggers scheduled from inside callbacks.
//!
//! Entry and exit callbacks run while the machine is still dispatching, so
//! they may not fire. They append here instead, and the driving loop pops
//! and fires the queued triggers once the current dispatch has returned.

use crate::core::Trigger;
use std::collections::VecDeque;

/// Anything that accepts deferred triggers.
///
/// Implemented by the machine itself (for use by the driving code) and by
/// [`Dispatch`](super::Dispatch) (for use inside callbacks).
pub trait DeferredTriggers {
    fn push_deferred_trigger(&mut self, trigger: Trigger);
}

/// Pending triggers in the order they were deferred.
#[derive(Clone, Debug, Default)]
pub struct DeferredQueue {
    pending: VecDeque<Trigger>,
}

impl DeferredQueue {
    pub fn new() -> Self {
        Self {
            pending: VecDeque::new(),
        }
    }

    pub fn push(&mut self, trigger: Trigger) {
        self.pending.push_back(trigger);
    }

    pub fn pop(&mut self) -> Option<Trigger> {
        self.pending.pop_front()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Trigger> {
        self.pending.iter()
    }
}

impl DeferredTriggers for DeferredQueue {
    fn push_deferred_trigger(&mut self, trigger: Trigger) {
        self.push(trigger);
    }
}
