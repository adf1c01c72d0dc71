//! Description of a single dispatch.

use crate::core::{StateId, Trigger};
use serde::{Deserialize, Serialize};

/// Immutable `(source, trigger, destination)` triple handed to callbacks.
///
/// A transition is a value describing one dispatch, not a stored entity of
/// the transition table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    source: StateId,
    trigger: Trigger,
    destination: StateId,
}

impl Transition {
    pub fn new(source: StateId, trigger: Trigger, destination: StateId) -> Self {
        Self {
            source,
            trigger,
            destination,
        }
    }

    pub fn source(&self) -> StateId {
        self.source
    }

    pub fn trigger(&self) -> &Trigger {
        &self.trigger
    }

    pub fn destination(&self) -> StateId {
        self.destination
    }

    /// A reentry leaves and re-enters the same state.
    pub fn is_reentry(&self) -> bool {
        self.source == self.destination
    }
}
