//! Transition history tracking.
//!
//! Every fired transition is appended as a timestamped record. The log can
//! be bounded, in which case the oldest records are dropped first.

use super::identity::Trigger;
use super::tree::StateId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

/// Record of a single fired transition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// The state being left
    pub source: StateId,
    /// The trigger that caused the move
    pub trigger: Trigger,
    /// The state being entered
    pub destination: StateId,
    /// When the transition was dispatched
    pub timestamp: DateTime<Utc>,
}

/// Ordered log of fired transitions, oldest first.
///
/// # Example
///
/// ```rust
/// use nested_states::builder::StateMachineBuilder;
///
/// let mut machine = StateMachineBuilder::new().initial("idle").build().unwrap();
/// let idle = machine.initial_state();
/// let running = machine.add_state("running", None).unwrap();
/// let go = machine.trigger("go");
/// machine.configure(idle).permit(&go, running);
///
/// machine.fire(&go).unwrap();
///
/// assert_eq!(machine.history().path(), vec![idle, running]);
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StateHistory {
    records: VecDeque<TransitionRecord>,
    limit: Option<usize>,
}

impl StateHistory {
    /// Create an unbounded history.
    pub fn new() -> Self {
        Self {
            records: VecDeque::new(),
            limit: None,
        }
    }

    /// Create a history keeping at most `limit` records.
    pub fn bounded(limit: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(limit),
            limit: Some(limit),
        }
    }

    /// Append a record, dropping the oldest one when the bound is reached.
    pub fn record(&mut self, record: TransitionRecord) {
        if let Some(limit) = self.limit {
            if limit == 0 {
                return;
            }
            while self.records.len() >= limit {
                self.records.pop_front();
            }
        }
        self.records.push_back(record);
    }

    /// States traversed: the first source, then every destination.
    pub fn path(&self) -> Vec<StateId> {
        let mut path = Vec::with_capacity(self.records.len() + 1);
        if let Some(first) = self.records.front() {
            path.push(first.source);
        }
        path.extend(self.records.iter().map(|record| record.destination));
        path
    }

    /// Triggers fired, in order.
    pub fn triggers(&self) -> Vec<&Trigger> {
        self.records.iter().map(|record| &record.trigger).collect()
    }

    /// Time between the first and the last record.
    ///
    /// Returns `None` when the history is empty.
    pub fn duration(&self) -> Option<Duration> {
        let (first, last) = (self.records.front()?, self.records.back()?);
        last.timestamp
            .signed_duration_since(first.timestamp)
            .to_std()
            .ok()
    }

    pub fn records(&self) -> impl Iterator<Item = &TransitionRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Naming, StateTree};

    struct Fixture {
        states: Vec<StateId>,
        trigger: Trigger,
    }

    fn fixture() -> Fixture {
        let mut naming = Naming::new();
        let mut tree = StateTree::new();
        let states = ["detecting", "picking", "placing", "done"]
            .iter()
            .map(|label| tree.add(naming.identity(label), None).unwrap())
            .collect();
        Fixture {
            states,
            trigger: Trigger::new(naming.identity("next")),
        }
    }

    fn record(fx: &Fixture, from: usize, to: usize) -> TransitionRecord {
        TransitionRecord {
            source: fx.states[from],
            trigger: fx.trigger.clone(),
            destination: fx.states[to],
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn new_history_is_empty() {
        let history = StateHistory::new();

        assert!(history.is_empty());
        assert!(history.path().is_empty());
        assert!(history.duration().is_none());
    }

    #[test]
    fn path_returns_state_sequence() {
        let fx = fixture();
        let mut history = StateHistory::new();
        history.record(record(&fx, 0, 1));
        history.record(record(&fx, 1, 2));

        assert_eq!(history.path(), vec![fx.states[0], fx.states[1], fx.states[2]]);
        assert_eq!(history.triggers().len(), 2);
    }

    #[test]
    fn bounded_history_drops_oldest() {
        let fx = fixture();
        let mut history = StateHistory::bounded(2);
        history.record(record(&fx, 0, 1));
        history.record(record(&fx, 1, 2));
        history.record(record(&fx, 2, 3));

        assert_eq!(history.len(), 2);
        assert_eq!(history.path(), vec![fx.states[1], fx.states[2], fx.states[3]]);
    }

    #[test]
    fn zero_limit_keeps_nothing() {
        let fx = fixture();
        let mut history = StateHistory::bounded(0);
        history.record(record(&fx, 0, 1));

        assert!(history.is_empty());
    }

    #[test]
    fn single_record_has_zero_duration() {
        let fx = fixture();
        let mut history = StateHistory::new();
        history.record(record(&fx, 0, 1));

        assert_eq!(history.duration(), Some(Duration::from_secs(0)));
    }

    #[test]
    fn history_serializes_correctly() {
        let fx = fixture();
        let mut history = StateHistory::bounded(8);
        history.record(record(&fx, 0, 1));

        let json = serde_json::to_string(&history).unwrap();
        let deserialized: StateHistory = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized.len(), 1);
        assert_eq!(deserialized.limit(), Some(8));
        assert_eq!(deserialized.path(), history.path());
    }
}
