//! Serializable view of a running machine.
//!
//! Callbacks and guards are closures and cannot be serialized, so a snapshot
//! is for inspection and logging only. It carries names rather than ids so it
//! stays readable without the machine that produced it.

use super::error::EngineError;
use crate::core::{StateHistory, Trigger};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Snapshot format version
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MachineSnapshot {
    /// Id of the machine the snapshot was taken from
    pub machine: Uuid,

    pub taken_at: DateTime<Utc>,

    /// Name of the current state
    pub current: String,

    /// Current state followed by its superstates, innermost first
    pub active: Vec<String>,

    /// Deferred triggers still waiting, oldest first
    pub pending: Vec<Trigger>,

    pub history: StateHistory,
}

impl MachineSnapshot {
    pub fn version(&self) -> u32 {
        SNAPSHOT_VERSION
    }

    pub fn to_json(&self) -> Result<String, EngineError> {
        serde_json::to_string_pretty(self).map_err(|e| EngineError::Serialization(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        serde_json::from_str(json).map_err(|e| EngineError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::{DeferredTriggers, StateMachine};

    #[test]
    fn snapshot_lists_active_states_and_pending_triggers() {
        let mut machine = StateMachine::new("outer");
        let outer = machine.initial_state();
        let inner = machine.add_state("inner", Some(outer)).unwrap();
        let enter = machine.trigger("enter");
        let later = machine.trigger("later");
        machine.configure(outer).permit(&enter, inner);
        machine.configure(inner).sub_state_of(outer);

        machine.fire(&enter).unwrap();
        machine.push_deferred_trigger(later.clone());
        let snapshot = machine.snapshot();

        assert_eq!(snapshot.machine, machine.id());
        assert_eq!(snapshot.current, "002-inner");
        assert_eq!(snapshot.active, vec!["002-inner", "000-outer"]);
        assert_eq!(snapshot.pending, vec![later]);
        assert_eq!(snapshot.history.len(), 1);
    }

    #[test]
    fn snapshot_survives_json() {
        let machine = StateMachine::new("idle");
        let snapshot = machine.snapshot();

        let json = snapshot.to_json().unwrap();
        let restored = super::MachineSnapshot::from_json(&json).unwrap();

        assert_eq!(restored.current, snapshot.current);
        assert_eq!(restored.machine, snapshot.machine);
        assert!(json.contains("000-idle"));
    }
}
