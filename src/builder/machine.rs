//! Builder for constructing state machines.

use crate::builder::config::{MachineConfig, UnhandledPolicy};
use crate::builder::error::BuildError;
use crate::engine::StateMachine;

/// Builder for constructing state machines with a fluent API.
///
/// # Example
///
/// ```rust
/// use nested_states::builder::{StateMachineBuilder, UnhandledPolicy};
///
/// let machine = StateMachineBuilder::new()
///     .initial("idle")
///     .unhandled(UnhandledPolicy::Report)
///     .history_limit(32)
///     .build()
///     .unwrap();
///
/// assert_eq!(machine.state_name(machine.current_state()), "000-idle");
/// assert_eq!(machine.history().limit(), Some(32));
/// ```
#[derive(Debug, Default)]
pub struct StateMachineBuilder {
    initial: Option<String>,
    config: MachineConfig,
}

impl StateMachineBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the label of the initial state (required).
    pub fn initial(mut self, label: &str) -> Self {
        self.initial = Some(label.to_string());
        self
    }

    /// Replace all settings at once.
    pub fn config(mut self, config: MachineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn unhandled(mut self, policy: UnhandledPolicy) -> Self {
        self.config.unhandled = policy;
        self
    }

    pub fn history_limit(mut self, limit: usize) -> Self {
        self.config.history_limit = Some(limit);
        self
    }

    pub fn max_drain_steps(mut self, steps: usize) -> Self {
        self.config.max_drain_steps = steps;
        self
    }

    /// Build the state machine.
    /// Returns an error if required fields are missing or settings are invalid.
    pub fn build(self) -> Result<StateMachine, BuildError> {
        let initial = self.initial.ok_or(BuildError::MissingInitialState)?;
        StateMachine::with_config(&initial, self.config)
    }
}
