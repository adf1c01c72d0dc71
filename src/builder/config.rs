//! Machine-wide settings.

use super::error::BuildError;
use serde::{Deserialize, Serialize};

/// What `fire` does when no transition is permitted for a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnhandledPolicy {
    /// Return [`EngineError::UnhandledTrigger`](crate::engine::EngineError::UnhandledTrigger)
    #[default]
    Fail,

    /// Invoke the registered handler, log a warning and carry on
    Report,
}

/// Settings applied to a [`StateMachine`](crate::engine::StateMachine).
///
/// # Example
///
/// ```rust
/// use nested_states::builder::{MachineConfig, UnhandledPolicy};
///
/// let config = MachineConfig::from_json(r#"{ "unhandled": "report", "history_limit": 64 }"#)
///     .unwrap();
///
/// assert_eq!(config.unhandled, UnhandledPolicy::Report);
/// assert_eq!(config.history_limit, Some(64));
/// assert_eq!(config.max_drain_steps, MachineConfig::DEFAULT_MAX_DRAIN_STEPS);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    pub unhandled: UnhandledPolicy,

    /// Keep at most this many transition records; `None` keeps everything.
    pub history_limit: Option<usize>,

    /// Upper bound on triggers fired by one drain of the deferred queue.
    pub max_drain_steps: usize,
}

impl MachineConfig {
    pub const DEFAULT_MAX_DRAIN_STEPS: usize = 10_000;

    /// Parse settings from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, BuildError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| BuildError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), BuildError> {
        if self.max_drain_steps == 0 {
            return Err(BuildError::InvalidConfig(
                "max_drain_steps must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            unhandled: UnhandledPolicy::Fail,
            history_limit: None,
            max_drain_steps: Self::DEFAULT_MAX_DRAIN_STEPS,
        }
    }
}
