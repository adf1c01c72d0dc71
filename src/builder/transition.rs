//! Builder for transition values.

use crate::builder::error::BuildError;
use crate::core::{StateId, Trigger};
use crate::engine::Transition;

/// Builder for a [`Transition`] triple with a fluent API.
///
/// # Example
///
/// ```rust
/// use nested_states::builder::TransitionBuilder;
/// use nested_states::engine::StateMachine;
///
/// let mut machine = StateMachine::new("open");
/// let open = machine.initial_state();
/// let closed = machine.add_state("closed", None).unwrap();
/// let close = machine.trigger("close");
///
/// let transition = TransitionBuilder::new()
///     .from(open)
///     .on(&close)
///     .to(closed)
///     .build()
///     .unwrap();
///
/// assert_eq!(transition.destination(), closed);
/// ```
#[derive(Debug, Default)]
pub struct TransitionBuilder {
    source: Option<StateId>,
    trigger: Option<Trigger>,
    destination: Option<StateId>,
}

impl TransitionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the source state (required).
    pub fn from(mut self, state: StateId) -> Self {
        self.source = Some(state);
        self
    }

    /// Set the trigger (required).
    pub fn on(mut self, trigger: &Trigger) -> Self {
        self.trigger = Some(trigger.clone());
        self
    }

    /// Set the destination state (required).
    pub fn to(mut self, state: StateId) -> Self {
        self.destination = Some(state);
        self
    }

    /// Use the source as destination.
    /// The source must be set with `.from()` before calling this.
    pub fn reentry(mut self) -> Self {
        self.destination = self.source;
        self
    }

    pub fn build(self) -> Result<Transition, BuildError> {
        let source = self.source.ok_or(BuildError::MissingSource)?;
        let trigger = self.trigger.ok_or(BuildError::MissingTrigger)?;
        let destination = self.destination.ok_or(BuildError::MissingDestination)?;
        Ok(Transition::new(source, trigger, destination))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Naming;
    use crate::engine::StateMachine;

    #[test]
    fn builder_validates_required_fields() {
        let mut naming = Naming::new();
        let trigger = Trigger::new(naming.identity("go"));

        let result = TransitionBuilder::new().on(&trigger).build();
        assert!(matches!(result, Err(BuildError::MissingSource)));

        let machine = StateMachine::new("idle");
        let idle = machine.initial_state();
        let result = TransitionBuilder::new().from(idle).build();
        assert!(matches!(result, Err(BuildError::MissingTrigger)));

        let result = TransitionBuilder::new().from(idle).on(&trigger).build();
        assert!(matches!(result, Err(BuildError::MissingDestination)));
    }

    #[test]
    fn reentry_targets_the_source() {
        let mut machine = StateMachine::new("assigned");
        let assigned = machine.initial_state();
        let assign = machine.trigger("assign");

        let transition = TransitionBuilder::new()
            .from(assigned)
            .on(&assign)
            .reentry()
            .build()
            .unwrap();

        assert!(transition.is_reentry());
        assert_eq!(transition.trigger(), &assign);
    }

    #[test]
    fn reentry_before_from_is_missing_destination() {
        let mut machine = StateMachine::new("idle");
        let go = machine.trigger("go");
        let idle = machine.initial_state();

        let result = TransitionBuilder::new().reentry().from(idle).on(&go).build();

        assert!(matches!(result, Err(BuildError::MissingDestination)));
    }
}
