//! Stable, orderable names for states and triggers.
//!
//! Every identity carries an ordinal prefix handed out by a [`Naming`]
//! context, so two identities created from the same human-readable label
//! never compare equal.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Counter that disambiguates identities created within one machine.
///
/// The counter starts at zero and is never reset. It is owned by whoever
/// builds the machine (usually the [`StateMachine`](crate::engine::StateMachine)
/// itself), so there is no process-wide mutable state.
///
/// # Example
///
/// ```rust
/// use nested_states::core::Naming;
///
/// let mut naming = Naming::new();
/// let a = naming.identity("idle");
/// let b = naming.identity("idle");
///
/// assert_eq!(a.name(), "000-idle");
/// assert_eq!(b.name(), "001-idle");
/// assert_ne!(a, b);
/// ```
#[derive(Debug, Default)]
pub struct Naming {
    next: usize,
}

impl Naming {
    /// Create a counter starting at zero.
    pub fn new() -> Self {
        Self { next: 0 }
    }

    /// Allocate the next ordinal and build an identity for `label`.
    pub fn identity(&mut self, label: &str) -> Identity {
        let ordinal = self.next;
        self.next += 1;
        Identity {
            name: format!("{ordinal:03}-{label}"),
        }
    }

    /// Number of identities issued so far.
    pub fn issued(&self) -> usize {
        self.next
    }
}

/// Immutable display name with an ordinal prefix.
///
/// Equality and ordering compare the combined `"<ordinal>-<label>"` name.
/// Cloning keeps the already assigned name; it never allocates a new ordinal.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Identity {
    name: String,
}

impl Identity {
    /// The combined name, e.g. `"003-grasping"`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The human-readable part without the ordinal prefix.
    pub fn label(&self) -> &str {
        self.name
            .split_once('-')
            .map(|(_, label)| label)
            .unwrap_or(&self.name)
    }

    /// The ordinal assigned at creation.
    pub fn ordinal(&self) -> Option<usize> {
        self.name
            .split_once('-')
            .and_then(|(ordinal, _)| ordinal.parse().ok())
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Named event used to label transitions. Carries no payload.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Trigger(Identity);

impl Trigger {
    /// Wrap an identity as a trigger.
    pub fn new(identity: Identity) -> Self {
        Self(identity)
    }

    pub fn identity(&self) -> &Identity {
        &self.0
    }

    pub fn name(&self) -> &str {
        self.0.name()
    }

    pub fn label(&self) -> &str {
        self.0.label()
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
