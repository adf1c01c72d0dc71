//! Guard predicates for conditional transitions.
//!
//! A guard is evaluated when a trigger is resolved. A guarded behaviour whose
//! predicate returns `false` is skipped, and resolution continues with the
//! remaining behaviours and then the superstates.

use std::fmt;
use std::rc::Rc;

/// Nullary predicate attached to a permitted transition.
///
/// Guards typically close over application state shared with callbacks, so
/// they are reference counted rather than boxed and can be cloned freely.
///
/// # Example
///
/// ```rust
/// use nested_states::core::Guard;
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let armed = Rc::new(Cell::new(false));
/// let guard = {
///     let armed = Rc::clone(&armed);
///     Guard::new(move || armed.get())
/// };
///
/// assert!(!guard.check());
/// armed.set(true);
/// assert!(guard.check());
/// ```
#[derive(Clone)]
pub struct Guard {
    predicate: Rc<dyn Fn() -> bool>,
}

impl Guard {
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn() -> bool + 'static,
    {
        Guard {
            predicate: Rc::new(predicate),
        }
    }

    /// Evaluate the predicate.
    pub fn check(&self) -> bool {
        (self.predicate)()
    }
}

impl fmt::Debug for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Guard(..)")
    }
}
