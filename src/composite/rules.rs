//! Structural checks for assembled composites using Validation.

use super::state::Completion;
use crate::core::{StateId, StateTree, StructureError};
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// Outcome of a structural check; failures carry every violation found.
pub type StructureCheck = Validation<(), NonEmptyVec<StructureError>>;

/// Check one composite against the hierarchy it was built into.
///
/// Accumulates ALL violations instead of stopping at the first one.
pub(crate) fn check_composite(
    tree: &StateTree,
    composite: StateId,
    completion: Option<&Completion>,
) -> StructureCheck {
    if !tree.contains(composite) {
        return Validation::fail(StructureError::UnknownState {
            id: composite.index(),
        });
    }
    let name = tree.name(composite).to_string();
    let mut checks: Vec<StructureCheck> = Vec::new();

    match completion {
        Some(completion) => {
            let check = if tree.is_child_of(completion.initial, composite) {
                Validation::success(())
            } else {
                Validation::fail(StructureError::InitialNotChild {
                    composite: name,
                    state: tree.name(completion.initial).to_string(),
                })
            };
            checks.push(check);
        }
        None => checks.push(Validation::fail(StructureError::Unbound { composite: name })),
    }

    Validation::all_vec(checks).map(|_| ())
}

/// Combine the checks of several composites into one result.
pub(crate) fn combine(checks: Vec<StructureCheck>) -> StructureCheck {
    Validation::all_vec(checks).map(|_| ())
}
