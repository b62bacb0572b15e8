//! Conflict resolution policies.

use changes_diff::{Conflict, Resolution};

/// Decides the outcome of each conflict met while building a mergeset.
pub trait ConflictResolver {
    fn resolve(&mut self, conflict: &Conflict) -> Resolution;
}

/// Drops every contested attribute: neither side's edit is carried.
///
/// The default non-interactive policy.
#[derive(Clone, Copy, Debug, Default)]
pub struct AutoResolve;

impl ConflictResolver for AutoResolve {
    fn resolve(&mut self, _conflict: &Conflict) -> Resolution {
        Resolution::Drop
    }
}

/// The closing side (the line being merged in) wins every conflict.
#[derive(Clone, Copy, Debug, Default)]
pub struct AutoResolvePreferClosing;

impl ConflictResolver for AutoResolvePreferClosing {
    fn resolve(&mut self, _conflict: &Conflict) -> Resolution {
        Resolution::Closing
    }
}

impl<F> ConflictResolver for F
where
    F: FnMut(&Conflict) -> Resolution,
{
    fn resolve(&mut self, conflict: &Conflict) -> Resolution {
        self(conflict)
    }
}
