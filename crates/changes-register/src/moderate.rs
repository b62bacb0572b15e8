//! Moderated updates: a human (or policy) vets each change before it lands.

use std::fmt;

use changes_diff::Conflict;
use changes_types::{Change, Changeset};

/// What to do with one change during a moderated update.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ModerationDecision {
    /// Apply the change, overwriting live state if it conflicts.
    Apply,
    /// Leave the live entity as it is.
    Skip,
    /// Skip, and stop surfacing conflicts on this entity in future updates.
    Mask,
}

impl fmt::Display for ModerationDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Apply => f.write_str("apply"),
            Self::Skip => f.write_str("skip"),
            Self::Mask => f.write_str("mask"),
        }
    }
}

/// Vets changes during `update`.
///
/// Every change is offered. `conflict` is set when the change disagrees with
/// the entity's live state; masked entities are skipped without asking.
pub trait Moderator {
    fn moderate(
        &mut self,
        changeset: &Changeset,
        change: &Change,
        conflict: Option<&Conflict>,
    ) -> ModerationDecision;
}

/// Applies everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct ApproveAll;

impl Moderator for ApproveAll {
    fn moderate(&mut self, _: &Changeset, _: &Change, _: Option<&Conflict>) -> ModerationDecision {
        ModerationDecision::Apply
    }
}

impl<F> Moderator for F
where
    F: FnMut(&Changeset, &Change, Option<&Conflict>) -> ModerationDecision,
{
    fn moderate(
        &mut self,
        changeset: &Changeset,
        change: &Change,
        conflict: Option<&Conflict>,
    ) -> ModerationDecision {
        self(changeset, change, conflict)
    }
}
