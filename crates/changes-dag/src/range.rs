//! Net change between two changesets on one line of ancestry.

use changes_diff::{invert_all, reduce};
use changes_store::ChangesetStore;
use changes_types::{Change, Changeset, ChangesetId};
use tracing::debug;

use crate::ancestry::{follows_chain, follows_fork, is_ancestor};
use crate::error::{DagError, DagResult};

/// The changesets after `start` up to and including `stop`.
///
/// [`calc_changes`](Range::calc_changes) coalesces them into one change per
/// entity whose `old` side is the state at `start` and whose `new` side is
/// the state at `stop`.
///
/// A mergeset carries the changes of the line it closes, so the state at a
/// changeset is fixed by its `follows_id` chain alone. When `start` is only
/// reachable from `stop` through a `closes_id` edge, the range first rewinds
/// `start`'s own line back to where it forks from `stop`'s, then walks
/// `stop`'s line forward from there.
#[derive(Clone, Debug)]
pub struct Range {
    start: Option<ChangesetId>,
    stop: ChangesetId,
    rewind: Vec<Change>,
    sequence: Vec<Changeset>,
}

impl Range {
    /// Fails with `Unreachable` if `stop` does not descend from `start`.
    pub fn new<S>(store: &S, start: ChangesetId, stop: ChangesetId) -> DagResult<Self>
    where
        S: ChangesetStore + ?Sized,
    {
        let unreachable = || DagError::Unreachable { start, stop };
        let fork = follows_fork(store, start, stop)?.ok_or_else(unreachable)?;
        if fork == start {
            return Self::build(store, Some(start), Vec::new(), stop);
        }
        if !is_ancestor(store, start, stop)? {
            return Err(unreachable());
        }

        let closed_line = follows_chain(store, Some(fork), start)?;
        let undone: Vec<Change> = closed_line
            .iter()
            .flat_map(|changeset| changeset.changes().iter().cloned())
            .collect();
        let mut range = Self::build(store, Some(fork), invert_all(&undone), stop)?;
        range.start = Some(start);
        debug!(
            start = %start.short_id(),
            fork = %fork.short_id(),
            rewound = closed_line.len(),
            "range crosses a merge edge"
        );
        Ok(range)
    }

    /// Everything from the root of `stop`'s line, root included.
    pub fn from_root<S>(store: &S, stop: ChangesetId) -> DagResult<Self>
    where
        S: ChangesetStore + ?Sized,
    {
        Self::build(store, None, Vec::new(), stop)
    }

    fn build<S>(
        store: &S,
        start: Option<ChangesetId>,
        rewind: Vec<Change>,
        stop: ChangesetId,
    ) -> DagResult<Self>
    where
        S: ChangesetStore + ?Sized,
    {
        let sequence = follows_chain(store, start, stop)?;
        debug!(
            start = ?start.map(|id| id.short_id()),
            stop = %stop.short_id(),
            hops = sequence.len(),
            "built range"
        );
        Ok(Self {
            start,
            stop,
            rewind,
            sequence,
        })
    }

    /// The exclusive lower bound, `None` when the range starts at a root.
    pub fn start(&self) -> Option<ChangesetId> {
        self.start
    }

    pub fn stop(&self) -> ChangesetId {
        self.stop
    }

    /// The changesets walked forward on `stop`'s line, oldest first.
    pub fn sequence(&self) -> &[Changeset] {
        &self.sequence
    }

    /// Whether the range had to undo part of `start`'s line.
    pub fn crosses_merge(&self) -> bool {
        !self.rewind.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty() && self.rewind.is_empty()
    }

    /// Drop the oldest hop, re-anchoring the range on it.
    ///
    /// Afterwards the `old` side of [`calc_changes`](Range::calc_changes) is
    /// the state right after the removed changeset.
    pub fn pop_first(&mut self) -> Option<Changeset> {
        if self.sequence.is_empty() {
            return None;
        }
        let first = self.sequence.remove(0);
        self.start = Some(first.id());
        self.rewind.clear();
        Some(first)
    }

    /// The net changes over the range, one per entity.
    pub fn calc_changes(&self) -> Vec<Change> {
        reduce(
            self.rewind.iter().cloned().chain(
                self.sequence
                    .iter()
                    .flat_map(|changeset| changeset.changes().iter().cloned()),
            ),
        )
    }
}
