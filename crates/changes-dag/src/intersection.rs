//! Nearest common ancestor of two changesets.

use changes_store::ChangesetStore;
use changes_types::{Changeset, ChangesetId};
use tracing::debug;

use crate::ancestry::{ancestors, load};
use crate::error::{DagError, DagResult};

/// Common-ancestor search between `a` and `b`.
///
/// Both ancestries are walked over `follows_id` and `closes_id` edges. Among
/// the changesets reachable from both, the one with the lowest combined
/// distance wins; ties go to the most recent timestamp.
#[derive(Debug)]
pub struct Intersection<'s, S: ?Sized> {
    store: &'s S,
    a: ChangesetId,
    b: ChangesetId,
}

impl<'s, S> Intersection<'s, S>
where
    S: ChangesetStore + ?Sized,
{
    pub fn new(store: &'s S, a: ChangesetId, b: ChangesetId) -> Self {
        Self { store, a, b }
    }

    /// The nearest common ancestor. Fails with `NoIntersection` when the two
    /// changesets share no known ancestor.
    pub fn find(&self) -> DagResult<Changeset> {
        let from_a = ancestors(self.store, self.a)?;
        let from_b = ancestors(self.store, self.b)?;

        let mut best: Option<(usize, Changeset)> = None;
        for (id, da) in &from_a {
            let Some(db) = from_b.get(id) else {
                continue;
            };
            let distance = da + db;
            let candidate = load(self.store, id)?;
            let better = match &best {
                None => true,
                Some((best_distance, current)) => {
                    distance < *best_distance
                        || (distance == *best_distance
                            && (candidate.meta().timestamp, candidate.id())
                                > (current.meta().timestamp, current.id()))
                }
            };
            if better {
                best = Some((distance, candidate));
            }
        }

        match best {
            Some((distance, ancestor)) => {
                debug!(
                    a = %self.a.short_id(),
                    b = %self.b.short_id(),
                    ancestor = %ancestor.id().short_id(),
                    distance,
                    "found intersection"
                );
                Ok(ancestor)
            }
            None => Err(DagError::NoIntersection {
                a: self.a,
                b: self.b,
            }),
        }
    }
}
