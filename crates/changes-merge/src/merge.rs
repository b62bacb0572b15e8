//! Building mergesets.

use changes_dag::{Intersection, Range};
use changes_diff::{Conflict, Sum};
use changes_store::ChangesetStore;
use changes_types::{Changeset, ChangesetId, ChangesetMeta};
use tracing::{debug, info};

use crate::error::MergeResult;
use crate::resolve::ConflictResolver;

/// Author recorded on mergesets when none is given.
pub const DEFAULT_MERGE_AUTHOR: &str = "changes";

/// A merge of `closing` into `continuing`.
///
/// Both ranges start at the common ancestor, so they describe each line's
/// net change relative to the same state.
#[derive(Clone, Debug)]
pub struct Merge {
    ancestor: Changeset,
    closing: Changeset,
    continuing: Changeset,
    closing_range: Range,
    continuing_range: Range,
    author: String,
}

impl Merge {
    /// Locate the common ancestor and compute both ranges.
    ///
    /// Fails with `NoIntersection` if the two changesets are unrelated.
    pub fn new<S>(store: &S, closing: ChangesetId, continuing: ChangesetId) -> MergeResult<Self>
    where
        S: ChangesetStore + ?Sized,
    {
        let ancestor = Intersection::new(store, closing, continuing).find()?;
        let closing_range = Range::new(store, ancestor.id(), closing)?;
        let continuing_range = Range::new(store, ancestor.id(), continuing)?;
        debug!(
            ancestor = %ancestor.id().short_id(),
            closing_hops = closing_range.sequence().len(),
            continuing_hops = continuing_range.sequence().len(),
            "prepared merge"
        );
        Ok(Self {
            closing: store.require(&closing)?,
            continuing: store.require(&continuing)?,
            ancestor,
            closing_range,
            continuing_range,
            author: DEFAULT_MERGE_AUTHOR.to_string(),
        })
    }

    /// Author to record on the mergeset.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    pub fn ancestor(&self) -> &Changeset {
        &self.ancestor
    }

    pub fn closing(&self) -> &Changeset {
        &self.closing
    }

    pub fn continuing(&self) -> &Changeset {
        &self.continuing
    }

    pub fn closing_range(&self) -> &Range {
        &self.closing_range
    }

    pub fn continuing_range(&self) -> &Range {
        &self.continuing_range
    }

    pub fn sum(&self) -> Sum {
        Sum::new(
            self.closing_range.calc_changes(),
            self.continuing_range.calc_changes(),
        )
    }

    pub fn is_conflicting(&self) -> bool {
        self.sum().is_conflicting()
    }

    pub fn conflicts(&self) -> Vec<Conflict> {
        self.sum().conflicts()
    }

    /// Build (but do not store) the mergeset.
    ///
    /// It follows the continuing changeset and closes the closing one. Its
    /// changes are the straight sum when nothing conflicts; otherwise each
    /// conflict is settled by `resolver`. A merge without net change yields
    /// an empty mergeset.
    pub fn create_mergeset<R>(&self, resolver: &mut R) -> MergeResult<Changeset>
    where
        R: ConflictResolver + ?Sized,
    {
        let sum = self.sum();
        let changes = if sum.is_conflicting() {
            sum.combine(|conflict| resolver.resolve(conflict))
        } else {
            sum.calc_changes()?
        };

        let meta = ChangesetMeta::new(
            self.author.clone(),
            format!(
                "merge of {} into {}",
                self.closing.id().short_id(),
                self.continuing.id().short_id()
            ),
        );
        let mergeset = if changes.is_empty() {
            Changeset::empty(meta)
        } else {
            Changeset::new(changes, meta)?
        };
        let mergeset = mergeset
            .following(Some(self.continuing.id()))
            .closing(self.closing.id())
            .on_branch(self.continuing.branch());

        info!(
            mergeset = %mergeset.id().short_id(),
            closing = %self.closing.id().short_id(),
            continuing = %self.continuing.id().short_id(),
            changes = mergeset.changes().len(),
            "created mergeset"
        );
        Ok(mergeset)
    }
}
