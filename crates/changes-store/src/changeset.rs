use changes_types::{Changeset, ChangesetId, EntityRef, RevisionId};

use crate::error::{StoreError, StoreResult};
use crate::mask::Changemask;

/// Arena of changesets keyed by id.
///
/// All implementations must satisfy these invariants:
/// - Changesets are immutable once inserted. Inserting an id that already
///   exists leaves the stored changeset untouched and returns `false`.
/// - Ancestry pointers are not validated here; a stored changeset may follow
///   an id that is not (yet) known locally.
/// - The working pointer, once set, always names a stored changeset.
pub trait ChangesetStore: Send + Sync {
    /// Read a changeset by id. Returns `Ok(None)` if it does not exist.
    fn get(&self, id: &ChangesetId) -> StoreResult<Option<Changeset>>;

    /// Insert a changeset. Returns `true` if it was new.
    ///
    /// A changeset carrying a `revision_id` also marks that revision as
    /// committed to it.
    fn insert(&self, changeset: Changeset) -> StoreResult<bool>;

    /// All changesets ordered by timestamp, then id.
    fn all(&self) -> StoreResult<Vec<Changeset>>;

    /// Number of stored changesets.
    fn len(&self) -> StoreResult<usize>;

    /// The working changeset id, if any.
    fn working(&self) -> StoreResult<Option<ChangesetId>>;

    /// Move the working pointer. The target must exist.
    fn set_working(&self, id: ChangesetId) -> StoreResult<()>;

    /// Record that `revision` has been turned into (or produced by) a
    /// changeset. `None` marks a revision with no net change as committed.
    fn mark_committed(&self, revision: RevisionId, changeset: Option<ChangesetId>)
        -> StoreResult<()>;

    /// Whether `revision` has already been committed.
    fn is_committed(&self, revision: &RevisionId) -> StoreResult<bool>;

    /// Persist a changemask.
    fn add_changemask(&self, mask: Changemask) -> StoreResult<()>;

    /// All changemasks in creation order.
    fn changemasks(&self) -> StoreResult<Vec<Changemask>>;

    /// Whether `id` is stored.
    fn contains(&self, id: &ChangesetId) -> StoreResult<bool> {
        Ok(self.get(id)?.is_some())
    }

    /// Returns `true` if the store holds no changesets.
    fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Read a changeset that must exist.
    fn require(&self, id: &ChangesetId) -> StoreResult<Changeset> {
        self.get(id)?.ok_or(StoreError::NotFound(*id))
    }

    /// Whether conflicts on `entity` are masked.
    fn is_masked(&self, entity: &EntityRef) -> StoreResult<bool> {
        Ok(self.changemasks()?.iter().any(|m| &m.entity == entity))
    }
}
