use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use tracing::debug;

use changes_types::{Changeset, ChangesetId, RevisionId};

use crate::changeset::ChangesetStore;
use crate::error::{StoreError, StoreResult};
use crate::mask::Changemask;

#[derive(Debug, Default)]
struct StoreState {
    changesets: HashMap<ChangesetId, Changeset>,
    working: Option<ChangesetId>,
    revisions: HashMap<RevisionId, Option<ChangesetId>>,
    masks: Vec<Changemask>,
}

/// Serializable image of an [`InMemoryChangesetStore`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub changesets: Vec<Changeset>,
    #[serde(default)]
    pub working: Option<ChangesetId>,
    #[serde(default)]
    pub revisions: Vec<(RevisionId, Option<ChangesetId>)>,
    #[serde(default)]
    pub changemasks: Vec<Changemask>,
}

/// In-memory, HashMap-based changeset store.
///
/// All state is held behind a single `RwLock` so the working pointer and
/// the arena are always observed together.
#[derive(Debug, Default)]
pub struct InMemoryChangesetStore {
    state: RwLock<StoreState>,
}

impl InMemoryChangesetStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from a snapshot.
    pub fn from_snapshot(snapshot: StoreSnapshot) -> StoreResult<Self> {
        if let Some(working) = snapshot.working {
            if !snapshot.changesets.iter().any(|c| c.id() == working) {
                return Err(StoreError::NotFound(working));
            }
        }
        let state = StoreState {
            changesets: snapshot
                .changesets
                .into_iter()
                .map(|c| (c.id(), c))
                .collect(),
            working: snapshot.working,
            revisions: snapshot.revisions.into_iter().collect(),
            masks: snapshot.changemasks,
        };
        Ok(Self {
            state: RwLock::new(state),
        })
    }

    /// Export the full store contents.
    pub fn snapshot(&self) -> StoreResult<StoreSnapshot> {
        let state = self.read()?;
        let mut revisions: Vec<_> = state.revisions.iter().map(|(r, c)| (*r, *c)).collect();
        revisions.sort_by_key(|(r, _)| *r);
        Ok(StoreSnapshot {
            changesets: sorted(state.changesets.values().cloned().collect()),
            working: state.working,
            revisions,
            changemasks: state.masks.clone(),
        })
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, StoreState>> {
        self.state
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, StoreState>> {
        self.state
            .write()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }
}

fn sorted(mut changesets: Vec<Changeset>) -> Vec<Changeset> {
    changesets.sort_by(|a, b| {
        a.meta()
            .timestamp
            .cmp(&b.meta().timestamp)
            .then_with(|| a.id().cmp(&b.id()))
    });
    changesets
}

impl ChangesetStore for InMemoryChangesetStore {
    fn get(&self, id: &ChangesetId) -> StoreResult<Option<Changeset>> {
        Ok(self.read()?.changesets.get(id).cloned())
    }

    fn insert(&self, changeset: Changeset) -> StoreResult<bool> {
        let mut state = self.write()?;
        let id = changeset.id();
        if state.changesets.contains_key(&id) {
            return Ok(false);
        }
        if let Some(revision) = changeset.revision_id() {
            state.revisions.insert(revision, Some(id));
        }
        debug!(changeset = %id.short_id(), changes = changeset.changes().len(), "stored changeset");
        state.changesets.insert(id, changeset);
        Ok(true)
    }

    fn all(&self) -> StoreResult<Vec<Changeset>> {
        Ok(sorted(self.read()?.changesets.values().cloned().collect()))
    }

    fn len(&self) -> StoreResult<usize> {
        Ok(self.read()?.changesets.len())
    }

    fn working(&self) -> StoreResult<Option<ChangesetId>> {
        Ok(self.read()?.working)
    }

    fn set_working(&self, id: ChangesetId) -> StoreResult<()> {
        let mut state = self.write()?;
        if !state.changesets.contains_key(&id) {
            return Err(StoreError::NotFound(id));
        }
        state.working = Some(id);
        Ok(())
    }

    fn mark_committed(
        &self,
        revision: RevisionId,
        changeset: Option<ChangesetId>,
    ) -> StoreResult<()> {
        self.write()?.revisions.insert(revision, changeset);
        Ok(())
    }

    fn is_committed(&self, revision: &RevisionId) -> StoreResult<bool> {
        Ok(self.read()?.revisions.contains_key(revision))
    }

    fn add_changemask(&self, mask: Changemask) -> StoreResult<()> {
        let mut state = self.write()?;
        if !state.masks.iter().any(|m| m.entity == mask.entity) {
            state.masks.push(mask);
        }
        Ok(())
    }

    fn changemasks(&self) -> StoreResult<Vec<Changemask>> {
        Ok(self.read()?.masks.clone())
    }
}
