//! Interface to the live entity store ("the model").
//!
//! The model owns the current state of every catalog entity and records a
//! [`Revision`] for each batch of edits. The changeset engine turns those
//! revisions into changesets (`commit`) and writes changesets back as new
//! revisions (`update`).

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use changes_types::{AttrMap, EntityRef, RevisionId};

use crate::error::{StoreError, StoreResult};

/// The before/after state of one entity inside a revision.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionEntry {
    pub entity: EntityRef,
    pub before: Option<AttrMap>,
    pub after: Option<AttrMap>,
}

/// A batch of entity edits recorded atomically by the model.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    pub id: RevisionId,
    pub author: String,
    pub log_message: String,
    pub timestamp: DateTime<Utc>,
    pub entries: Vec<RevisionEntry>,
}

/// One requested edit: the full state to store, or `None` to delete.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Edit {
    pub entity: EntityRef,
    pub state: Option<AttrMap>,
}

/// Edits to be recorded as a single revision.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RevisionDraft {
    pub author: String,
    pub log_message: String,
    pub edits: Vec<Edit>,
}

impl RevisionDraft {
    pub fn new(author: impl Into<String>, log_message: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            log_message: log_message.into(),
            edits: Vec::new(),
        }
    }

    /// Store `state` as the full new state of `entity`.
    pub fn put(mut self, entity: EntityRef, state: AttrMap) -> Self {
        self.edits.push(Edit {
            entity,
            state: Some(state),
        });
        self
    }

    /// Delete `entity`.
    pub fn remove(mut self, entity: EntityRef) -> Self {
        self.edits.push(Edit {
            entity,
            state: None,
        });
        self
    }
}

/// The mutable record store the engine synchronizes.
pub trait EntityModel: Send + Sync {
    /// Current state of an entity, `None` if it does not exist.
    fn get(&self, entity: &EntityRef) -> StoreResult<Option<AttrMap>>;

    /// All recorded revisions, oldest first.
    fn revisions(&self) -> StoreResult<Vec<Revision>>;

    /// Apply `draft` and record it as one revision.
    ///
    /// Edits that leave an entity unchanged are dropped from the recorded
    /// entries, but the revision itself is always recorded.
    fn record(&self, draft: RevisionDraft) -> StoreResult<Revision>;
}

/// Serializable image of an [`InMemoryModel`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSnapshot {
    pub entities: BTreeMap<EntityRef, AttrMap>,
    pub revisions: Vec<Revision>,
}

/// In-memory model backed by a `BTreeMap` of entities.
#[derive(Debug, Default)]
pub struct InMemoryModel {
    state: RwLock<ModelSnapshot>,
}

impl InMemoryModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: ModelSnapshot) -> Self {
        Self {
            state: RwLock::new(snapshot),
        }
    }

    pub fn snapshot(&self) -> StoreResult<ModelSnapshot> {
        Ok(self.read()?.clone())
    }

    /// All live entities, keyed by reference.
    pub fn entities(&self) -> StoreResult<BTreeMap<EntityRef, AttrMap>> {
        Ok(self.read()?.entities.clone())
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, ModelSnapshot>> {
        self.state
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, ModelSnapshot>> {
        self.state
            .write()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }
}

impl EntityModel for InMemoryModel {
    fn get(&self, entity: &EntityRef) -> StoreResult<Option<AttrMap>> {
        Ok(self.read()?.entities.get(entity).cloned())
    }

    fn revisions(&self) -> StoreResult<Vec<Revision>> {
        Ok(self.read()?.revisions.clone())
    }

    fn record(&self, draft: RevisionDraft) -> StoreResult<Revision> {
        let mut state = self.write()?;

        // Collapse repeated edits of one entity into a single before/after pair.
        let mut order: Vec<EntityRef> = Vec::new();
        let mut before: BTreeMap<EntityRef, Option<AttrMap>> = BTreeMap::new();
        for edit in draft.edits {
            if !before.contains_key(&edit.entity) {
                before.insert(edit.entity.clone(), state.entities.get(&edit.entity).cloned());
                order.push(edit.entity.clone());
            }
            match edit.state {
                Some(attrs) => {
                    state.entities.insert(edit.entity, attrs);
                }
                None => {
                    state.entities.remove(&edit.entity);
                }
            }
        }

        let entries = order
            .into_iter()
            .filter_map(|entity| {
                let before = before.remove(&entity).flatten();
                let after = state.entities.get(&entity).cloned();
                (before != after).then_some(RevisionEntry {
                    entity,
                    before,
                    after,
                })
            })
            .collect();

        let revision = Revision {
            id: RevisionId::new(),
            author: draft.author,
            log_message: draft.log_message,
            timestamp: Utc::now(),
            entries,
        };
        debug!(
            revision = %revision.id.short_id(),
            entries = revision.entries.len(),
            "recorded revision"
        );
        state.revisions.push(revision.clone());
        Ok(revision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn annie() -> EntityRef {
        EntityRef::parse("/package/annie").unwrap()
    }

    fn map(pairs: &[(&str, Value)]) -> AttrMap {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn record_creates_entity_and_revision() {
        let model = InMemoryModel::new();
        let state = map(&[("title", json!("Annie"))]);
        let revision = model
            .record(RevisionDraft::new("tester", "create").put(annie(), state.clone()))
            .unwrap();

        assert_eq!(revision.entries.len(), 1);
        assert_eq!(revision.entries[0].before, None);
        assert_eq!(revision.entries[0].after, Some(state.clone()));
        assert_eq!(model.get(&annie()).unwrap(), Some(state));
        assert_eq!(model.revisions().unwrap().len(), 1);
    }

    #[test]
    fn repeated_edits_collapse() {
        let model = InMemoryModel::new();
        let revision = model
            .record(
                RevisionDraft::new("tester", "churn")
                    .put(annie(), map(&[("title", json!("a"))]))
                    .put(annie(), map(&[("title", json!("b"))])),
            )
            .unwrap();
        assert_eq!(revision.entries.len(), 1);
        assert_eq!(revision.entries[0].after, Some(map(&[("title", json!("b"))])));
    }

    #[test]
    fn unchanged_edits_are_dropped() {
        let model = InMemoryModel::new();
        let state = map(&[("title", json!("a"))]);
        model
            .record(RevisionDraft::new("t", "create").put(annie(), state.clone()))
            .unwrap();
        let revision = model
            .record(RevisionDraft::new("t", "noop").put(annie(), state))
            .unwrap();
        assert!(revision.entries.is_empty());
        assert_eq!(model.revisions().unwrap().len(), 2);
    }

    #[test]
    fn remove_deletes_entity() {
        let model = InMemoryModel::new();
        model
            .record(RevisionDraft::new("t", "create").put(annie(), map(&[("a", json!(1))])))
            .unwrap();
        let revision = model
            .record(RevisionDraft::new("t", "delete").remove(annie()))
            .unwrap();
        assert_eq!(revision.entries[0].after, None);
        assert_eq!(model.get(&annie()).unwrap(), None);
    }

    #[test]
    fn snapshot_roundtrip() {
        let model = InMemoryModel::new();
        model
            .record(RevisionDraft::new("t", "create").put(annie(), map(&[("a", json!(1))])))
            .unwrap();
        let restored = InMemoryModel::from_snapshot(model.snapshot().unwrap());
        assert_eq!(restored.snapshot().unwrap(), model.snapshot().unwrap());
    }
}
