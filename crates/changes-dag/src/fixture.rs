//! Graph builder shared by the unit tests.

use changes_store::{ChangesetStore, InMemoryChangesetStore};
use changes_types::{AttrMap, Change, Changeset, ChangesetId, ChangesetMeta, EntityRef};
use chrono::{Duration, TimeZone, Utc};
use serde_json::{json, Value};

pub(crate) fn annie() -> EntityRef {
    EntityRef::parse("/package/annie").unwrap()
}

pub(crate) fn map(pairs: &[(&str, Value)]) -> AttrMap {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

/// Builds changesets one minute apart so timestamp order is creation order.
pub(crate) struct Graph {
    pub store: InMemoryChangesetStore,
    tick: i64,
}

impl Graph {
    pub fn new() -> Self {
        Self {
            store: InMemoryChangesetStore::new(),
            tick: 0,
        }
    }

    fn meta(&mut self, message: &str) -> ChangesetMeta {
        self.tick += 1;
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        ChangesetMeta::new("tester", message).at(base + Duration::minutes(self.tick))
    }

    fn put(&self, changeset: Changeset) -> ChangesetId {
        let id = changeset.id();
        self.store.insert(changeset).unwrap();
        id
    }

    /// Creates `/package/annie` with `title = "a"` and `license = "open"`.
    pub fn root(&mut self) -> ChangesetId {
        let state = map(&[("title", json!("a")), ("license", json!("open"))]);
        let meta = self.meta("create annie");
        self.put(Changeset::new(vec![Change::create(annie(), state)], meta).unwrap())
    }

    pub fn edit(&mut self, parent: ChangesetId, key: &str, from: Value, to: Value) -> ChangesetId {
        let change = Change::update(annie(), map(&[(key, from)]), map(&[(key, to)]));
        self.changes(parent, vec![change])
    }

    pub fn changes(&mut self, parent: ChangesetId, changes: Vec<Change>) -> ChangesetId {
        let meta = self.meta("edit");
        self.put(Changeset::new(changes, meta).unwrap().following(Some(parent)))
    }

    pub fn merge(&mut self, closing: ChangesetId, continuing: ChangesetId) -> ChangesetId {
        let meta = self.meta("merge");
        self.put(
            Changeset::empty(meta)
                .following(Some(continuing))
                .closing(closing),
        )
    }

    /// A mergeset carrying `changes`, the way a real merge does.
    pub fn merge_with(&mut self, closing: ChangesetId, continuing: ChangesetId, changes: Vec<Change>) -> ChangesetId {
        let meta = self.meta("merge");
        self.put(
            Changeset::new(changes, meta)
                .unwrap()
                .following(Some(continuing))
                .closing(closing),
        )
    }

    /// A changeset whose parent is not known locally.
    pub fn orphan(&mut self) -> ChangesetId {
        let meta = self.meta("pulled");
        let change = Change::create(EntityRef::parse("/package/orphan").unwrap(), map(&[("a", json!(1))]));
        self.put(
            Changeset::new(vec![change], meta)
                .unwrap()
                .following(Some(ChangesetId::new())),
        )
    }
}
