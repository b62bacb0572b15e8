//! The atomic unit of change: one entity's before/after attribute state.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entity::EntityRef;
use crate::error::{TypeError, TypeResult};
use crate::value::{AttrMap, FieldValue};

/// What a [`Change`] does to its entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// The entity did not exist before (`old` is absent).
    Create,
    /// The entity existed before and after.
    Update,
    /// The entity no longer exists (`new` is absent).
    Delete,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "created"),
            Self::Update => write!(f, "updated"),
            Self::Delete => write!(f, "deleted"),
        }
    }
}

/// An immutable diff for one entity.
///
/// Creations carry the full new record and deletions the full old record.
/// Updates carry only the attributes that changed: a key present in `new`
/// but not in `old` was added, a key present in `old` but not in `new` was
/// removed.
///
/// Serialized as `{"ref": "/kind/id", "diff": {"old": ..., "new": ...}}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ChangeRecord", into = "ChangeRecord")]
pub struct Change {
    entity: EntityRef,
    old: Option<AttrMap>,
    new: Option<AttrMap>,
}

impl Change {
    /// Construct a change, rejecting one with neither side present.
    pub fn new(entity: EntityRef, old: Option<AttrMap>, new: Option<AttrMap>) -> TypeResult<Self> {
        if old.is_none() && new.is_none() {
            return Err(TypeError::EmptyChange(entity.to_string()));
        }
        Ok(Self { entity, old, new })
    }

    /// A change creating `entity` with the given full state.
    pub fn create(entity: EntityRef, new: AttrMap) -> Self {
        Self {
            entity,
            old: None,
            new: Some(new),
        }
    }

    /// A change editing attributes of an existing entity.
    pub fn update(entity: EntityRef, old: AttrMap, new: AttrMap) -> Self {
        Self {
            entity,
            old: Some(old),
            new: Some(new),
        }
    }

    /// A change deleting `entity`, whose last full state was `old`.
    pub fn delete(entity: EntityRef, old: AttrMap) -> Self {
        Self {
            entity,
            old: Some(old),
            new: None,
        }
    }

    /// The entity this change targets.
    pub fn entity(&self) -> &EntityRef {
        &self.entity
    }

    /// State before the change, absent for creations.
    pub fn old_state(&self) -> Option<&AttrMap> {
        self.old.as_ref()
    }

    /// State after the change, absent for deletions.
    pub fn new_state(&self) -> Option<&AttrMap> {
        self.new.as_ref()
    }

    /// Classify the change.
    pub fn kind(&self) -> ChangeKind {
        match (&self.old, &self.new) {
            (None, _) => ChangeKind::Create,
            (Some(_), None) => ChangeKind::Delete,
            (Some(_), Some(_)) => ChangeKind::Update,
        }
    }

    /// Attribute names this change has an opinion about.
    pub fn touched_keys(&self) -> BTreeSet<&str> {
        self.old
            .iter()
            .chain(self.new.iter())
            .flat_map(|m| m.keys().map(String::as_str))
            .collect()
    }

    /// Value of `key` before the change.
    pub fn old_value(&self, key: &str) -> FieldValue {
        FieldValue::lookup(self.old.as_ref(), key)
    }

    /// Value of `key` after the change.
    pub fn new_value(&self, key: &str) -> FieldValue {
        FieldValue::lookup(self.new.as_ref(), key)
    }

    /// The change that undoes this one.
    pub fn invert(&self) -> Self {
        Self {
            entity: self.entity.clone(),
            old: self.new.clone(),
            new: self.old.clone(),
        }
    }

    /// The state produced by applying this change on top of `state`.
    ///
    /// Creations and deletions replace the state wholesale; updates only
    /// touch the attributes they carry.
    pub fn apply_to(&self, state: Option<&AttrMap>) -> Option<AttrMap> {
        let new = self.new.as_ref()?;
        let Some(old) = self.old.as_ref() else {
            return Some(new.clone());
        };

        let mut next = state.cloned().unwrap_or_default();
        for key in old.keys().filter(|k| !new.contains_key(*k)) {
            next.remove(key);
        }
        for (key, value) in new {
            next.insert(key.clone(), value.clone());
        }
        Some(next)
    }

    /// Decompose into `(entity, old, new)`.
    pub fn into_parts(self) -> (EntityRef, Option<AttrMap>, Option<AttrMap>) {
        (self.entity, self.old, self.new)
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.entity, self.kind())
    }
}

#[derive(Serialize, Deserialize)]
struct ChangeRecord {
    #[serde(rename = "ref")]
    entity: EntityRef,
    diff: DiffRecord,
}

#[derive(Serialize, Deserialize)]
struct DiffRecord {
    #[serde(default)]
    old: Option<AttrMap>,
    #[serde(default)]
    new: Option<AttrMap>,
}

impl TryFrom<ChangeRecord> for Change {
    type Error = TypeError;

    fn try_from(record: ChangeRecord) -> Result<Self, Self::Error> {
        Change::new(record.entity, record.diff.old, record.diff.new)
    }
}

impl From<Change> for ChangeRecord {
    fn from(change: Change) -> Self {
        Self {
            entity: change.entity,
            diff: DiffRecord {
                old: change.old,
                new: change.new,
            },
        }
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
    fn rejects_change_without_sides() {
        let err = Change::new(annie(), None, None).unwrap_err();
        assert_eq!(err, TypeError::EmptyChange("/package/annie".into()));
    }

    #[test]
    fn classifies_kind() {
        let state = map(&[("title", json!("t"))]);
        assert_eq!(Change::create(annie(), state.clone()).kind(), ChangeKind::Create);
        assert_eq!(Change::delete(annie(), state.clone()).kind(), ChangeKind::Delete);
        assert_eq!(
            Change::update(annie(), state.clone(), state).kind(),
            ChangeKind::Update
        );
    }

    #[test]
    fn update_applies_only_touched_keys() {
        let live = map(&[("title", json!("orig")), ("license", json!("open"))]);
        let change = Change::update(
            annie(),
            map(&[("title", json!("orig")), ("notes", json!("gone"))]),
            map(&[("title", json!("corr"))]),
        );
        let next = change.apply_to(Some(&live)).unwrap();
        assert_eq!(next, map(&[("title", json!("corr")), ("license", json!("open"))]));
    }

    #[test]
    fn create_and_delete_replace_state() {
        let full = map(&[("name", json!("annie"))]);
        assert_eq!(Change::create(annie(), full.clone()).apply_to(None), Some(full.clone()));
        assert_eq!(Change::delete(annie(), full.clone()).apply_to(Some(&full)), None);
    }

    #[test]
    fn invert_swaps_sides() {
        let change = Change::create(annie(), map(&[("name", json!("annie"))]));
        let inverse = change.invert();
        assert_eq!(inverse.kind(), ChangeKind::Delete);
        assert_eq!(inverse.invert(), change);
    }

    #[test]
    fn touched_keys_union() {
        let change = Change::update(
            annie(),
            map(&[("a", json!(1))]),
            map(&[("b", json!(2))]),
        );
        let keys: Vec<&str> = change.touched_keys().into_iter().collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(change.old_value("b"), FieldValue::Unset);
        assert_eq!(change.new_value("b"), FieldValue::Value(json!(2)));
    }

    #[test]
    fn wire_form() {
        let change = Change::update(
            annie(),
            map(&[("title", json!("orig"))]),
            map(&[("title", json!("corr"))]),
        );
        let value = serde_json::to_value(&change).unwrap();
        assert_eq!(
            value,
            json!({"ref": "/package/annie", "diff": {"old": {"title": "orig"}, "new": {"title": "corr"}}})
        );
        let back: Change = serde_json::from_value(value).unwrap();
        assert_eq!(back, change);
    }

    #[test]
    fn wire_form_rejects_double_null() {
        let raw = json!({"ref": "/package/annie", "diff": {"old": null, "new": null}});
        assert!(serde_json::from_value::<Change>(raw).is_err());
    }
}
