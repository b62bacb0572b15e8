//! Attribute-level diff: compare two entity states.
//!
//! States are `AttrMap`s. The diff keeps only the attributes whose value
//! differs, so an update carries exactly the fields it touched.

use changes_types::{AttrMap, Change, ChangeKind, EntityRef, FieldValue};

/// One attribute's transition inside a change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldChange {
    pub key: String,
    pub old: FieldValue,
    pub new: FieldValue,
}

impl FieldChange {
    /// Returns `true` if the attribute did not exist before.
    pub fn is_added(&self) -> bool {
        self.old.is_unset() && !self.new.is_unset()
    }

    /// Returns `true` if the attribute no longer exists.
    pub fn is_removed(&self) -> bool {
        !self.old.is_unset() && self.new.is_unset()
    }
}

/// Compute the minimal `(old, new)` attribute maps between two full states.
///
/// Keys whose value is identical on both sides are left out. Returns `None`
/// when the states are equal.
pub fn diff_states(before: &AttrMap, after: &AttrMap) -> Option<(AttrMap, AttrMap)> {
    let mut old = AttrMap::new();
    let mut new = AttrMap::new();

    for (key, old_val) in before {
        if after.get(key) != Some(old_val) {
            old.insert(key.clone(), old_val.clone());
        }
    }
    for (key, new_val) in after {
        if before.get(key) != Some(new_val) {
            new.insert(key.clone(), new_val.clone());
        }
    }

    if old.is_empty() && new.is_empty() {
        None
    } else {
        Some((old, new))
    }
}

/// The change turning `before` into `after`, or `None` if nothing changed.
pub fn change_between(
    entity: &EntityRef,
    before: Option<&AttrMap>,
    after: Option<&AttrMap>,
) -> Option<Change> {
    match (before, after) {
        (None, None) => None,
        (None, Some(after)) => Some(Change::create(entity.clone(), after.clone())),
        (Some(before), None) => Some(Change::delete(entity.clone(), before.clone())),
        (Some(before), Some(after)) => {
            diff_states(before, after).map(|(old, new)| Change::update(entity.clone(), old, new))
        }
    }
}

/// Per-attribute view of a change, in key order.
///
/// For creations every attribute goes from unset to its value; for
/// deletions every attribute goes from its value to unset.
pub fn field_changes(change: &Change) -> Vec<FieldChange> {
    change
        .touched_keys()
        .into_iter()
        .map(|key| FieldChange {
            key: key.to_string(),
            old: change.old_value(key),
            new: change.new_value(key),
        })
        .filter(|f| change.kind() != ChangeKind::Update || f.old != f.new)
        .collect()
}
