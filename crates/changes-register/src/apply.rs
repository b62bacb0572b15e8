//! Checking a change against the live state of its entity.
//!
//! A change is safe to apply when, for every attribute it touches, the live
//! value is either the change's `old` value (the edit has not happened yet)
//! or its `new` value (it already has). Anything else means someone else
//! edited the attribute and applying would silently lose that edit.

use changes_diff::Conflict;
use changes_types::{AttrMap, Change, ChangeKind, FieldValue};

/// The first disagreement between `change` and the live state, if any.
///
/// In the returned conflict the closing side is the change's `new` value and
/// the continuing side is the live value.
pub fn live_conflict(change: &Change, live: Option<&AttrMap>) -> Option<Conflict> {
    let entity = change.entity().clone();
    match (change.kind(), live) {
        (ChangeKind::Create, None) | (ChangeKind::Delete, None) => None,
        (ChangeKind::Create, Some(live)) => (Some(live) != change.new_state())
            .then(|| Conflict::on_entity(entity, None, change.new_state(), Some(live))),
        (ChangeKind::Delete, Some(live)) => (Some(live) != change.old_state())
            .then(|| Conflict::on_entity(entity, change.old_state(), None, Some(live))),
        (ChangeKind::Update, None) => Some(Conflict::on_entity(
            entity,
            change.old_state(),
            change.new_state(),
            None,
        )),
        (ChangeKind::Update, Some(live)) => change.touched_keys().into_iter().find_map(|key| {
            let current = FieldValue::lookup(Some(live), key);
            let old = change.old_value(key);
            let new = change.new_value(key);
            (current != old && current != new)
                .then(|| Conflict::on_field(entity.clone(), key, old, new, current))
        }),
    }
}

/// Classify the effect of moving an entity from `before` to `after`.
pub fn effect(before: Option<&AttrMap>, after: Option<&AttrMap>) -> Option<ChangeKind> {
    match (before, after) {
        (None, None) => None,
        (None, Some(_)) => Some(ChangeKind::Create),
        (Some(_), None) => Some(ChangeKind::Delete),
        (Some(b), Some(a)) if b == a => None,
        (Some(_), Some(_)) => Some(ChangeKind::Update),
    }
}
