//! Coalescing successive changes on the same entity.
//!
//! Two changes `first` then `second` on one entity compose into a single
//! change whose `old` side is the state before `first` and whose `new` side
//! is the state after `second`. A composition that ends where it started
//! cancels out.

use std::collections::{BTreeSet, HashMap};

use changes_types::{AttrMap, Change, ChangeKind, EntityRef};
use tracing::trace;

use crate::attrs::change_between;

/// Compose two successive changes on the same entity.
///
/// Returns `None` when the pair has no net effect (e.g. create then delete).
pub fn compose(first: &Change, second: &Change) -> Option<Change> {
    debug_assert_eq!(first.entity(), second.entity());
    let entity = first.entity();

    match (first.kind(), second.kind()) {
        // Both sides are full states.
        (ChangeKind::Delete, ChangeKind::Create) => {
            change_between(entity, first.old_state(), second.new_state())
        }
        (ChangeKind::Create, ChangeKind::Update | ChangeKind::Delete) => second
            .apply_to(first.new_state())
            .map(|state| Change::create(entity.clone(), state)),
        (ChangeKind::Update, ChangeKind::Delete) => {
            let original = first.invert().apply_to(second.old_state())?;
            Some(Change::delete(entity.clone(), original))
        }
        (ChangeKind::Update, ChangeKind::Update) => compose_updates(entity, first, second),
        // Out-of-order sequences (a create on a live entity, an edit after a
        // delete): keep the outer states.
        _ => Change::new(
            entity.clone(),
            first.old_state().cloned(),
            second.new_state().cloned(),
        )
        .ok(),
    }
}

fn compose_updates(entity: &EntityRef, first: &Change, second: &Change) -> Option<Change> {
    let first_keys = first.touched_keys();
    let second_keys = second.touched_keys();
    let keys: BTreeSet<&str> = first_keys.union(&second_keys).copied().collect();

    let mut old = AttrMap::new();
    let mut new = AttrMap::new();
    for key in keys {
        let before = if first_keys.contains(key) {
            first.old_value(key)
        } else {
            second.old_value(key)
        };
        let after = if second_keys.contains(key) {
            second.new_value(key)
        } else {
            first.new_value(key)
        };
        if before != after {
            before.write_into(&mut old, key);
            after.write_into(&mut new, key);
        }
    }

    if old.is_empty() && new.is_empty() {
        None
    } else {
        Some(Change::update(entity.clone(), old, new))
    }
}

/// Coalesce an ordered change list into at most one change per entity.
///
/// Entities keep the position of their first appearance.
pub fn reduce<I>(changes: I) -> Vec<Change>
where
    I: IntoIterator<Item = Change>,
{
    let mut slots: Vec<(EntityRef, Option<Change>)> = Vec::new();
    let mut index: HashMap<EntityRef, usize> = HashMap::new();

    for change in changes {
        match index.get(change.entity()) {
            Some(&i) => {
                let slot = &mut slots[i].1;
                *slot = match slot.take() {
                    Some(previous) => compose(&previous, &change),
                    None => Some(change),
                };
            }
            None => {
                index.insert(change.entity().clone(), slots.len());
                slots.push((change.entity().clone(), Some(change)));
            }
        }
    }

    let reduced: Vec<Change> = slots.into_iter().filter_map(|(_, c)| c).collect();
    trace!(entities = reduced.len(), "reduced change list");
    reduced
}

/// Invert a change list: each change inverted, in reverse order.
pub fn invert_all(changes: &[Change]) -> Vec<Change> {
    changes.iter().rev().map(Change::invert).collect()
}
