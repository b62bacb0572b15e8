//! Summing two change lists that diverge from a common base.
//!
//! Typical inputs are two ranges starting at the same ancestor: the
//! "closing" side (the line being merged in) and the "continuing" side (the
//! line the result will follow). Conflicts are detected per attribute, so
//! two sides editing different fields of one entity combine cleanly.

use std::collections::HashMap;

use changes_types::{AttrMap, Change, ChangeKind, EntityRef, FieldValue};
use tracing::debug;

use crate::attrs::change_between;
use crate::conflict::{Conflict, Resolution};
use crate::error::{DiffError, DiffResult};
use crate::reduce::reduce;

/// Combination of two change lists.
#[derive(Clone, Debug)]
pub struct Sum {
    closing: Vec<Change>,
    continuing: Vec<Change>,
}

impl Sum {
    /// Both lists are reduced first, so each side holds at most one change
    /// per entity.
    pub fn new(closing: Vec<Change>, continuing: Vec<Change>) -> Self {
        Self {
            closing: reduce(closing),
            continuing: reduce(continuing),
        }
    }

    /// Every conflict between the two sides, in entity order of appearance.
    pub fn conflicts(&self) -> Vec<Conflict> {
        self.pairs()
            .into_iter()
            .filter_map(|pair| match pair {
                Pair::Both(a, b) => Some(Overlap::new(a, b).conflicts()),
                _ => None,
            })
            .flatten()
            .collect()
    }

    pub fn is_conflicting(&self) -> bool {
        self.pairs().into_iter().any(|pair| match pair {
            Pair::Both(a, b) => !Overlap::new(a, b).conflicts().is_empty(),
            _ => false,
        })
    }

    /// Fail with the first conflict, if any.
    pub fn detect_conflict(&self) -> DiffResult<()> {
        match self.conflicts().into_iter().next() {
            Some(conflict) => Err(DiffError::from(conflict)),
            None => Ok(()),
        }
    }

    /// The combined list. Fails if the sides conflict.
    pub fn calc_changes(&self) -> DiffResult<Vec<Change>> {
        self.detect_conflict()?;
        Ok(self.combine(|_| Resolution::Drop))
    }

    /// The combined list, settling each conflict with `resolve`.
    ///
    /// A resolved attribute is expressed relative to the continuing side's
    /// value, so the result applies cleanly on top of the continuing line.
    pub fn combine<F>(&self, mut resolve: F) -> Vec<Change>
    where
        F: FnMut(&Conflict) -> Resolution,
    {
        self.pairs()
            .into_iter()
            .filter_map(|pair| match pair {
                Pair::Closing(a) => Some(a.clone()),
                Pair::Continuing(b) => Some(b.clone()),
                Pair::Both(a, b) => Overlap::new(a, b).resolve(&mut resolve),
            })
            .collect()
    }

    fn pairs(&self) -> Vec<Pair<'_>> {
        let continuing: HashMap<&EntityRef, &Change> =
            self.continuing.iter().map(|c| (c.entity(), c)).collect();
        let mut pairs: Vec<Pair<'_>> = self
            .closing
            .iter()
            .map(|a| match continuing.get(a.entity()) {
                Some(b) => Pair::Both(a, b),
                None => Pair::Closing(a),
            })
            .collect();

        let closing: HashMap<&EntityRef, &Change> =
            self.closing.iter().map(|c| (c.entity(), c)).collect();
        pairs.extend(
            self.continuing
                .iter()
                .filter(|b| !closing.contains_key(b.entity()))
                .map(Pair::Continuing),
        );
        pairs
    }
}

enum Pair<'a> {
    Closing(&'a Change),
    Continuing(&'a Change),
    Both(&'a Change, &'a Change),
}

// ---------------------------------------------------------------------------
// One entity touched by both sides
// ---------------------------------------------------------------------------

struct Overlap<'a> {
    closing: &'a Change,
    continuing: &'a Change,
}

impl<'a> Overlap<'a> {
    fn new(closing: &'a Change, continuing: &'a Change) -> Self {
        Self {
            closing,
            continuing,
        }
    }

    fn entity(&self) -> &EntityRef {
        self.closing.entity()
    }

    fn conflicts(&self) -> Vec<Conflict> {
        use ChangeKind::*;
        let (a, b) = (self.closing, self.continuing);
        match (a.kind(), b.kind()) {
            (Delete, Delete) => Vec::new(),
            (Update, Update) => self
                .contested_fields()
                .into_iter()
                .map(|key| {
                    let base = if a.touched_keys().contains(key.as_str()) {
                        a.old_value(&key)
                    } else {
                        b.old_value(&key)
                    };
                    Conflict::on_field(
                        self.entity().clone(),
                        key.clone(),
                        base,
                        a.new_value(&key),
                        b.new_value(&key),
                    )
                })
                .collect(),
            (Create, Create) => self
                .contested_fields()
                .into_iter()
                .map(|key| {
                    Conflict::on_field(
                        self.entity().clone(),
                        key.clone(),
                        FieldValue::Unset,
                        a.new_value(&key),
                        b.new_value(&key),
                    )
                })
                .collect(),
            _ => {
                let (base, closing, continuing) = self.entity_states();
                vec![Conflict::on_entity(
                    self.entity().clone(),
                    base.as_ref(),
                    closing.as_ref(),
                    continuing.as_ref(),
                )]
            }
        }
    }

    /// Attributes both sides have an opinion on but disagree about.
    fn contested_fields(&self) -> Vec<String> {
        let (a, b) = (self.closing, self.continuing);
        let a_keys = a.touched_keys();
        let b_keys = b.touched_keys();
        a_keys
            .union(&b_keys)
            .filter(|key| {
                let both = match (a.kind(), b.kind()) {
                    (ChangeKind::Create, ChangeKind::Create) => true,
                    _ => a_keys.contains(*key) && b_keys.contains(*key),
                };
                both && a.new_value(key) != b.new_value(key)
            })
            .map(|key| key.to_string())
            .collect()
    }

    /// `(base, closing result, continuing result)` as whole states, for
    /// entity-level conflicts.
    fn entity_states(&self) -> (Option<AttrMap>, Option<AttrMap>, Option<AttrMap>) {
        let (a, b) = (self.closing, self.continuing);
        let base = if a.kind() == ChangeKind::Delete {
            a.old_state().cloned()
        } else if b.kind() == ChangeKind::Delete {
            b.old_state().cloned()
        } else {
            None
        };
        let closing = a.apply_to(base.as_ref());
        let continuing = b.apply_to(base.as_ref());
        (base, closing, continuing)
    }

    fn resolve<F>(&self, resolve: &mut F) -> Option<Change>
    where
        F: FnMut(&Conflict) -> Resolution,
    {
        use ChangeKind::*;
        let (a, b) = (self.closing, self.continuing);
        match (a.kind(), b.kind()) {
            (Delete, Delete) => Some(a.clone()),
            (Update, Update) => self.resolve_updates(resolve),
            (Create, Create) => {
                let conflicts = self.conflicts();
                if conflicts.is_empty() {
                    return Some(a.clone());
                }
                let mut merged = b.new_state().cloned().unwrap_or_default();
                for conflict in &conflicts {
                    if let (Resolution::Closing, Some(field)) = (resolve(conflict), &conflict.field) {
                        conflict.closing.clone().write_into(&mut merged, field);
                    }
                }
                change_between(self.entity(), b.new_state(), Some(&merged))
            }
            _ => {
                let (base, closing, continuing) = self.entity_states();
                let conflict = Conflict::on_entity(
                    self.entity().clone(),
                    base.as_ref(),
                    closing.as_ref(),
                    continuing.as_ref(),
                );
                let resolution = resolve(&conflict);
                debug!(entity = %self.entity(), %resolution, "settled entity conflict");
                match resolution {
                    Resolution::Closing => {
                        change_between(self.entity(), continuing.as_ref(), closing.as_ref())
                    }
                    Resolution::Continuing | Resolution::Drop => None,
                }
            }
        }
    }

    fn resolve_updates<F>(&self, resolve: &mut F) -> Option<Change>
    where
        F: FnMut(&Conflict) -> Resolution,
    {
        let (a, b) = (self.closing, self.continuing);
        let a_keys = a.touched_keys();
        let b_keys = b.touched_keys();
        let mut old = AttrMap::new();
        let mut new = AttrMap::new();

        for key in a_keys.union(&b_keys) {
            let (before, after) = match (a_keys.contains(key), b_keys.contains(key)) {
                (true, false) => (a.old_value(key), a.new_value(key)),
                (false, _) => (b.old_value(key), b.new_value(key)),
                (true, true) if a.new_value(key) == b.new_value(key) => {
                    (b.old_value(key), b.new_value(key))
                }
                (true, true) => {
                    let conflict = Conflict::on_field(
                        self.entity().clone(),
                        *key,
                        a.old_value(key),
                        a.new_value(key),
                        b.new_value(key),
                    );
                    let resolution = resolve(&conflict);
                    debug!(entity = %self.entity(), field = %key, %resolution, "settled field conflict");
                    match conflict.winner(resolution) {
                        Some(winner) => (conflict.continuing.clone(), winner.clone()),
                        None => continue,
                    }
                }
            };
            if before != after {
                before.write_into(&mut old, key);
                after.write_into(&mut new, key);
            }
        }

        if old.is_empty() && new.is_empty() {
            None
        } else {
            Some(Change::update(self.entity().clone(), old, new))
        }
    }
}
