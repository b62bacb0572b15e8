//! Walks over the ancestry graph.
//!
//! Walks never fail on ancestors that are not known locally (changesets
//! pulled before their parents); they simply stop there.

use std::collections::{HashMap, HashSet, VecDeque};

use changes_store::ChangesetStore;
use changes_types::{Changeset, ChangesetId};
use tracing::trace;

use crate::error::{DagError, DagResult};

/// Read a changeset that must exist.
pub(crate) fn load<S>(store: &S, id: &ChangesetId) -> DagResult<Changeset>
where
    S: ChangesetStore + ?Sized,
{
    store.get(id)?.ok_or(DagError::NotFound(*id))
}

/// Every known ancestor of `id`, including `id` itself at distance 0, with
/// its shortest distance over `follows_id` and `closes_id` edges.
pub fn ancestors<S>(store: &S, id: ChangesetId) -> DagResult<HashMap<ChangesetId, usize>>
where
    S: ChangesetStore + ?Sized,
{
    let start = load(store, &id)?;
    let mut distances = HashMap::from([(id, 0)]);
    let mut queue = VecDeque::from([(start, 0usize)]);

    while let Some((changeset, distance)) = queue.pop_front() {
        for parent in changeset.parents() {
            if distances.contains_key(&parent) {
                continue;
            }
            match store.get(&parent)? {
                Some(known) => {
                    distances.insert(parent, distance + 1);
                    queue.push_back((known, distance + 1));
                }
                None => trace!(changeset = %parent.short_id(), "ancestor not known locally"),
            }
        }
    }
    Ok(distances)
}

/// Whether `ancestor` is `descendant` or one of its ancestors.
pub fn is_ancestor<S>(store: &S, ancestor: ChangesetId, descendant: ChangesetId) -> DagResult<bool>
where
    S: ChangesetStore + ?Sized,
{
    Ok(ancestors(store, descendant)?.contains_key(&ancestor))
}

/// The changesets to apply, oldest first, to move from `from` to `to`.
///
/// Follows `follows_id` back from `to` until `from` is reached. A mergeset
/// that closes `from` also ends the walk: it carries the other line's
/// changes itself. With `from = None` the path starts at the root of `to`'s
/// line.
pub fn update_path<S>(store: &S, from: Option<ChangesetId>, to: ChangesetId) -> DagResult<Vec<Changeset>>
where
    S: ChangesetStore + ?Sized,
{
    walk_back(store, from, to, true)
}

/// The `follows_id` chain from `start` (exclusive) to `stop` (inclusive),
/// oldest first. `start = None` walks to the root.
pub(crate) fn follows_chain<S>(
    store: &S,
    start: Option<ChangesetId>,
    stop: ChangesetId,
) -> DagResult<Vec<Changeset>>
where
    S: ChangesetStore + ?Sized,
{
    walk_back(store, start, stop, false)
}

/// The nearest changeset on both `a`'s and `b`'s `follows_id` chains.
///
/// `None` when the chains share nothing known locally.
pub(crate) fn follows_fork<S>(store: &S, a: ChangesetId, b: ChangesetId) -> DagResult<Option<ChangesetId>>
where
    S: ChangesetStore + ?Sized,
{
    let mut on_a = HashSet::new();
    let mut current = Some(load(store, &a)?);
    while let Some(changeset) = current {
        on_a.insert(changeset.id());
        current = match changeset.follows_id() {
            Some(parent) => store.get(&parent)?,
            None => None,
        };
    }

    let mut current = Some(load(store, &b)?);
    while let Some(changeset) = current {
        if on_a.contains(&changeset.id()) {
            return Ok(Some(changeset.id()));
        }
        current = match changeset.follows_id() {
            Some(parent) => store.get(&parent)?,
            None => None,
        };
    }
    Ok(None)
}

fn walk_back<S>(
    store: &S,
    from: Option<ChangesetId>,
    to: ChangesetId,
    through_closes: bool,
) -> DagResult<Vec<Changeset>>
where
    S: ChangesetStore + ?Sized,
{
    let unreachable = |missing: ChangesetId| match from {
        Some(start) => DagError::Unreachable { start, stop: to },
        None => DagError::NotFound(missing),
    };

    let mut chain = Vec::new();
    let mut current = load(store, &to)?;
    loop {
        if Some(current.id()) == from {
            break;
        }
        let closes_from = through_closes && from.is_some() && current.closes_id() == from;
        let parent = current.follows_id();
        chain.push(current);
        if closes_from {
            break;
        }
        match parent {
            Some(parent) => {
                current = store.get(&parent)?.ok_or_else(|| unreachable(parent))?;
            }
            None if from.is_none() => break,
            None => return Err(unreachable(to)),
        }
    }

    chain.reverse();
    trace!(hops = chain.len(), to = %to.short_id(), "walked follows chain");
    Ok(chain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::Graph;
    use serde_json::json;

    #[test]
    fn ancestors_include_self_and_distances() {
        let mut g = Graph::new();
        let a = g.root();
        let b = g.edit(a, "title", json!("a"), json!("b"));
        let c = g.edit(b, "title", json!("b"), json!("c"));
        let distances = ancestors(&g.store, c).unwrap();
        assert_eq!(distances[&c], 0);
        assert_eq!(distances[&b], 1);
        assert_eq!(distances[&a], 2);
    }

    #[test]
    fn ancestors_cross_merge_edges() {
        let mut g = Graph::new();
        let a = g.root();
        let b = g.edit(a, "title", json!("a"), json!("b"));
        let d = g.edit(a, "license", json!("open"), json!("closed"));
        let m = g.merge(d, b);
        assert!(is_ancestor(&g.store, b, m).unwrap());
        assert!(is_ancestor(&g.store, d, m).unwrap());
        assert!(!is_ancestor(&g.store, m, b).unwrap());
    }

    #[test]
    fn unknown_ancestors_stop_the_walk() {
        let mut g = Graph::new();
        let orphan = g.orphan();
        let distances = ancestors(&g.store, orphan).unwrap();
        assert_eq!(distances.len(), 1);
    }

    #[test]
    fn update_path_linear() {
        let mut g = Graph::new();
        let a = g.root();
        let b = g.edit(a, "title", json!("a"), json!("b"));
        let c = g.edit(b, "title", json!("b"), json!("c"));
        let ids: Vec<_> = update_path(&g.store, Some(a), c).unwrap().iter().map(|c| c.id()).collect();
        assert_eq!(ids, vec![b, c]);
        assert!(update_path(&g.store, Some(c), c).unwrap().is_empty());
    }

    #[test]
    fn update_path_from_nothing_starts_at_root() {
        let mut g = Graph::new();
        let a = g.root();
        let b = g.edit(a, "title", json!("a"), json!("b"));
        let ids: Vec<_> = update_path(&g.store, None, b).unwrap().iter().map(|c| c.id()).collect();
        assert_eq!(ids, vec![a, b]);
    }

    #[test]
    fn update_path_through_closing_mergeset() {
        let mut g = Graph::new();
        let a = g.root();
        let b = g.edit(a, "title", json!("a"), json!("b"));
        let d = g.edit(a, "license", json!("open"), json!("closed"));
        let m = g.merge(b, d);
        let ids: Vec<_> = update_path(&g.store, Some(b), m).unwrap().iter().map(|c| c.id()).collect();
        assert_eq!(ids, vec![m]);
        let ids: Vec<_> = update_path(&g.store, Some(d), m).unwrap().iter().map(|c| c.id()).collect();
        assert_eq!(ids, vec![m]);
    }

    #[test]
    fn follows_fork_ignores_merge_edges() {
        let mut g = Graph::new();
        let a = g.root();
        let b = g.edit(a, "title", json!("a"), json!("b"));
        let d = g.edit(a, "license", json!("open"), json!("closed"));
        let m = g.merge(b, d);
        assert_eq!(follows_fork(&g.store, b, m).unwrap(), Some(a));
        assert_eq!(follows_fork(&g.store, d, m).unwrap(), Some(d));
        assert_eq!(follows_fork(&g.store, m, m).unwrap(), Some(m));

        let other = g.root();
        assert_eq!(follows_fork(&g.store, other, m).unwrap(), None);
    }

    #[test]
    fn update_path_to_sibling_is_unreachable() {
        let mut g = Graph::new();
        let a = g.root();
        let b = g.edit(a, "title", json!("a"), json!("b"));
        let d = g.edit(a, "license", json!("open"), json!("closed"));
        assert!(matches!(
            update_path(&g.store, Some(b), d),
            Err(DagError::Unreachable { .. })
        ));
    }
}
