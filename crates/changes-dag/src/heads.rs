//! Branch tips.

use std::collections::HashSet;

use changes_store::ChangesetStore;
use changes_types::{Changeset, ChangesetId};

use crate::error::DagResult;

/// Changesets that no other changeset follows or closes, oldest first.
#[derive(Clone, Debug, Default)]
pub struct Heads {
    heads: Vec<Changeset>,
}

impl Heads {
    /// Scan every changeset in `store`.
    pub fn scan<S>(store: &S) -> DagResult<Self>
    where
        S: ChangesetStore + ?Sized,
    {
        let all = store.all()?;
        let referenced: HashSet<ChangesetId> = all.iter().flat_map(Changeset::parents).collect();
        // `all()` is already in (timestamp, id) order.
        let heads = all
            .into_iter()
            .filter(|changeset| !referenced.contains(&changeset.id()))
            .collect();
        Ok(Self { heads })
    }

    pub fn ids(&self) -> Vec<ChangesetId> {
        self.heads.iter().map(Changeset::id).collect()
    }

    pub fn changesets(&self) -> &[Changeset] {
        &self.heads
    }

    /// The most recent head.
    pub fn latest(&self) -> Option<&Changeset> {
        self.heads.last()
    }

    pub fn contains(&self, id: &ChangesetId) -> bool {
        self.heads.iter().any(|head| &head.id() == id)
    }

    pub fn len(&self) -> usize {
        self.heads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heads.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::Graph;
    use serde_json::json;

    #[test]
    fn empty_store_has_no_heads() {
        let g = Graph::new();
        let heads = Heads::scan(&g.store).unwrap();
        assert!(heads.is_empty());
        assert!(heads.latest().is_none());
    }

    #[test]
    fn three_branches_three_heads() {
        let mut g = Graph::new();
        let a = g.root();
        let b = g.edit(a, "title", json!("a"), json!("b"));
        let c = g.edit(b, "notes", json!("x"), json!("c"));
        let d = g.edit(b, "title", json!("b"), json!("d"));
        let e = g.edit(d, "title", json!("d"), json!("e"));
        let f = g.edit(b, "name", json!("annie"), json!("f"));
        let gg = g.edit(f, "name", json!("f"), json!("g"));

        let heads = Heads::scan(&g.store).unwrap();
        assert_eq!(heads.ids(), vec![c, e, gg]);
        assert!(!heads.contains(&a));
        assert!(!heads.contains(&b));
        assert_eq!(heads.latest().map(|h| h.id()), Some(gg));
    }

    #[test]
    fn merged_branch_is_not_a_head() {
        let mut g = Graph::new();
        let a = g.root();
        let b = g.edit(a, "title", json!("a"), json!("b"));
        let d = g.edit(a, "license", json!("open"), json!("closed"));
        let m = g.merge(b, d);
        assert_eq!(Heads::scan(&g.store).unwrap().ids(), vec![m]);
    }
}
