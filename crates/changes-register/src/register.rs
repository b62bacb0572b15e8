//! The register façade.
//!
//! # State machine
//!
//! A fresh register has no working changeset. The first `commit` (or the
//! first `update`) sets one, and from then on exactly one changeset is
//! working: the most recently committed or updated-to. The entity model may
//! hold revisions that are not yet committed; `update` refuses to run until
//! they are.
//!
//! # Locking
//!
//! Every operation that writes to the store or the model holds the
//! register's writer lock for its whole duration, so commit and
//! advance-working are never interleaved with another writer. Reads go
//! straight to the store.

use std::sync::{Mutex, MutexGuard};

use serde_json::Value;
use tracing::{debug, info, warn};

use changes_dag::{ancestry, Heads, Intersection, Range};
use changes_diff::{change_between, invert_all, reduce};
use changes_merge::{ConflictResolver, Merge};
use changes_store::{Changemask, ChangesetStore, EntityModel, Revision, RevisionDraft};
use changes_sync::{decode_all, ChangesetSource};
use changes_types::{Change, Changeset, ChangesetId, ChangesetMeta, RevisionId};

use crate::apply::{effect, live_conflict};
use crate::error::{RegisterError, RegisterResult};
use crate::moderate::{ModerationDecision, Moderator};
use crate::report::{ChangesetLog, UpdateOutcome, UpdateReport};

/// Author used when none is configured.
pub const DEFAULT_AUTHOR: &str = "changes";

/// Changeset register over a changeset store `S` and an entity model `M`.
pub struct ChangesetRegister<S, M> {
    store: S,
    model: M,
    writer: Mutex<()>,
    author: String,
    branch: Option<String>,
}

impl<S, M> ChangesetRegister<S, M>
where
    S: ChangesetStore,
    M: EntityModel,
{
    pub fn new(store: S, model: M) -> Self {
        Self {
            store,
            model,
            writer: Mutex::new(()),
            author: DEFAULT_AUTHOR.to_string(),
            branch: None,
        }
    }

    /// Author recorded on bootstrap changesets, mergesets and changemasks.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    /// Branch label given to newly committed changesets.
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn into_parts(self) -> (S, M) {
        (self.store, self.model)
    }

    fn lock(&self) -> RegisterResult<MutexGuard<'_, ()>> {
        self.writer
            .lock()
            .map_err(|e| RegisterError::LockPoisoned(e.to_string()))
    }

    // ---------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------

    pub fn get(&self, id: &ChangesetId) -> RegisterResult<Option<Changeset>> {
        Ok(self.store.get(id)?)
    }

    /// Read a changeset that must exist.
    pub fn require(&self, id: &ChangesetId) -> RegisterResult<Changeset> {
        self.store.get(id)?.ok_or(RegisterError::NotFound(*id))
    }

    pub fn len(&self) -> RegisterResult<usize> {
        Ok(self.store.len()?)
    }

    pub fn is_empty(&self) -> RegisterResult<bool> {
        Ok(self.store.is_empty()?)
    }

    /// All changesets, oldest first.
    pub fn changesets(&self) -> RegisterResult<Vec<Changeset>> {
        Ok(self.store.all()?)
    }

    pub fn get_working(&self) -> RegisterResult<Option<Changeset>> {
        match self.store.working()? {
            Some(id) => Ok(Some(self.require(&id)?)),
            None => Ok(None),
        }
    }

    /// Branch tips, oldest first.
    pub fn heads(&self) -> RegisterResult<Vec<ChangesetId>> {
        Ok(Heads::scan(&self.store)?.ids())
    }

    pub fn changemasks(&self) -> RegisterResult<Vec<Changemask>> {
        Ok(self.store.changemasks()?)
    }

    /// Model revisions not yet turned into changesets, oldest first.
    pub fn outstanding_revisions(&self) -> RegisterResult<Vec<Revision>> {
        let mut outstanding = Vec::new();
        for revision in self.model.revisions()? {
            if !self.store.is_committed(&revision.id)? {
                outstanding.push(revision);
            }
        }
        Ok(outstanding)
    }

    /// Net changes from `start` to `stop`.
    ///
    /// Without `start`, the changes `stop` itself carries. When `stop` does
    /// not descend from `start`, the result goes back from `start` to the
    /// common ancestor and forward again to `stop`.
    pub fn diff(&self, start: Option<ChangesetId>, stop: ChangesetId) -> RegisterResult<Vec<Change>> {
        let Some(start) = start else {
            return Ok(reduce(self.require(&stop)?.changes().to_vec()));
        };
        if ancestry::is_ancestor(&self.store, start, stop)? {
            return Ok(Range::new(&self.store, start, stop)?.calc_changes());
        }
        let ancestor = Intersection::new(&self.store, start, stop).find()?;
        let back = Range::new(&self.store, ancestor.id(), start)?.calc_changes();
        let forward = Range::new(&self.store, ancestor.id(), stop)?.calc_changes();
        Ok(reduce(invert_all(&back).into_iter().chain(forward)))
    }

    /// Summaries of one changeset, or of all of them oldest first.
    pub fn log(&self, id: Option<ChangesetId>) -> RegisterResult<Vec<ChangesetLog>> {
        let working = self.store.working()?;
        let changesets = match id {
            Some(id) => vec![self.require(&id)?],
            None => self.store.all()?,
        };
        Ok(changesets
            .iter()
            .map(|changeset| ChangesetLog::new(changeset, working))
            .collect())
    }

    // ---------------------------------------------------------------
    // Commit
    // ---------------------------------------------------------------

    /// Turn every outstanding revision into a changeset, in revision order.
    ///
    /// Each new changeset follows the previous working one and becomes
    /// working. A register that has never held a changeset and has nothing
    /// outstanding gets one empty bootstrap changeset instead.
    pub fn commit(&self) -> RegisterResult<Vec<ChangesetId>> {
        let _guard = self.lock()?;
        let outstanding = self.outstanding_revisions()?;

        if outstanding.is_empty() {
            if self.store.is_empty()? {
                let bootstrap = self.branded(Changeset::empty(ChangesetMeta::new(
                    self.author.clone(),
                    "bootstrap",
                )));
                let id = bootstrap.id();
                self.store.insert(bootstrap)?;
                self.store.set_working(id)?;
                info!(changeset = %id.short_id(), "bootstrapped empty register");
                return Ok(vec![id]);
            }
            debug!("nothing to commit");
            return Ok(Vec::new());
        }

        let mut committed = Vec::new();
        for revision in &outstanding {
            if let Some(id) = self.commit_revision(revision)? {
                committed.push(id);
            }
        }
        info!(
            revisions = outstanding.len(),
            changesets = committed.len(),
            "committed revisions"
        );
        Ok(committed)
    }

    /// Build, store and check out the changeset for one revision.
    ///
    /// A revision with no net change yields no changeset but is still marked
    /// committed.
    pub fn construct_from_revision(&self, revision: &Revision) -> RegisterResult<Option<ChangesetId>> {
        let _guard = self.lock()?;
        self.commit_revision(revision)
    }

    fn commit_revision(&self, revision: &Revision) -> RegisterResult<Option<ChangesetId>> {
        let changes: Vec<Change> = revision
            .entries
            .iter()
            .filter_map(|entry| change_between(&entry.entity, entry.before.as_ref(), entry.after.as_ref()))
            .collect();

        if changes.is_empty() {
            self.store.mark_committed(revision.id, None)?;
            debug!(revision = %revision.id.short_id(), "revision has no net change");
            return Ok(None);
        }

        let meta = ChangesetMeta::new(revision.author.clone(), revision.log_message.clone());
        let changeset = self.branded(
            Changeset::new(changes, meta)?
                .following(self.store.working()?)
                .from_revision(revision.id),
        );
        let id = changeset.id();
        debug!(
            changeset = %id.short_id(),
            revision = %revision.id.short_id(),
            changes = changeset.changes().len(),
            "constructed changeset from revision"
        );
        self.store.insert(changeset)?;
        self.store.set_working(id)?;
        Ok(Some(id))
    }

    fn branded(&self, changeset: Changeset) -> Changeset {
        match &self.branch {
            Some(branch) => changeset.on_branch(branch.clone()),
            None => changeset,
        }
    }

    // ---------------------------------------------------------------
    // Update / apply
    // ---------------------------------------------------------------

    /// Bring the model up to `target` (default: the most recent head that
    /// descends from the working changeset, else the most recent head).
    ///
    /// A change that conflicts with live state fails the update unless its
    /// entity is masked, in which case it is skipped.
    pub fn update(&self, target: Option<ChangesetId>) -> RegisterResult<UpdateOutcome> {
        self.update_with(target, None)
    }

    /// Like [`update`](Self::update), but every change is first offered to
    /// `moderator`.
    pub fn update_moderated(
        &self,
        target: Option<ChangesetId>,
        moderator: &mut dyn Moderator,
    ) -> RegisterResult<UpdateOutcome> {
        self.update_with(target, Some(moderator))
    }

    fn update_with(
        &self,
        target: Option<ChangesetId>,
        mut moderator: Option<&mut (dyn Moderator + '_)>,
    ) -> RegisterResult<UpdateOutcome> {
        let _guard = self.lock()?;

        if self.store.is_empty()? {
            return Ok(UpdateOutcome::NothingCommitted);
        }
        let outstanding = self.outstanding_revisions()?.len();
        if outstanding > 0 {
            return Err(RegisterError::UncommittedChanges(outstanding));
        }

        let working = self.store.working()?;
        let target = match target {
            Some(id) => self.require(&id)?.id(),
            None => match self.default_target(working)? {
                Some(id) => id,
                None => return Ok(UpdateOutcome::NothingCommitted),
            },
        };
        if let Some(working) = working {
            if ancestry::is_ancestor(&self.store, target, working)? {
                return Ok(UpdateOutcome::AlreadyAtHead);
            }
        }

        let path = ancestry::update_path(&self.store, working, target)?;
        let mut report = UpdateReport::default();
        let mut previous = working;
        for changeset in &path {
            let changes = match previous {
                // Entered from the closed side: its changes are relative to
                // the continuing line, so bring over the whole difference.
                Some(from) if changeset.closes_id() == Some(from) => {
                    Range::new(&self.store, from, changeset.id())?.calc_changes()
                }
                _ => changeset.changes().to_vec(),
            };
            self.apply_changeset(changeset, &changes, false, moderator.as_deref_mut(), &mut report)?;
            self.store.set_working(changeset.id())?;
            previous = Some(changeset.id());
        }

        info!(
            target = %target.short_id(),
            changesets = report.applied.len(),
            entities = report.entries.len(),
            "updated working copy"
        );
        Ok(UpdateOutcome::Applied(report))
    }

    fn default_target(&self, working: Option<ChangesetId>) -> RegisterResult<Option<ChangesetId>> {
        let heads = Heads::scan(&self.store)?;
        if let Some(working) = working {
            for head in heads.changesets().iter().rev() {
                if ancestry::is_ancestor(&self.store, working, head.id())? {
                    return Ok(Some(head.id()));
                }
            }
        }
        Ok(heads.latest().map(Changeset::id))
    }

    /// Apply one changeset to the model as exactly one revision.
    ///
    /// Refuses with `Conflict` when a change disagrees with live state,
    /// unless `forced`, in which case the changeset's values overwrite it.
    /// The working pointer is not moved.
    pub fn apply(&self, id: ChangesetId, forced: bool) -> RegisterResult<RevisionId> {
        let _guard = self.lock()?;
        let changeset = self.require(&id)?;
        let mut report = UpdateReport::default();
        self.apply_changeset(&changeset, changeset.changes(), forced, None, &mut report)
    }

    /// Apply `changes` on behalf of `changeset`.
    fn apply_changeset(
        &self,
        changeset: &Changeset,
        changes: &[Change],
        forced: bool,
        mut moderator: Option<&mut (dyn Moderator + '_)>,
        report: &mut UpdateReport,
    ) -> RegisterResult<RevisionId> {
        // Decide everything before writing anything.
        let mut draft = RevisionDraft::new(
            changeset.meta().author.clone(),
            changeset.meta().log_message.clone(),
        );
        let mut effects = Vec::new();

        for change in changes {
            let entity = change.entity();
            let live = self.model.get(entity)?;
            let conflict = live_conflict(change, live.as_ref());

            if conflict.is_some() && self.store.is_masked(entity)? {
                warn!(entity = %entity, "conflict masked, change skipped");
                report.masked.push(entity.clone());
                continue;
            }

            if let Some(moderator) = moderator.as_deref_mut() {
                match moderator.moderate(changeset, change, conflict.as_ref()) {
                    ModerationDecision::Apply => {}
                    ModerationDecision::Skip => {
                        warn!(entity = %entity, "change skipped by moderator");
                        report.skipped.push(entity.clone());
                        continue;
                    }
                    ModerationDecision::Mask => {
                        warn!(entity = %entity, "change skipped and entity masked");
                        self.store
                            .add_changemask(Changemask::new(entity.clone(), self.author.clone()))?;
                        report.skipped.push(entity.clone());
                        continue;
                    }
                }
            } else if let Some(conflict) = conflict.as_ref() {
                if !forced {
                    return Err(RegisterError::from(conflict.clone()));
                }
                warn!(
                    entity = %entity,
                    field = conflict.field.as_deref().unwrap_or("*"),
                    live = %conflict.continuing,
                    old = %conflict.base,
                    new = %conflict.closing,
                    "forced overwrite of diverged live state"
                );
            }

            let after = change.apply_to(live.as_ref());
            if let Some(kind) = effect(live.as_ref(), after.as_ref()) {
                debug!(entity = %entity, %kind, changeset = %changeset.id().short_id(), "applying change");
                draft = match after {
                    Some(state) => draft.put(entity.clone(), state),
                    None => draft.remove(entity.clone()),
                };
                effects.push((entity.clone(), kind));
            }
        }

        let revision = self.model.record(draft)?;
        self.store.mark_committed(revision.id, Some(changeset.id()))?;
        for (entity, kind) in effects {
            report.record(changeset.id(), entity, kind);
        }
        report.applied.push(changeset.id());
        Ok(revision.id)
    }

    // ---------------------------------------------------------------
    // Pull / ingest
    // ---------------------------------------------------------------

    /// Fetch changesets from `source` and store the unseen ones.
    ///
    /// Every payload is decoded before anything is stored, so a failed pull
    /// leaves the register untouched. The model is never modified.
    pub async fn pull<Src>(&self, source: &Src) -> RegisterResult<Vec<ChangesetId>>
    where
        Src: ChangesetSource + ?Sized,
    {
        let name = source.name();
        let payloads = source.fetch().await?;
        let decoded = decode_all(&name, &payloads)?;

        let _guard = self.lock()?;
        let mut added = Vec::new();
        for changeset in decoded {
            let id = changeset.id();
            if self.store.insert(changeset)? {
                added.push(id);
            }
        }
        info!(source = %name, fetched = payloads.len(), added = added.len(), "pulled changesets");
        Ok(added)
    }

    /// Store a changeset given in its canonical form.
    ///
    /// Its ancestors need not be known yet. Known ids are left untouched.
    pub fn add_unseen(&self, data: &Value) -> RegisterResult<ChangesetId> {
        let changeset = Changeset::from_dict(data)?;
        let id = changeset.id();
        let _guard = self.lock()?;
        if self.store.insert(changeset)? {
            debug!(changeset = %id.short_id(), "added unseen changeset");
        }
        Ok(id)
    }

    // ---------------------------------------------------------------
    // Merge
    // ---------------------------------------------------------------

    /// Merge `closing` into `continuing` and store the mergeset.
    ///
    /// The mergeset is not applied; `update` brings it into the model.
    pub fn merge<R>(
        &self,
        closing: ChangesetId,
        continuing: ChangesetId,
        resolver: &mut R,
    ) -> RegisterResult<Changeset>
    where
        R: ConflictResolver + ?Sized,
    {
        let _guard = self.lock()?;
        let merge = Merge::new(&self.store, closing, continuing)?.with_author(self.author.clone());
        if merge.is_conflicting() {
            info!(conflicts = merge.conflicts().len(), "merge has conflicts");
        }
        let mergeset = merge.create_mergeset(resolver)?;
        self.store.insert(mergeset.clone())?;
        Ok(mergeset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use changes_diff::Conflict;
    use changes_merge::{AutoResolve, AutoResolvePreferClosing};
    use changes_store::{InMemoryChangesetStore, InMemoryModel};
    use changes_sync::MemorySource;
    use changes_types::{AttrMap, ChangeKind, EntityRef};
    use serde_json::json;

    type TestRegister = ChangesetRegister<InMemoryChangesetStore, InMemoryModel>;

    fn register() -> TestRegister {
        ChangesetRegister::new(InMemoryChangesetStore::new(), InMemoryModel::new()).with_author("admin")
    }

    fn annie() -> EntityRef {
        EntityRef::parse("/package/annie").unwrap()
    }

    fn map(pairs: &[(&str, &str)]) -> AttrMap {
        pairs.iter().map(|(k, v)| (k.to_string(), json!(v))).collect()
    }

    fn original() -> AttrMap {
        map(&[("title", "Annie Get Your Coat (orig)"), ("license", "open-orig")])
    }

    fn put(register: &TestRegister, state: AttrMap, message: &str) {
        register
            .model()
            .record(RevisionDraft::new("editor", message).put(annie(), state))
            .unwrap();
    }

    fn live(register: &TestRegister) -> Option<AttrMap> {
        register.model().get(&annie()).unwrap()
    }

    /// A changeset authored elsewhere, stored as if pulled.
    fn foreign(register: &TestRegister, parent: ChangesetId, old: AttrMap, new: AttrMap) -> ChangesetId {
        let changeset = Changeset::new(
            vec![Change::update(annie(), old, new)],
            ChangesetMeta::new("peer", "foreign edit"),
        )
        .unwrap()
        .following(Some(parent));
        register.add_unseen(&changeset.as_dict().unwrap()).unwrap()
    }

    /// Register holding annie in her original state as one committed changeset.
    fn seeded() -> (TestRegister, ChangesetId) {
        let register = register();
        put(&register, original(), "create annie");
        let ids = register.commit().unwrap();
        assert_eq!(ids.len(), 1);
        (register, ids[0])
    }

    #[test]
    fn commit_on_empty_register_bootstraps() {
        let register = register();
        let ids = register.commit().unwrap();
        assert_eq!(ids.len(), 1);

        let working = register.get_working().unwrap().unwrap();
        assert_eq!(working.id(), ids[0]);
        assert!(working.changes().is_empty());
        assert_eq!(working.meta().author, "admin");

        // A second commit has nothing to do.
        assert!(register.commit().unwrap().is_empty());
        assert_eq!(register.len().unwrap(), 1);
    }

    #[test]
    fn commit_chains_revisions_and_moves_working() {
        let (register, first) = seeded();
        let mut edited = original();
        edited.insert("title".into(), json!("Annie Get Your Coat (corr)"));
        put(&register, edited, "correct title");

        let ids = register.commit().unwrap();
        assert_eq!(ids.len(), 1);
        let second = register.require(&ids[0]).unwrap();
        assert_eq!(second.follows_id(), Some(first));
        assert_eq!(second.changes()[0].kind(), ChangeKind::Update);
        assert_eq!(second.changes()[0].touched_keys().into_iter().collect::<Vec<_>>(), vec!["title"]);
        assert_eq!(register.get_working().unwrap().unwrap().id(), second.id());
        assert!(register.outstanding_revisions().unwrap().is_empty());
    }

    #[test]
    fn revision_without_net_change_commits_nothing() {
        let (register, first) = seeded();
        put(&register, original(), "no-op save");
        assert!(register.commit().unwrap().is_empty());
        assert!(register.outstanding_revisions().unwrap().is_empty());
        assert_eq!(register.store().working().unwrap(), Some(first));
    }

    #[test]
    fn committed_changesets_replay_into_fresh_register() {
        let (source, first) = seeded();
        let mut edited = original();
        edited.insert("license".into(), json!("closed"));
        put(&source, edited.clone(), "close license");
        source.commit().unwrap();

        let target = register();
        assert_eq!(target.update(None).unwrap(), UpdateOutcome::NothingCommitted);
        for changeset in source.changesets().unwrap() {
            target.add_unseen(&changeset.as_dict().unwrap()).unwrap();
        }

        let outcome = target.update(None).unwrap();
        let report = outcome.report().unwrap();
        assert_eq!(report.applied.len(), 2);
        assert_eq!(report.applied[0], first);
        assert_eq!(report.created().count(), 1);
        assert_eq!(report.updated().count(), 1);
        assert_eq!(live(&target), Some(edited));

        // Update writes revisions that are already committed.
        assert!(target.outstanding_revisions().unwrap().is_empty());
        assert_eq!(target.update(None).unwrap(), UpdateOutcome::AlreadyAtHead);
    }

    #[test]
    fn update_refuses_uncommitted_revisions() {
        let (register, _) = seeded();
        put(&register, map(&[("title", "draft")]), "unsaved");
        let err = register.update(None).unwrap_err();
        assert!(matches!(err, RegisterError::UncommittedChanges(1)));
    }

    #[test]
    fn apply_merges_concurrent_attribute_edits() {
        let (register, root) = seeded();
        let mut corrected = original();
        corrected.insert("title".into(), json!("Annie Get Your Coat (corr)"));
        put(&register, corrected, "correct title");
        register.commit().unwrap();

        let license = foreign(
            &register,
            root,
            map(&[("license", "open-orig")]),
            map(&[("license", "closed-corr")]),
        );
        register.apply(license, false).unwrap();

        assert_eq!(
            live(&register),
            Some(map(&[("title", "Annie Get Your Coat (corr)"), ("license", "closed-corr")]))
        );
    }

    #[test]
    fn forced_apply_merges_concurrent_attribute_edits() {
        let (register, root) = seeded();
        let mut corrected = original();
        corrected.insert("title".into(), json!("Annie Get Your Coat (corr)"));
        put(&register, corrected, "correct title");
        let working = register.commit().unwrap()[0];

        let license = foreign(
            &register,
            root,
            map(&[("license", "open-orig")]),
            map(&[("license", "closed-corr")]),
        );
        let revision = register.apply(license, true).unwrap();

        assert_eq!(
            live(&register),
            Some(map(&[("title", "Annie Get Your Coat (corr)"), ("license", "closed-corr")]))
        );
        assert!(register.store().is_committed(&revision).unwrap());
        assert_eq!(register.store().working().unwrap(), Some(working));
    }

    #[test]
    fn apply_conflict_aborts_unless_forced() {
        let (register, root) = seeded();
        let mut edited = original();
        edited.insert("license".into(), json!("other"));
        put(&register, edited, "local license");
        register.commit().unwrap();

        let license = foreign(
            &register,
            root,
            map(&[("license", "open-orig")]),
            map(&[("license", "closed-corr")]),
        );
        let revisions = register.model().revisions().unwrap().len();
        let err = register.apply(license, false).unwrap_err();
        let conflict = err.conflict().unwrap();
        assert_eq!(conflict.field.as_deref(), Some("license"));
        assert_eq!(register.model().revisions().unwrap().len(), revisions);

        register.apply(license, true).unwrap();
        assert_eq!(live(&register).unwrap()["license"], json!("closed-corr"));
    }

    #[test]
    fn moderated_mask_suppresses_later_conflicts() {
        let (register, root) = seeded();
        let stale = foreign(
            &register,
            root,
            map(&[("title", "unknown")]),
            map(&[("title", "theirs")]),
        );

        let err = register.update(Some(stale)).unwrap_err();
        assert!(err.conflict().is_some());

        let mut asked = 0;
        let mut mask_all = |_: &Changeset, _: &Change, conflict: Option<&Conflict>| {
            asked += 1;
            assert!(conflict.is_some());
            ModerationDecision::Mask
        };
        let outcome = register.update_moderated(Some(stale), &mut mask_all).unwrap();
        assert_eq!(asked, 1);
        assert_eq!(outcome.report().unwrap().skipped, vec![annie()]);
        assert_eq!(register.changemasks().unwrap().len(), 1);
        assert_eq!(live(&register), Some(original()));

        let again = foreign(
            &register,
            stale,
            map(&[("title", "theirs")]),
            map(&[("title", "theirs again")]),
        );
        let outcome = register.update(Some(again)).unwrap();
        assert_eq!(outcome.report().unwrap().masked, vec![annie()]);
        assert_eq!(register.store().working().unwrap(), Some(again));
        assert_eq!(live(&register), Some(original()));
    }

    #[test]
    fn merge_of_disjoint_edits_updates_to_mergeset() {
        let (register, root) = seeded();
        let mut corrected = original();
        corrected.insert("title".into(), json!("corr"));
        put(&register, corrected, "correct title");
        let title = register.commit().unwrap()[0];
        let license = foreign(
            &register,
            root,
            map(&[("license", "open-orig")]),
            map(&[("license", "closed")]),
        );
        assert_eq!(register.heads().unwrap().len(), 2);

        let mergeset = register.merge(license, title, &mut AutoResolve).unwrap();
        assert_eq!(mergeset.follows_id(), Some(title));
        assert_eq!(mergeset.closes_id(), Some(license));
        assert_eq!(mergeset.meta().author, "admin");
        assert_eq!(register.heads().unwrap(), vec![mergeset.id()]);

        let outcome = register.update(None).unwrap();
        assert_eq!(outcome.report().unwrap().applied, vec![mergeset.id()]);
        assert_eq!(
            live(&register),
            Some(map(&[("title", "corr"), ("license", "closed")]))
        );
    }

    #[test]
    fn both_sides_converge_on_conflicting_mergeset() {
        let (x, root) = seeded();
        let orig = "Annie Get Your Coat (orig)";
        let ours = foreign(&x, root, map(&[("title", orig)]), map(&[("title", "ours")]));
        let theirs = foreign(&x, root, map(&[("title", orig)]), map(&[("title", "theirs")]));
        let y = register();
        for changeset in x.changesets().unwrap() {
            y.add_unseen(&changeset.as_dict().unwrap()).unwrap();
        }
        x.update(Some(ours)).unwrap();
        y.update(Some(theirs)).unwrap();
        assert_eq!(live(&y).unwrap()["title"], json!("theirs"));

        let mergeset = x.merge(theirs, ours, &mut AutoResolve).unwrap();
        y.add_unseen(&mergeset.as_dict().unwrap()).unwrap();

        // x continues from ours; y enters through the closed side.
        x.update(Some(mergeset.id())).unwrap();
        let outcome = y.update(Some(mergeset.id())).unwrap();
        assert_eq!(outcome.report().unwrap().applied, vec![mergeset.id()]);

        assert_eq!(x.store().working().unwrap(), Some(mergeset.id()));
        assert_eq!(y.store().working().unwrap(), Some(mergeset.id()));
        assert_eq!(live(&x).unwrap()["title"], json!("ours"));
        assert_eq!(live(&x), live(&y));
    }

    #[test]
    fn long_lived_branch_merges_twice() {
        let (register, root) = seeded();
        let orig = "Annie Get Your Coat (orig)";
        let b = foreign(&register, root, map(&[("title", orig)]), map(&[("title", "b")]));
        let d = foreign(
            &register,
            root,
            map(&[("license", "open-orig")]),
            map(&[("license", "closed")]),
        );
        let first = register.merge(b, d, &mut AutoResolve).unwrap();

        // Diff from a closed changeset to its mergeset.
        let changes = register.diff(Some(b), first.id()).unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].touched_keys().into_iter().collect::<Vec<_>>(), vec!["license"]);
        assert_eq!(changes[0].new_value("license").into_option(), Some(json!("closed")));

        let e = foreign(&register, b, map(&[("title", "b")]), map(&[("title", "e")]));
        let second = register.merge(e, first.id(), &mut AutoResolve).unwrap();
        assert_eq!(second.follows_id(), Some(first.id()));
        assert_eq!(second.closes_id(), Some(e));

        register.update(Some(second.id())).unwrap();
        assert_eq!(live(&register), Some(map(&[("title", "e"), ("license", "closed")])));
    }

    #[test]
    fn conflicting_merge_follows_resolver() {
        let (register, root) = seeded();
        let ours = foreign(&register, root, map(&[("title", "Annie Get Your Coat (orig)")]), map(&[("title", "ours")]));
        let theirs = foreign(&register, root, map(&[("title", "Annie Get Your Coat (orig)")]), map(&[("title", "theirs")]));

        let dropped = register.merge(theirs, ours, &mut AutoResolve).unwrap();
        assert!(dropped.changes().is_empty());

        let preferred = register
            .merge(theirs, ours, &mut AutoResolvePreferClosing)
            .unwrap();
        let change = &preferred.changes()[0];
        assert_eq!(change.old_value("title").into_option(), Some(json!("ours")));
        assert_eq!(change.new_value("title").into_option(), Some(json!("theirs")));
    }

    #[test]
    fn diff_across_branches_goes_through_ancestor() {
        let (register, root) = seeded();
        let title = foreign(
            &register,
            root,
            map(&[("title", "Annie Get Your Coat (orig)")]),
            map(&[("title", "corr")]),
        );
        let license = foreign(
            &register,
            root,
            map(&[("license", "open-orig")]),
            map(&[("license", "closed")]),
        );

        let changes = register.diff(Some(title), license).unwrap();
        assert_eq!(changes.len(), 1);
        let change = &changes[0];
        assert_eq!(change.new_value("title").into_option(), Some(json!("Annie Get Your Coat (orig)")));
        assert_eq!(change.new_value("license").into_option(), Some(json!("closed")));

        let own = register.diff(None, title).unwrap();
        assert_eq!(own.len(), 1);
        assert_eq!(register.diff(Some(root), title).unwrap(), own);
    }

    #[test]
    fn concurrent_commits_keep_one_linear_chain() {
        let (register, root) = seeded();
        for i in 0..8 {
            let mut edited = original();
            edited.insert("title".into(), json!(format!("title {i}")));
            put(&register, edited, "edit title");
        }

        let mut committed: Vec<ChangesetId> = std::thread::scope(|scope| {
            let workers: Vec<_> = (0..4)
                .map(|_| scope.spawn(|| register.commit().unwrap()))
                .collect();
            workers
                .into_iter()
                .flat_map(|worker| worker.join().unwrap())
                .collect()
        });
        assert_eq!(committed.len(), 8);

        let working = register.store().working().unwrap().unwrap();
        let mut chain = Vec::new();
        let mut current = Some(working);
        while let Some(id) = current.filter(|id| *id != root) {
            chain.push(id);
            current = register.require(&id).unwrap().follows_id();
        }
        assert_eq!(current, Some(root));

        chain.sort();
        committed.sort();
        assert_eq!(chain, committed);
        assert_eq!(register.heads().unwrap(), vec![working]);
        assert_eq!(live(&register).unwrap()["title"], json!("title 7"));
    }

    #[test]
    fn log_marks_working_changeset() {
        let (register, first) = seeded();
        let logs = register.log(None).unwrap();
        assert_eq!(logs.len(), 1);
        assert!(logs[0].is_working);
        assert_eq!(register.log(Some(first)).unwrap()[0].id, first);
        assert!(matches!(
            register.log(Some(ChangesetId::new())),
            Err(RegisterError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn pull_stores_unseen_changesets_once() {
        let (source, _) = seeded();
        let changesets = source.changesets().unwrap();
        let peer = MemorySource::from_changesets("peer", changesets.iter()).unwrap();

        let target = register();
        let added = target.pull(&peer).await.unwrap();
        assert_eq!(added.len(), 1);
        assert!(target.pull(&peer).await.unwrap().is_empty());
        // Pull never touches the model.
        assert!(target.model().revisions().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_pull_stores_nothing() {
        let (source, _) = seeded();
        let good = source.changesets().unwrap()[0].as_dict().unwrap();
        let peer = MemorySource::new("peer", vec![good, json!({"bogus": true})]);

        let target = register();
        let err = target.pull(&peer).await.unwrap_err();
        assert!(matches!(err, RegisterError::Sync(_)));
        assert!(target.is_empty().unwrap());
    }
}
