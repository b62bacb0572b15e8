//! Changesets: ordered, ancestry-linked bundles of changes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::change::Change;
use crate::error::{TypeError, TypeResult};
use crate::id::{ChangesetId, RevisionId};

/// Branch label used when a changeset does not name one.
pub const DEFAULT_BRANCH: &str = "default";

/// Authorship metadata carried by every changeset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangesetMeta {
    pub author: String,
    pub log_message: String,
    pub timestamp: DateTime<Utc>,
}

impl ChangesetMeta {
    /// Metadata stamped with the current time.
    pub fn new(author: impl Into<String>, log_message: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            log_message: log_message.into(),
            timestamp: Utc::now(),
        }
    }

    /// Replace the timestamp.
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// An immutable unit of one or more [`Change`]s with ancestry pointers.
///
/// `follows_id` names the changeset this one is linearly based on;
/// `closes_id` is only set on mergesets and names the tip of the line being
/// merged in. The builder-style methods (`following`, `closing`, ...) are
/// meant for assembling a changeset before it is persisted; stores only
/// hand out shared references or clones afterwards.
///
/// The serde representation is the canonical wire form exchanged between
/// instances:
///
/// ```json
/// {"id": "...", "follows_id": "...", "meta": {"author": "...", "log_message": "...",
///  "timestamp": "..."}, "changes": [{"ref": "/package/x", "diff": {"old": null, "new": {}}}]}
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Changeset {
    id: ChangesetId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    follows_id: Option<ChangesetId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    closes_id: Option<ChangesetId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    revision_id: Option<RevisionId>,
    meta: ChangesetMeta,
    #[serde(default)]
    changes: Vec<Change>,
}

impl Changeset {
    /// Create a changeset with a fresh id. `changes` must not be empty.
    pub fn new(changes: Vec<Change>, meta: ChangesetMeta) -> TypeResult<Self> {
        if changes.is_empty() {
            return Err(TypeError::InvalidChangeset(
                "a changeset needs at least one change".into(),
            ));
        }
        Ok(Self::assemble(changes, meta))
    }

    /// Create a changeset without changes.
    ///
    /// Only used for the bootstrap changeset of a fresh register and for
    /// mergesets whose merge contributes no net change.
    pub fn empty(meta: ChangesetMeta) -> Self {
        Self::assemble(Vec::new(), meta)
    }

    fn assemble(changes: Vec<Change>, meta: ChangesetMeta) -> Self {
        Self {
            id: ChangesetId::new(),
            follows_id: None,
            closes_id: None,
            branch: None,
            revision_id: None,
            meta,
            changes,
        }
    }

    /// Set the parent this changeset follows.
    pub fn following(mut self, parent: Option<ChangesetId>) -> Self {
        self.follows_id = parent;
        self
    }

    /// Mark this changeset as closing another line.
    pub fn closing(mut self, closed: ChangesetId) -> Self {
        self.closes_id = Some(closed);
        self
    }

    /// Label the branch.
    pub fn on_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    /// Tie this changeset to the revision it was derived from.
    pub fn from_revision(mut self, revision: RevisionId) -> Self {
        self.revision_id = Some(revision);
        self
    }

    pub fn id(&self) -> ChangesetId {
        self.id
    }

    pub fn follows_id(&self) -> Option<ChangesetId> {
        self.follows_id
    }

    pub fn closes_id(&self) -> Option<ChangesetId> {
        self.closes_id
    }

    /// The branch label, falling back to [`DEFAULT_BRANCH`].
    pub fn branch(&self) -> &str {
        self.branch.as_deref().unwrap_or(DEFAULT_BRANCH)
    }

    pub fn revision_id(&self) -> Option<RevisionId> {
        self.revision_id
    }

    pub fn meta(&self) -> &ChangesetMeta {
        &self.meta
    }

    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    /// Returns `true` if this changeset closes another line.
    pub fn is_mergeset(&self) -> bool {
        self.closes_id.is_some()
    }

    /// Ancestry edges: the followed parent first, then the closed one.
    pub fn parents(&self) -> impl Iterator<Item = ChangesetId> + '_ {
        self.follows_id.into_iter().chain(self.closes_id)
    }

    /// One-line summary for listings.
    pub fn summary(&self) -> String {
        let first_line = self.meta.log_message.lines().next().unwrap_or("");
        format!(
            "{} {} {} ({} change{})",
            self.id.short_id(),
            self.meta.timestamp.format("%Y-%m-%d %H:%M"),
            first_line,
            self.changes.len(),
            if self.changes.len() == 1 { "" } else { "s" },
        )
    }

    /// The canonical structured form used for transport.
    pub fn as_dict(&self) -> TypeResult<Value> {
        serde_json::to_value(self).map_err(|e| TypeError::Serialization(e.to_string()))
    }

    /// Decode the canonical structured form.
    pub fn from_dict(value: &Value) -> TypeResult<Self> {
        Self::deserialize(value).map_err(|e| TypeError::Serialization(e.to_string()))
    }
}
