//! Outcomes and summaries handed back to callers.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use changes_types::{ChangeKind, Changeset, ChangesetId, EntityRef, RevisionId};

/// One entity touched by an update.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    pub changeset: ChangesetId,
    pub entity: EntityRef,
    #[serde(serialize_with = "serialize_kind")]
    pub kind: ChangeKind,
}

fn serialize_kind<S: serde::Serializer>(kind: &ChangeKind, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(kind)
}

/// What an update did to the live store.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct UpdateReport {
    /// Changesets applied, in order.
    pub applied: Vec<ChangesetId>,
    /// Entities created, updated or deleted.
    pub entries: Vec<ReportEntry>,
    /// Entities left untouched by a moderator's decision.
    pub skipped: Vec<EntityRef>,
    /// Entities whose conflicts were suppressed by a changemask.
    pub masked: Vec<EntityRef>,
}

impl UpdateReport {
    pub fn record(&mut self, changeset: ChangesetId, entity: EntityRef, kind: ChangeKind) {
        self.entries.push(ReportEntry {
            changeset,
            entity,
            kind,
        });
    }

    fn of_kind(&self, kind: ChangeKind) -> impl Iterator<Item = &EntityRef> {
        self.entries
            .iter()
            .filter(move |e| e.kind == kind)
            .map(|e| &e.entity)
    }

    pub fn created(&self) -> impl Iterator<Item = &EntityRef> {
        self.of_kind(ChangeKind::Create)
    }

    pub fn updated(&self) -> impl Iterator<Item = &EntityRef> {
        self.of_kind(ChangeKind::Update)
    }

    pub fn deleted(&self) -> impl Iterator<Item = &EntityRef> {
        self.of_kind(ChangeKind::Delete)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for UpdateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} changeset(s) applied: {} created, {} updated, {} deleted",
            self.applied.len(),
            self.created().count(),
            self.updated().count(),
            self.deleted().count(),
        )?;
        if !self.skipped.is_empty() {
            write!(f, ", {} skipped", self.skipped.len())?;
        }
        if !self.masked.is_empty() {
            write!(f, ", {} masked", self.masked.len())?;
        }
        Ok(())
    }
}

/// Result of `update`.
///
/// Only `Applied` changed anything; the other two are informational.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UpdateOutcome {
    Applied(UpdateReport),
    /// The working changeset already is the target.
    AlreadyAtHead,
    /// The register holds no changesets.
    NothingCommitted,
}

impl UpdateOutcome {
    pub fn report(&self) -> Option<&UpdateReport> {
        match self {
            Self::Applied(report) => Some(report),
            _ => None,
        }
    }
}

/// Summary of one changeset, as shown by `log`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChangesetLog {
    pub id: ChangesetId,
    pub branch: String,
    pub follows_id: Option<ChangesetId>,
    pub closes_id: Option<ChangesetId>,
    pub author: String,
    pub timestamp: DateTime<Utc>,
    pub revision_id: Option<RevisionId>,
    pub log_message: String,
    pub changes: usize,
    pub is_working: bool,
}

impl ChangesetLog {
    pub fn new(changeset: &Changeset, working: Option<ChangesetId>) -> Self {
        Self {
            id: changeset.id(),
            branch: changeset.branch().to_string(),
            follows_id: changeset.follows_id(),
            closes_id: changeset.closes_id(),
            author: changeset.meta().author.clone(),
            timestamp: changeset.meta().timestamp,
            revision_id: changeset.revision_id(),
            log_message: changeset.meta().log_message.clone(),
            changes: changeset.changes().len(),
            is_working: working == Some(changeset.id()),
        }
    }
}

impl fmt::Display for ChangesetLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "changeset: {}{}", self.id, if self.is_working { " (working)" } else { "" })?;
        writeln!(f, "branch:    {}", self.branch)?;
        if let Some(follows) = self.follows_id {
            writeln!(f, "follows:   {follows}")?;
        }
        if let Some(closes) = self.closes_id {
            writeln!(f, "closes:    {closes}")?;
        }
        writeln!(f, "author:    {}", self.author)?;
        writeln!(f, "date:      {}", self.timestamp.to_rfc3339())?;
        if let Some(revision) = self.revision_id {
            writeln!(f, "revision:  {revision}")?;
        }
        writeln!(f, "changes:   {}", self.changes)?;
        write!(f, "summary:   {}", self.log_message.lines().next().unwrap_or(""))
    }
}
