//! The changeset register.
//!
//! [`ChangesetRegister`] is the façade over the changeset engine and the
//! only component that talks to the live entity store. It turns recorded
//! revisions into changesets (`commit`), applies changesets back onto the
//! store (`update`, `apply`), ingests changesets from peers (`pull`) and
//! reconciles diverging lines (`merge`).

pub mod apply;
pub mod error;
pub mod moderate;
pub mod register;
pub mod report;

pub use error::{RegisterError, RegisterResult};
pub use moderate::{ApproveAll, ModerationDecision, Moderator};
pub use register::{ChangesetRegister, DEFAULT_AUTHOR};
pub use report::{ChangesetLog, ReportEntry, UpdateOutcome, UpdateReport};

// Re-export the types callers need to drive the register.
pub use changes_diff::{Conflict, Resolution};
pub use changes_merge::{AutoResolve, AutoResolvePreferClosing, ConflictResolver};
pub use changes_store::{Changemask, ChangesetStore, EntityModel, RevisionDraft};
pub use changes_types::{Change, ChangeKind, Changeset, ChangesetId, EntityRef, RevisionId};
