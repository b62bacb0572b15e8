//! Storage for the changeset engine.
//!
//! Two stores live here:
//!
//! - [`ChangesetStore`] -- the arena of changesets keyed by id, plus the
//!   working pointer, the revision index and changemasks. Every arithmetic
//!   component takes a store handle instead of reaching for global state.
//! - [`EntityModel`] -- the interface to the live record store ("the
//!   model"). The engine only needs to read entities, list revisions and
//!   record new revisions.
//!
//! Both ship with in-memory implementations ([`InMemoryChangesetStore`],
//! [`InMemoryModel`]) that can be exported to and restored from serde
//! snapshots (see [`snapshot`]).
//!
//! # Design Rules
//!
//! 1. Changesets are immutable once inserted; inserting a known id is a no-op.
//! 2. Exactly one working pointer exists once any changeset has been committed
//!    or updated to.
//! 3. Concurrent reads are always safe; writes are serialized by `RwLock`.
//! 4. All I/O errors are propagated, never silently ignored.

pub mod changeset;
pub mod error;
pub mod mask;
pub mod memory;
pub mod model;
pub mod snapshot;

pub use changeset::ChangesetStore;
pub use error::{StoreError, StoreResult};
pub use mask::Changemask;
pub use memory::{InMemoryChangesetStore, StoreSnapshot};
pub use model::{Edit, EntityModel, InMemoryModel, ModelSnapshot, Revision, RevisionDraft, RevisionEntry};
