//! Foundation types for the changeset engine.
//!
//! Every other `changes-*` crate depends on this one. It defines the data
//! model that catalog instances exchange: immutable [`Change`]s grouped into
//! ancestry-linked [`Changeset`]s.
//!
//! # Key Types
//!
//! - [`ChangesetId`] / [`RevisionId`] -- UUID v7 identifiers
//! - [`EntityRef`] -- `/<kind>/<id>` reference to a catalog entity
//! - [`FieldValue`] -- tri-state attribute lookup (unset, null, value)
//! - [`Change`] -- attribute-level before/after diff for one entity
//! - [`Changeset`] / [`ChangesetMeta`] -- ordered bundle of changes with ancestry

pub mod change;
pub mod changeset;
pub mod entity;
pub mod error;
pub mod id;
pub mod value;

pub use change::{Change, ChangeKind};
pub use changeset::{Changeset, ChangesetMeta, DEFAULT_BRANCH};
pub use entity::EntityRef;
pub use error::{TypeError, TypeResult};
pub use id::{ChangesetId, RevisionId};
pub use value::{AttrMap, FieldValue};
