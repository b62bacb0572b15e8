//! Ancestry arithmetic over the changeset graph.
//!
//! Changesets form a DAG through `follows_id` (the line of development) and
//! `closes_id` (merge edges). Everything here is read-only over a
//! [`ChangesetStore`](changes_store::ChangesetStore) and safe to run
//! concurrently:
//!
//! - [`Range`] -- net changes from a changeset to one of its descendants
//! - [`Intersection`] -- nearest common ancestor of two changesets
//! - [`Heads`] -- branch tips
//! - [`ancestry`] -- distance maps, ancestor tests, update paths

pub mod ancestry;
pub mod error;
pub mod heads;
pub mod intersection;
pub mod range;

#[cfg(test)]
mod fixture;

pub use ancestry::{ancestors, is_ancestor, update_path};
pub use error::{DagError, DagResult};
pub use heads::Heads;
pub use intersection::Intersection;
pub use range::Range;
