//! Change arithmetic for the changeset engine.
//!
//! Works on flat lists of [`Change`](changes_types::Change)s, independent of
//! any store:
//!
//! - [`diff_states`] / [`change_between`] -- attribute-level diff of two states
//! - [`compose`] / [`reduce`] -- coalesce successive changes per entity
//! - [`Sum`] -- combine two change lists, detecting [`Conflict`]s
//! - [`render_change`] -- human-readable rendering of a change

pub mod attrs;
pub mod conflict;
pub mod error;
pub mod reduce;
pub mod render;
pub mod sum;

pub use attrs::{change_between, diff_states, field_changes, FieldChange};
pub use conflict::{Conflict, Resolution};
pub use error::{DiffError, DiffResult};
pub use reduce::{compose, invert_all, reduce};
pub use render::render_change;
pub use sum::Sum;
