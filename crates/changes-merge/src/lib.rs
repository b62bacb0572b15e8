//! Merging two lines of development into a mergeset.
//!
//! [`Merge`] finds the common ancestor of a closing and a continuing
//! changeset, sums the two ranges from that ancestor and settles conflicts
//! with a [`ConflictResolver`].

pub mod error;
pub mod merge;
pub mod resolve;

pub use error::{MergeError, MergeResult};
pub use merge::Merge;
pub use resolve::{AutoResolve, AutoResolvePreferClosing, ConflictResolver};
