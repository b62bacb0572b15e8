//! Pull sources for the changeset engine.
//!
//! A [`ChangesetSource`] yields serialized changesets from a peer. Sources
//! only transport data: decoding happens in [`decode_all`], which validates
//! a whole batch before anything is stored.

pub mod decode;
pub mod error;
pub mod file;
pub mod memory;
pub mod source;

pub use decode::decode_all;
pub use error::{SyncError, SyncResult};
pub use file::FileSource;
pub use memory::MemorySource;
pub use source::{open_source, parse_sources, ChangesetSource};
