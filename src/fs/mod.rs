//! Read-only filesystem view over an indexed archive.
//!
//! ## Architecture
//!
//! - [`tree`]: arena of nodes built once from the scanned members,
//!   synthesizing directories that exist only as path prefixes
//! - [`path`]: path validation and lookup against that tree
//! - [`glob`]: single-segment wildcard patterns
//! - [`TarFs`]: the facade (`open`, `stat`, `read_dir`, `glob`, `sub`, `walk`)
//! - [`TarFile`]: per-open handle reading content through positioned reads
//!
//! The tree is shared behind an `Arc` and never mutated after
//! construction, so any number of callers and sub-views may consult it
//! concurrently without locking.

mod extract;
mod file;
pub mod glob;
mod metadata;
pub mod path;
mod tarfs;
pub mod tree;
mod walk;

pub use file::TarFile;
pub use metadata::Metadata;
pub use tarfs::TarFs;
pub use tree::{NodeId, Tree, TreeBuilder};
pub use walk::Walk;
