//! Tar archive scanning.
//!
//! A tar archive is a flat sequence of 512-byte header blocks, each
//! followed by the member's content padded to a block boundary, and ended
//! by a zero block. There is no central directory, so the only way to learn
//! what an archive holds is one linear pass over its headers.
//!
//! [`TarScanner`] makes that pass over any [`ReadAt`](crate::io::ReadAt)
//! source. It reads headers only: member content is never fetched, its
//! byte range is recorded instead so it can be read lazily later.
//!
//! ## Supported Features
//!
//! - V7, UStar (with `prefix`) and GNU headers, decoded with the `tar` crate
//! - GNU long name and long link records
//! - PAX extended headers (`path`, `linkpath`, `size`, `mtime`)
//! - Header checksum verification
//!
//! ## Limitations
//!
//! - No GNU sparse files
//! - No multi-volume archives
//! - No compressed archives (content offsets must be addressable)

mod scanner;
mod structures;

pub use scanner::TarScanner;
pub use structures::*;
