//! # runtar
//!
//! A read-only filesystem view over tar archives, with HTTP URL support
//! using Range requests.
//!
//! Opening an archive scans its headers once and builds a directory tree,
//! synthesizing directories that only appear as path prefixes. After that
//! the archive can be navigated like a filesystem: stat entries, list
//! directories, glob names, derive sub-views, and read files. File content
//! is never loaded up front; each open file reads its own byte range from
//! the storage on demand, so a single member of a large remote archive can
//! be read without downloading the rest.
//!
//! ## Features
//!
//! - Archives on the local filesystem, in memory, or behind HTTP/HTTPS URLs
//! - UStar, GNU (long names) and PAX (extended headers) formats
//! - Implicit directory synthesis and `./`-prefixed member names
//! - Single-segment glob patterns (`*`, `?`, `[...]`)
//! - Sub-views sharing one index
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use runtar::{HttpRangeReader, TarFs};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Create a reader for a remote tar archive
//!     let reader = Arc::new(HttpRangeReader::new("https://example.com/archive.tar".to_string()).await?);
//!
//!     // Index the archive
//!     let fs = TarFs::new(reader).await?;
//!
//!     // List the top-level entries
//!     for entry in fs.read_dir(".")? {
//!         println!("{}", entry.name());
//!     }
//!
//!     // Read one file
//!     let readme = fs.read_file("docs/README").await?;
//!     println!("{}", String::from_utf8_lossy(&readme));
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod error;
pub mod fs;
pub mod io;
pub mod tar;

#[cfg(test)]
mod test;

pub use cli::Cli;
pub use error::{Error, ErrorKind, Result};
pub use fs::{Metadata, TarFile, TarFs, Walk};
pub use io::{HttpRangeReader, LocalFileReader, MemoryReader, ReadAt, SeekReader};
pub use tar::{FileType, ScannedEntry, TarScanner};
