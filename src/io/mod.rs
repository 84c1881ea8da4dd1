//! Random-access storage backing an archive.
//!
//! Everything above this layer addresses the archive by absolute byte
//! offset, so independent readers never share a cursor. Sources that only
//! offer a single movable cursor are adapted through [`SeekReader`].

mod http;
mod local;
mod memory;
mod stream;

pub use http::HttpRangeReader;
pub use local::LocalFileReader;
pub use memory::MemoryReader;
pub use stream::SeekReader;

use anyhow::Result;
use async_trait::async_trait;

/// Trait for random access reading from a data source
#[async_trait]
pub trait ReadAt: Send + Sync {
    /// Read data at the specified offset into the buffer.
    ///
    /// Returns the number of bytes read, which may be short. Zero means the
    /// offset is at or past the end of the source.
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize>;

    /// Get the total size of the data source
    fn size(&self) -> u64;

    /// Keep reading at increasing offsets until `buf` is full or the source
    /// is exhausted. Returns the number of bytes placed in `buf`.
    async fn read_full_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.read_at(offset + filled as u64, &mut buf[filled..]).await?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        Ok(filled)
    }
}
