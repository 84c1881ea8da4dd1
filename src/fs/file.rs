use std::io::SeekFrom;
use std::sync::Arc;

use anyhow::anyhow;

use crate::error::{Error, Result};
use crate::io::ReadAt;

use super::metadata::Metadata;
use super::tree::{NodeId, NodeKind, Tree};

/// An open entry of a [`TarFs`](super::TarFs).
///
/// File handles read a window of the archive through positioned reads, so
/// every handle has its own cursor and never disturbs another. Directory
/// handles can only be stat'ed and listed.
pub struct TarFile<R: ReadAt> {
    reader: Arc<R>,
    tree: Arc<Tree>,
    node: NodeId,
    /// Path as given to `open`, for error messages
    path: String,
    pos: u64,
    closed: bool,
}

impl<R: ReadAt> TarFile<R> {
    pub(crate) fn new(reader: Arc<R>, tree: Arc<Tree>, node: NodeId, path: &str) -> Self {
        Self {
            reader,
            tree,
            node,
            path: path.to_owned(),
            pos: 0,
            closed: false,
        }
    }

    pub fn stat(&self) -> Metadata {
        self.tree.node(self.node).metadata()
    }

    pub fn is_dir(&self) -> bool {
        self.tree.node(self.node).is_dir()
    }

    /// Current cursor position within the content.
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Absolute content range in the archive, for file handles.
    fn content(&self, op: &'static str) -> Result<(u64, u64)> {
        if self.closed {
            return Err(Error::closed(op, &self.path));
        }
        match self.tree.node(self.node).kind {
            NodeKind::File { offset, size } => Ok((offset, size)),
            NodeKind::Directory { .. } => Err(Error::is_dir(op, &self.path)),
        }
    }

    /// Read from the cursor, advancing it. Returns 0 at end of content.
    ///
    /// # Errors
    ///
    /// [`Error::IsDir`] on directory handles, [`Error::Closed`] after
    /// [`close`](Self::close), [`Error::Storage`] if the archive ends early.
    pub async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let (offset, size) = self.content("read")?;
        if buf.is_empty() || self.pos >= size {
            return Ok(0);
        }

        let want = (buf.len() as u64).min(size - self.pos) as usize;
        let n = self
            .reader
            .read_at(offset + self.pos, &mut buf[..want])
            .await
            .map_err(Error::Storage)?;
        if n == 0 {
            return Err(self.short_read(offset + self.pos));
        }

        self.pos += n as u64;
        Ok(n)
    }

    /// Read at `pos` within the content without touching the cursor.
    pub async fn read_at(&self, buf: &mut [u8], pos: u64) -> Result<usize> {
        let (offset, size) = self.content("read")?;
        if buf.is_empty() || pos >= size {
            return Ok(0);
        }

        let want = (buf.len() as u64).min(size - pos) as usize;
        let n = self
            .reader
            .read_full_at(offset + pos, &mut buf[..want])
            .await
            .map_err(Error::Storage)?;
        if n < want {
            return Err(self.short_read(offset + pos + n as u64));
        }
        Ok(n)
    }

    /// Read everything from the cursor to the end of content into `out`.
    pub async fn read_to_end(&mut self, out: &mut Vec<u8>) -> Result<usize> {
        let (offset, size) = self.content("read")?;
        if self.pos >= size {
            return Ok(0);
        }

        let remaining = usize::try_from(size - self.pos)
            .map_err(|_| Error::Storage(anyhow!("{} is too large to buffer", self.path)))?;
        let start = out.len();
        out.resize(start + remaining, 0);

        let n = self
            .reader
            .read_full_at(offset + self.pos, &mut out[start..])
            .await
            .map_err(Error::Storage)?;
        if n < remaining {
            out.truncate(start + n);
            return Err(self.short_read(offset + self.pos + n as u64));
        }

        self.pos = size;
        Ok(n)
    }

    /// Move the cursor. Positions past the end are allowed and read as EOF.
    pub fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        let (_, size) = self.content("seek")?;
        let target = match pos {
            SeekFrom::Start(n) => Some(n),
            SeekFrom::End(delta) => size.checked_add_signed(delta),
            SeekFrom::Current(delta) => self.pos.checked_add_signed(delta),
        };

        let Some(target) = target else {
            return Err(Error::invalid("seek", &self.path));
        };
        self.pos = target;
        Ok(target)
    }

    /// List a directory handle's children in name order.
    pub fn read_dir(&self) -> Result<Vec<Metadata>> {
        if self.closed {
            return Err(Error::closed("readdir", &self.path));
        }
        if !self.is_dir() {
            return Err(Error::not_dir("readdir", &self.path));
        }
        Ok(self
            .tree
            .children(self.node)
            .map(|id| self.tree.node(id).metadata())
            .collect())
    }

    /// Release the handle. Calling it again does nothing.
    pub fn close(&mut self) {
        self.closed = true;
    }

    fn short_read(&self, at: u64) -> Error {
        Error::Storage(anyhow!(
            "archive ended at offset {at} while reading {}",
            self.path
        ))
    }
}
