use std::io::{Read, Seek, SeekFrom};
use std::sync::Mutex;

use anyhow::{Result, anyhow};
use async_trait::async_trait;

use super::ReadAt;

/// Positioned reads over a single-cursor stream.
///
/// Every read seeks and reads while holding a lock, so concurrent callers
/// each see the bytes at the offset they asked for.
pub struct SeekReader<T> {
    inner: Mutex<T>,
    size: u64,
}

impl<T: Read + Seek> SeekReader<T> {
    pub fn new(mut inner: T) -> Result<Self> {
        let size = inner.seek(SeekFrom::End(0))?;
        Ok(Self {
            inner: Mutex::new(inner),
            size,
        })
    }
}

#[async_trait]
impl<T: Read + Seek + Send> ReadAt for SeekReader<T> {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() || offset >= self.size {
            return Ok(0);
        }

        let mut inner = self
            .inner
            .lock()
            .map_err(|_| anyhow!("stream lock poisoned by a panicked reader"))?;
        inner.seek(SeekFrom::Start(offset))?;
        Ok(inner.read(buf)?)
    }

    fn size(&self) -> u64 {
        self.size
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn interleaved_reads_do_not_share_a_cursor() {
        let reader = Arc::new(SeekReader::new(Cursor::new(b"hello world".to_vec())).unwrap());
        assert_eq!(reader.size(), 11);

        let mut tail = [0u8; 5];
        let mut head = [0u8; 5];
        let (a, b) = tokio::join!(reader.read_full_at(6, &mut tail), reader.read_full_at(0, &mut head));
        assert_eq!(a.unwrap(), 5);
        assert_eq!(b.unwrap(), 5);
        assert_eq!(&tail, b"world");
        assert_eq!(&head, b"hello");
    }

    #[tokio::test]
    async fn reading_past_the_end_returns_zero() {
        let reader = SeekReader::new(Cursor::new(vec![1u8, 2, 3])).unwrap();
        let mut buf = [0u8; 2];
        assert_eq!(reader.read_at(3, &mut buf).await.unwrap(), 0);
    }
}
