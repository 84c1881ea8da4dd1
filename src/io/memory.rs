use anyhow::Result;
use async_trait::async_trait;

use super::ReadAt;

/// Archive bytes held entirely in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryReader {
    data: Vec<u8>,
}

impl MemoryReader {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self { data: data.into() }
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }
}

impl From<Vec<u8>> for MemoryReader {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

#[async_trait]
impl ReadAt for MemoryReader {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        let Ok(start) = usize::try_from(offset) else {
            return Ok(0);
        };
        if start >= self.data.len() {
            return Ok(0);
        }

        let n = buf.len().min(self.data.len() - start);
        buf[..n].copy_from_slice(&self.data[start..start + n]);
        Ok(n)
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_are_clamped_to_the_buffer() {
        let reader = MemoryReader::new(b"0123456789".to_vec());

        let mut buf = [0u8; 4];
        assert_eq!(reader.read_at(8, &mut buf).await.unwrap(), 2);
        assert_eq!(&buf[..2], b"89");
        assert_eq!(reader.read_at(10, &mut buf).await.unwrap(), 0);
        assert_eq!(reader.read_at(u64::MAX, &mut buf).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn read_full_at_stops_at_end() {
        let reader = MemoryReader::new(b"abcdef".to_vec());

        let mut buf = [0u8; 8];
        assert_eq!(reader.read_full_at(2, &mut buf).await.unwrap(), 4);
        assert_eq!(&buf[..4], b"cdef");
    }
}
