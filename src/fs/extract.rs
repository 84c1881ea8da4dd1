use std::path::Path;

use tokio::fs;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::{Error, Result};
use crate::io::ReadAt;

use super::tarfs::TarFs;

/// Bytes moved per storage read while copying a file out of the archive.
const COPY_CHUNK: usize = 64 * 1024;

impl<R: ReadAt> TarFs<R> {
    /// Stream a file's content into `writer`, one chunk at a time.
    ///
    /// Returns the number of bytes written.
    pub async fn copy_to<W: AsyncWrite + Unpin>(&self, path: &str, writer: &mut W) -> Result<u64> {
        let mut file = self.open(path)?;
        let mut buf = vec![0u8; COPY_CHUNK];
        let mut written = 0u64;

        loop {
            let n = file.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            writer.write_all(&buf[..n]).await?;
            written += n as u64;
        }

        writer.flush().await?;
        Ok(written)
    }

    /// Extract a file to disk, creating parent directories if needed.
    pub async fn extract_to_file(&self, path: &str, output_path: &Path) -> Result<u64> {
        if self.stat(path)?.is_dir() {
            return Err(Error::is_dir("read", path));
        }

        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let mut out = fs::File::create(output_path).await?;
        self.copy_to(path, &mut out).await
    }

    /// Extract a file to stdout
    pub async fn extract_to_stdout(&self, path: &str) -> Result<u64> {
        let mut stdout = tokio::io::stdout();
        self.copy_to(path, &mut stdout).await
    }
}

#[cfg(test)]
mod tests {
    use crate::error::ErrorKind;
    use crate::test::{Member, archive, open, sample_fs};

    #[tokio::test]
    async fn copies_content_larger_than_one_chunk() {
        let big: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        let fs = open(archive(&[Member::File("big.bin", &big)])).await;

        let mut out = Vec::new();
        assert_eq!(fs.copy_to("big.bin", &mut out).await.unwrap(), big.len() as u64);
        assert_eq!(out, big);
    }

    #[tokio::test]
    async fn extracts_into_nested_directories() {
        let fs = sample_fs().await;
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out/dir1/dir11/file111");

        assert_eq!(fs.extract_to_file("dir1/dir11/file111", &target).await.unwrap(), 7);
        assert_eq!(std::fs::read(&target).unwrap(), b"file111");
    }

    #[tokio::test]
    async fn directories_cannot_be_extracted_as_files() {
        let fs = sample_fs().await;
        let dir = tempfile::tempdir().unwrap();

        let err = fs
            .extract_to_file("dir1", &dir.path().join("dir1"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IsDir);
        assert!(!dir.path().join("dir1").exists());
    }
}
