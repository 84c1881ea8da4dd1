use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;

use super::ReadAt;
#[cfg(not(any(unix, windows)))]
use super::SeekReader;

/// Local file reader with random access support
pub struct LocalFileReader {
    #[cfg(any(unix, windows))]
    file: File,
    #[cfg(not(any(unix, windows)))]
    file: SeekReader<File>,
    size: u64,
}

impl LocalFileReader {
    pub fn new(path: &Path) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
        let size = file.metadata()?.len();

        #[cfg(not(any(unix, windows)))]
        let file = SeekReader::new(file)?;

        Ok(Self { file, size })
    }
}

#[async_trait]
impl ReadAt for LocalFileReader {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::FileExt;
            Ok(self.file.read_at(buf, offset)?)
        }

        #[cfg(windows)]
        {
            // seek_read moves the handle's cursor, but every read here names
            // its own offset so nothing depends on where it is left.
            use std::os::windows::fs::FileExt;
            Ok(self.file.seek_read(buf, offset)?)
        }

        #[cfg(not(any(unix, windows)))]
        {
            self.file.read_at(offset, buf).await
        }
    }

    fn size(&self) -> u64 {
        self.size
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[tokio::test]
    async fn reads_at_absolute_offsets() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"0123456789abcdef").unwrap();
        tmp.flush().unwrap();

        let reader = LocalFileReader::new(tmp.path()).unwrap();
        assert_eq!(reader.size(), 16);

        let mut buf = [0u8; 6];
        assert_eq!(reader.read_full_at(10, &mut buf).await.unwrap(), 6);
        assert_eq!(&buf, b"abcdef");
        assert_eq!(reader.read_full_at(0, &mut buf[..3]).await.unwrap(), 3);
        assert_eq!(&buf[..3], b"012");
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = LocalFileReader::new(Path::new("/nonexistent/archive.tar"))
            .err()
            .unwrap();
        assert!(format!("{err:#}").contains("/nonexistent/archive.tar"));
    }
}
