//! Linear header scan over a random-access source.
//!
//! ## Scanning Strategy
//!
//! Starting at offset 0, the scanner:
//! 1. Reads one 512-byte block and decodes it as a [`tar::Header`]
//! 2. Stops at the first all-zero block, or cleanly at the end of storage
//! 3. Verifies the header checksum
//! 4. Buffers GNU long-name and PAX records and applies them to the next
//!    real header
//! 5. Records the content range and jumps past the padded content
//!
//! Offsets only ever increase, so the scan never seeks backward.

use std::sync::Arc;

use tar::{EntryType, Header, PaxExtensions};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::io::ReadAt;

use super::structures::*;

/// Overrides collected from extension records, consumed by the next header.
#[derive(Debug, Default)]
struct Pending {
    path: Option<String>,
    link_name: Option<String>,
    size: Option<u64>,
    mtime: Option<u64>,
}

impl Pending {
    fn is_empty(&self) -> bool {
        self.path.is_none() && self.link_name.is_none() && self.size.is_none() && self.mtime.is_none()
    }
}

/// Sequential tar header reader.
///
/// ## Example
///
/// ```ignore
/// let mut scanner = TarScanner::new(reader);
/// while let Some(entry) = scanner.next_entry().await? {
///     println!("{} at {:?}", entry.path, entry.content_range());
/// }
/// ```
pub struct TarScanner<R: ReadAt> {
    reader: Arc<R>,
    /// Total size of the archive in bytes
    size: u64,
    /// Offset of the next header block
    offset: u64,
    finished: bool,
}

impl<R: ReadAt> TarScanner<R> {
    pub fn new(reader: Arc<R>) -> Self {
        let size = reader.size();
        Self {
            reader,
            size,
            offset: 0,
            finished: false,
        }
    }

    /// Offset of the next header block to be read.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Decode the next member, or `None` once the end of the archive is reached.
    ///
    /// # Errors
    ///
    /// [`Error::Format`] for short header blocks, checksum mismatches, bad
    /// numeric fields, content running past the end of storage, and
    /// unsupported member types. [`Error::Storage`] if the source fails.
    pub async fn next_entry(&mut self) -> Result<Option<ScannedEntry>> {
        if self.finished {
            return Ok(None);
        }

        let mut pending = Pending::default();

        loop {
            let header_offset = self.offset;

            let Some(header) = self.read_header(header_offset).await? else {
                self.finished = true;
                if !pending.is_empty() {
                    return Err(Error::format(
                        header_offset,
                        "extension record is not followed by a member",
                    ));
                }
                return Ok(None);
            };

            let entry_type = header.entry_type();
            let raw_size = header
                .entry_size()
                .map_err(|e| Error::format(header_offset, format!("invalid size field: {e}")))?;
            let content_offset = header_offset + BLOCK_SIZE;

            match entry_type {
                EntryType::GNULongName => {
                    let data = self.read_extension(content_offset, raw_size).await?;
                    pending.path = Some(c_string(&data, header_offset)?);
                    self.advance(content_offset, raw_size)?;
                    continue;
                }
                EntryType::GNULongLink => {
                    let data = self.read_extension(content_offset, raw_size).await?;
                    pending.link_name = Some(c_string(&data, header_offset)?);
                    self.advance(content_offset, raw_size)?;
                    continue;
                }
                EntryType::XHeader => {
                    let data = self.read_extension(content_offset, raw_size).await?;
                    apply_pax(&data, &mut pending, header_offset)?;
                    self.advance(content_offset, raw_size)?;
                    continue;
                }
                EntryType::XGlobalHeader => {
                    warn!(offset = header_offset, "ignoring global pax header");
                    self.advance(content_offset, raw_size)?;
                    continue;
                }
                EntryType::GNUSparse => {
                    return Err(Error::format(header_offset, "sparse files are not supported"));
                }
                _ => {}
            }

            let raw_path = match pending.path.take() {
                Some(path) => path,
                None => utf8(&header.path_bytes(), header_offset)?,
            };

            let mut file_type = FileType::from_entry_type(entry_type).unwrap_or(FileType::Regular);
            // Pre-POSIX archives mark directories only by a trailing slash
            if header.as_bytes()[156] == 0 && raw_path.ends_with('/') {
                file_type = FileType::Directory;
            }

            let size = pending.size.take().unwrap_or(raw_size);
            let mode = header
                .mode()
                .map_err(|e| Error::format(header_offset, format!("invalid mode field: {e}")))?
                & 0o7777;
            let mtime = match pending.mtime.take() {
                Some(mtime) => mtime,
                None => header.mtime().map_err(|e| {
                    Error::format(header_offset, format!("invalid mtime field: {e}"))
                })?,
            };
            let link_name = match pending.link_name.take() {
                Some(name) => Some(name),
                None => header
                    .link_name_bytes()
                    .map(|name| utf8(&name, header_offset))
                    .transpose()?,
            };

            self.advance(content_offset, size)?;

            debug!(
                path = %raw_path,
                ?file_type,
                size,
                offset = content_offset,
                "scanned tar member"
            );

            return Ok(Some(ScannedEntry {
                path: raw_path,
                file_type,
                size,
                content_offset,
                header_offset,
                mode,
                mtime,
                link_name,
            }));
        }
    }

    /// Scan the rest of the archive.
    pub async fn scan(mut self) -> Result<Vec<ScannedEntry>> {
        let mut entries = Vec::new();
        while let Some(entry) = self.next_entry().await? {
            entries.push(entry);
        }
        Ok(entries)
    }

    /// Read and verify the header block at `offset`. `None` marks the end of
    /// the archive.
    async fn read_header(&self, offset: u64) -> Result<Option<Header>> {
        // Trailing padding may be cut off after the last member
        if offset >= self.size {
            return Ok(None);
        }

        let mut header = Header::new_old();
        let n = self
            .reader
            .read_full_at(offset, header.as_mut_bytes())
            .await
            .map_err(Error::Storage)?;

        if n < BLOCK_SIZE as usize {
            return Err(Error::format(
                offset,
                format!("truncated header block: {n} of {BLOCK_SIZE} bytes"),
            ));
        }

        if header.as_bytes().iter().all(|&b| b == 0) {
            return Ok(None);
        }

        verify_checksum(&header, offset)?;
        Ok(Some(header))
    }

    /// Buffer the content of a long-name or PAX record.
    async fn read_extension(&self, offset: u64, size: u64) -> Result<Vec<u8>> {
        if size > MAX_EXTENSION_SIZE {
            return Err(Error::format(
                offset - BLOCK_SIZE,
                format!("extension record of {size} bytes exceeds {MAX_EXTENSION_SIZE}"),
            ));
        }

        let mut data = vec![0u8; size as usize];
        let n = self
            .reader
            .read_full_at(offset, &mut data)
            .await
            .map_err(Error::Storage)?;
        if n < data.len() {
            return Err(Error::format(offset - BLOCK_SIZE, "truncated extension record"));
        }
        Ok(data)
    }

    /// Move past `size` content bytes starting at `content_offset`.
    fn advance(&mut self, content_offset: u64, size: u64) -> Result<()> {
        let header_offset = content_offset - BLOCK_SIZE;
        let end = content_offset
            .checked_add(size)
            .ok_or_else(|| Error::format(header_offset, "member size overflows"))?;

        if end > self.size {
            return Err(Error::format(
                header_offset,
                format!(
                    "member content truncated: ends at {end}, archive is {} bytes",
                    self.size
                ),
            ));
        }

        self.offset = content_offset + padded_size(size);
        Ok(())
    }
}

/// The checksum is the unsigned byte sum of the header with the checksum
/// field itself read as eight spaces.
fn verify_checksum(header: &Header, offset: u64) -> Result<()> {
    let stored = header
        .cksum()
        .map_err(|e| Error::format(offset, format!("invalid checksum field: {e}")))?;

    let bytes = header.as_bytes();
    let computed: u32 = bytes[..148]
        .iter()
        .chain([b' '; 8].iter())
        .chain(bytes[156..].iter())
        .map(|&b| u32::from(b))
        .sum();

    if stored != computed {
        return Err(Error::format(
            offset,
            format!("checksum mismatch: header says {stored}, computed {computed}"),
        ));
    }
    Ok(())
}

fn apply_pax(data: &[u8], pending: &mut Pending, offset: u64) -> Result<()> {
    for ext in PaxExtensions::new(data) {
        let ext = ext.map_err(|e| Error::format(offset, format!("bad pax record: {e}")))?;
        let key = ext
            .key()
            .map_err(|e| Error::format(offset, format!("bad pax key: {e}")))?;

        match key {
            "path" => pending.path = Some(utf8(ext.value_bytes(), offset)?),
            "linkpath" => pending.link_name = Some(utf8(ext.value_bytes(), offset)?),
            "size" => {
                let value = utf8(ext.value_bytes(), offset)?;
                let size = value
                    .parse()
                    .map_err(|_| Error::format(offset, format!("bad pax size {value:?}")))?;
                pending.size = Some(size);
            }
            "mtime" => {
                // Fractional seconds are allowed; whole seconds are kept
                let value = utf8(ext.value_bytes(), offset)?;
                let secs = value.split('.').next().unwrap_or_default();
                let mtime = match secs.parse::<i64>() {
                    Ok(secs) => secs.max(0) as u64,
                    Err(_) => {
                        return Err(Error::format(offset, format!("bad pax mtime {value:?}")));
                    }
                };
                pending.mtime = Some(mtime);
            }
            _ => {}
        }
    }
    Ok(())
}

/// Decode a name or PAX value, rejecting invalid UTF-8.
fn utf8(bytes: &[u8], offset: u64) -> Result<String> {
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|e| Error::format(offset, format!("name is not valid UTF-8: {e}")))
}

/// GNU long-name payloads are NUL terminated.
fn c_string(data: &[u8], offset: u64) -> Result<String> {
    let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
    utf8(&data[..end], offset)
}
