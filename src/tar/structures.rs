use std::ops::Range;

use tar::EntryType;

/// Size of a tar header block, and the unit content is padded to.
pub const BLOCK_SIZE: u64 = 512;

/// Largest GNU long-name or PAX record the scanner will buffer.
pub const MAX_EXTENSION_SIZE: u64 = 1024 * 1024;

/// Round a content length up to whole blocks.
pub fn padded_size(size: u64) -> u64 {
    size.div_ceil(BLOCK_SIZE) * BLOCK_SIZE
}

/// Shape of a tree node: something that holds bytes, or something that holds names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    File,
    Directory,
}

/// What a tar member is, as recorded in its type flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    Regular,
    Directory,
    Symlink,
    HardLink,
    CharDevice,
    BlockDevice,
    Fifo,
}

impl FileType {
    /// Map a header type flag. Extension records and sparse files have no
    /// file type of their own and yield `None`.
    pub fn from_entry_type(entry_type: EntryType) -> Option<Self> {
        match entry_type {
            EntryType::Directory => Some(FileType::Directory),
            EntryType::Symlink => Some(FileType::Symlink),
            EntryType::Link => Some(FileType::HardLink),
            EntryType::Char => Some(FileType::CharDevice),
            EntryType::Block => Some(FileType::BlockDevice),
            EntryType::Fifo => Some(FileType::Fifo),
            EntryType::GNULongName
            | EntryType::GNULongLink
            | EntryType::GNUSparse
            | EntryType::XHeader
            | EntryType::XGlobalHeader => None,
            // Regular, contiguous, and unknown vendor types all read as files
            _ => Some(FileType::Regular),
        }
    }

    pub fn kind(&self) -> EntryKind {
        match self {
            FileType::Directory => EntryKind::Directory,
            _ => EntryKind::File,
        }
    }

    /// Single character used in `ls -l` style listings.
    pub fn as_char(&self) -> char {
        match self {
            FileType::Regular | FileType::HardLink => '-',
            FileType::Directory => 'd',
            FileType::Symlink => 'l',
            FileType::CharDevice => 'c',
            FileType::BlockDevice => 'b',
            FileType::Fifo => 'p',
        }
    }
}

/// One archive member as found by the scanner, extensions already applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedEntry {
    /// Member name exactly as stored, e.g. `./dir1/` or `dir1/file11`
    pub path: String,
    pub file_type: FileType,
    /// Content length in bytes
    pub size: u64,
    /// Absolute offset of the first content byte
    pub content_offset: u64,
    /// Absolute offset of the member's own header block
    pub header_offset: u64,
    /// Permission bits
    pub mode: u32,
    /// Modification time, seconds since the Unix epoch
    pub mtime: u64,
    pub link_name: Option<String>,
}

impl ScannedEntry {
    pub fn kind(&self) -> EntryKind {
        self.file_type.kind()
    }

    /// Absolute byte range of the member's content.
    pub fn content_range(&self) -> Range<u64> {
        self.content_offset..self.content_offset + self.size
    }
}
