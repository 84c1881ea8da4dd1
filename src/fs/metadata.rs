use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::tar::FileType;

/// Public view of one entry: what `stat` and `read_dir` hand out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub(crate) name: String,
    pub(crate) size: u64,
    pub(crate) file_type: FileType,
    pub(crate) mode: u32,
    pub(crate) mtime: u64,
    pub(crate) link_name: Option<String>,
}

impl Metadata {
    /// Final path segment; `.` for the archive root.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Content length in bytes, always 0 for directories.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn is_dir(&self) -> bool {
        self.file_type == FileType::Directory
    }

    pub fn is_file(&self) -> bool {
        !self.is_dir()
    }

    pub fn file_type(&self) -> FileType {
        self.file_type
    }

    /// Permission bits (`0o7777` mask).
    pub fn mode(&self) -> u32 {
        self.mode
    }

    /// Modification time in seconds since the Unix epoch.
    pub fn mtime(&self) -> u64 {
        self.mtime
    }

    pub fn modified(&self) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(self.mtime)
    }

    /// Target of a symlink or hard link member.
    pub fn link_name(&self) -> Option<&str> {
        self.link_name.as_deref()
    }

    /// `ls -l` style mode string, e.g. `drwxr-x---`.
    pub fn mode_string(&self) -> String {
        let mut out = String::with_capacity(10);
        out.push(self.file_type.as_char());
        for shift in [6, 3, 0] {
            let bits = (self.mode >> shift) & 0o7;
            out.push(if bits & 0o4 != 0 { 'r' } else { '-' });
            out.push(if bits & 0o2 != 0 { 'w' } else { '-' });
            out.push(if bits & 0o1 != 0 { 'x' } else { '-' });
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(file_type: FileType, mode: u32) -> Metadata {
        Metadata {
            name: "x".into(),
            size: 0,
            file_type,
            mode,
            mtime: 60,
            link_name: None,
        }
    }

    #[test]
    fn mode_string_matches_ls() {
        assert_eq!(meta(FileType::Directory, 0o750).mode_string(), "drwxr-x---");
        assert_eq!(meta(FileType::Regular, 0o644).mode_string(), "-rw-r--r--");
        assert_eq!(meta(FileType::Symlink, 0o777).mode_string(), "lrwxrwxrwx");
    }

    #[test]
    fn modified_is_relative_to_the_epoch() {
        let m = meta(FileType::Regular, 0o644);
        assert_eq!(m.modified(), UNIX_EPOCH + Duration::from_secs(60));
        assert!(m.is_file());
        assert!(!m.is_dir());
    }
}
