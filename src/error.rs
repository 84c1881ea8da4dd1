//! Error values returned by the archive filesystem.

use thiserror::Error;

/// Result type for archive filesystem operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while indexing an archive or serving lookups from it.
///
/// Path errors carry the operation and the path exactly as the caller gave
/// it, and render like `open foo/: invalid argument`.
#[derive(Debug, Error)]
pub enum Error {
    /// The archive bytes cannot be decoded, or describe an impossible tree.
    #[error("malformed archive at offset {offset}: {reason}")]
    Format { offset: u64, reason: String },

    #[error("{op} {path}: invalid argument")]
    Invalid { op: &'static str, path: String },

    #[error("{op} {path}: file does not exist")]
    NotExist { op: &'static str, path: String },

    #[error("{op} {path}: not a directory")]
    NotDir { op: &'static str, path: String },

    #[error("{op} {path}: is a directory")]
    IsDir { op: &'static str, path: String },

    #[error("{op} {path}: file already closed")]
    Closed { op: &'static str, path: String },

    #[error("syntax error in pattern {pattern:?}")]
    BadPattern { pattern: String },

    /// The storage collaborator failed, or ran out of bytes the index said exist.
    #[error("storage read failed: {0:#}")]
    Storage(anyhow::Error),

    /// Writing extracted content out failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// The kind of an [`Error`], without its context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Format,
    Invalid,
    NotExist,
    NotDir,
    IsDir,
    Closed,
    BadPattern,
    Storage,
    Io,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Format { .. } => ErrorKind::Format,
            Error::Invalid { .. } => ErrorKind::Invalid,
            Error::NotExist { .. } => ErrorKind::NotExist,
            Error::NotDir { .. } => ErrorKind::NotDir,
            Error::IsDir { .. } => ErrorKind::IsDir,
            Error::Closed { .. } => ErrorKind::Closed,
            Error::BadPattern { .. } => ErrorKind::BadPattern,
            Error::Storage(_) => ErrorKind::Storage,
            Error::Io(_) => ErrorKind::Io,
        }
    }

    pub(crate) fn format(offset: u64, reason: impl Into<String>) -> Self {
        Error::Format {
            offset,
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid(op: &'static str, path: &str) -> Self {
        Error::Invalid {
            op,
            path: path.to_owned(),
        }
    }

    pub(crate) fn not_exist(op: &'static str, path: &str) -> Self {
        Error::NotExist {
            op,
            path: path.to_owned(),
        }
    }

    pub(crate) fn not_dir(op: &'static str, path: &str) -> Self {
        Error::NotDir {
            op,
            path: path.to_owned(),
        }
    }

    pub(crate) fn is_dir(op: &'static str, path: &str) -> Self {
        Error::IsDir {
            op,
            path: path.to_owned(),
        }
    }

    pub(crate) fn closed(op: &'static str, path: &str) -> Self {
        Error::Closed {
            op,
            path: path.to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_errors_render_like_posix() {
        assert_eq!(
            Error::invalid("open", "foo/").to_string(),
            "open foo/: invalid argument"
        );
        assert_eq!(
            Error::not_dir("readdir", "foo").to_string(),
            "readdir foo: not a directory"
        );
        assert_eq!(Error::is_dir("read", "dir1").kind(), ErrorKind::IsDir);
    }

    #[test]
    fn storage_errors_keep_the_cause_chain() {
        let cause = anyhow::anyhow!("connection reset").context("range 0-511");
        let err = Error::Storage(cause);
        assert_eq!(err.kind(), ErrorKind::Storage);
        assert_eq!(
            err.to_string(),
            "storage read failed: range 0-511: connection reset"
        );
    }
}
