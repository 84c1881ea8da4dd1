//! Path validation and lookup.
//!
//! Paths are slash-separated and relative to the filesystem root. `.`
//! names the root itself; otherwise a path must not start or end with `/`,
//! and no segment may be empty, `.` or `..`.

use crate::error::{Error, Result};

use super::tree::{NodeId, Tree};

/// Whether `path` is acceptable to [`TarFs`](super::TarFs) operations.
pub fn is_valid(path: &str) -> bool {
    if path == "." {
        return true;
    }
    !path.is_empty()
        && path
            .split('/')
            .all(|segment| !matches!(segment, "" | "." | ".."))
}

/// Join a path relative to some root with one more segment.
pub(crate) fn join(dir: &str, name: &str) -> String {
    if dir == "." {
        name.to_owned()
    } else {
        format!("{dir}/{name}")
    }
}

/// Validate `path` and walk it from `root`.
///
/// Validation always runs first, so a malformed path is reported as
/// [`Error::Invalid`] even when nothing by that name exists.
pub(crate) fn resolve(tree: &Tree, root: NodeId, op: &'static str, path: &str) -> Result<NodeId> {
    if !is_valid(path) {
        return Err(Error::invalid(op, path));
    }
    if path == "." {
        return Ok(root);
    }

    path.split('/').try_fold(root, |dir, name| {
        tree.child(dir, name)
            .ok_or_else(|| Error::not_exist(op, path))
    })
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(".")]
    #[case("foo")]
    #[case("dir1/dir11/file111")]
    #[case("..foo")]
    #[case("a.b/c")]
    fn accepts(#[case] path: &str) {
        assert!(is_valid(path));
    }

    #[rstest]
    #[case("")]
    #[case("/foo")]
    #[case("./foo")]
    #[case("foo/")]
    #[case("foo/../foo")]
    #[case("foo//bar")]
    #[case("foo/.")]
    #[case("..")]
    #[case("/")]
    fn rejects(#[case] path: &str) {
        assert!(!is_valid(path));
    }

    #[test]
    fn join_skips_the_root() {
        assert_eq!(join(".", "foo"), "foo");
        assert_eq!(join("dir1", "file11"), "dir1/file11");
    }
}
