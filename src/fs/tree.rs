//! The immutable directory tree built from a scan.
//!
//! Nodes live in one arena and refer to each other by [`NodeId`]. A
//! directory owns an ordered map from child name to id; the parent link is
//! a plain id used for lookups only, so the structure has no cycles of
//! ownership and can be shared freely once built.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{Error, Result};
use crate::tar::{EntryKind, FileType, ScannedEntry};

use super::metadata::Metadata;

/// Permission bits given to directories that have no header of their own.
pub const DEFAULT_DIR_MODE: u32 = 0o755;

/// Stable handle to a node in a [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug)]
pub(crate) enum NodeKind {
    File {
        offset: u64,
        size: u64,
    },
    Directory {
        children: BTreeMap<String, NodeId>,
        /// Set once a directory header for this path has been seen
        explicit: bool,
    },
}

#[derive(Debug)]
pub(crate) struct Node {
    pub name: String,
    pub path: String,
    pub parent: Option<NodeId>,
    pub kind: NodeKind,
    pub file_type: FileType,
    pub mode: u32,
    pub mtime: u64,
    pub link_name: Option<String>,
}

impl Node {
    fn directory(name: String, path: String, parent: Option<NodeId>) -> Self {
        Self {
            name,
            path,
            parent,
            kind: NodeKind::Directory {
                children: BTreeMap::new(),
                explicit: false,
            },
            file_type: FileType::Directory,
            mode: DEFAULT_DIR_MODE,
            mtime: 0,
            link_name: None,
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self.kind, NodeKind::Directory { .. })
    }

    pub fn metadata(&self) -> Metadata {
        Metadata {
            name: self.name.clone(),
            size: match self.kind {
                NodeKind::File { size, .. } => size,
                NodeKind::Directory { .. } => 0,
            },
            file_type: self.file_type,
            mode: self.mode,
            mtime: self.mtime,
            link_name: self.link_name.clone(),
        }
    }

    fn apply_header(&mut self, entry: &ScannedEntry) {
        self.file_type = entry.file_type;
        self.mode = entry.mode;
        self.mtime = entry.mtime;
        self.link_name = entry.link_name.clone();
    }
}

/// Directory tree of an archive. Built once, read-only afterwards.
#[derive(Debug)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    pub const ROOT: NodeId = NodeId(0);

    /// Build a tree from scanned members in archive order.
    pub fn build(entries: impl IntoIterator<Item = ScannedEntry>) -> Result<Self> {
        let mut builder = TreeBuilder::new();
        for entry in entries {
            builder.insert(&entry)?;
        }
        Ok(builder.finish())
    }

    /// Number of nodes, the root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    pub(crate) fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub(crate) fn child(&self, dir: NodeId, name: &str) -> Option<NodeId> {
        match &self.node(dir).kind {
            NodeKind::Directory { children, .. } => children.get(name).copied(),
            NodeKind::File { .. } => None,
        }
    }

    /// Children of `dir` in name order; empty for files.
    pub(crate) fn children(&self, dir: NodeId) -> impl DoubleEndedIterator<Item = NodeId> + '_ {
        let children = match &self.node(dir).kind {
            NodeKind::Directory { children, .. } => Some(children.values().copied()),
            NodeKind::File { .. } => None,
        };
        children.into_iter().flatten()
    }
}

/// Incremental tree construction, one scanned member at a time.
pub struct TreeBuilder {
    nodes: Vec<Node>,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::directory(".".to_owned(), ".".to_owned(), None)],
        }
    }

    /// Add one member, synthesizing any missing parent directories.
    ///
    /// # Errors
    ///
    /// [`Error::Format`] when the member's name contains `..`, when a
    /// non-directory names the root, when a file would have to act as a
    /// directory, or when a file and a directory claim the same path.
    pub fn insert(&mut self, entry: &ScannedEntry) -> Result<()> {
        let offset = entry.header_offset;

        let mut segments = Vec::new();
        for segment in entry.path.split('/') {
            match segment {
                "" | "." => continue,
                ".." => {
                    return Err(Error::format(
                        offset,
                        format!("member {:?} escapes the archive root", entry.path),
                    ));
                }
                name => segments.push(name),
            }
        }

        let Some((leaf, parents)) = segments.split_last() else {
            if entry.kind() != EntryKind::Directory {
                return Err(Error::format(
                    offset,
                    format!("member {:?} names the archive root but is not a directory", entry.path),
                ));
            }
            self.nodes[Tree::ROOT.0].apply_header(entry);
            return Ok(());
        };

        let mut dir = Tree::ROOT;
        for name in parents {
            dir = self.ensure_dir(dir, name, offset)?;
        }

        let Some(id) = self.child(dir, leaf) else {
            let kind = match entry.kind() {
                EntryKind::File => NodeKind::File {
                    offset: entry.content_offset,
                    size: entry.size,
                },
                EntryKind::Directory => NodeKind::Directory {
                    children: BTreeMap::new(),
                    explicit: true,
                },
            };
            let id = self.push(dir, leaf, kind);
            self.nodes[id.0].apply_header(entry);
            return Ok(());
        };

        let node = &mut self.nodes[id.0];
        match (&mut node.kind, entry.kind()) {
            (NodeKind::File { offset: content, size }, EntryKind::File) => {
                debug!(path = %node.path, "later member replaces earlier one");
                *content = entry.content_offset;
                *size = entry.size;
            }
            (NodeKind::Directory { explicit, .. }, EntryKind::Directory) => {
                if *explicit {
                    debug!(path = %node.path, "repeated directory header");
                }
                *explicit = true;
            }
            (NodeKind::File { .. }, EntryKind::Directory) => {
                return Err(Error::format(
                    offset,
                    format!("{:?} is a file earlier in the archive", node.path),
                ));
            }
            (NodeKind::Directory { .. }, EntryKind::File) => {
                return Err(Error::format(
                    offset,
                    format!("{:?} is a directory earlier in the archive", node.path),
                ));
            }
        }
        node.apply_header(entry);
        Ok(())
    }

    pub fn finish(self) -> Tree {
        Tree { nodes: self.nodes }
    }

    /// Look up the directory `name` inside `dir`, creating it if absent.
    fn ensure_dir(&mut self, dir: NodeId, name: &str, offset: u64) -> Result<NodeId> {
        match self.child(dir, name) {
            Some(id) if self.nodes[id.0].is_dir() => Ok(id),
            Some(id) => Err(Error::format(
                offset,
                format!("{:?} is a file but is used as a directory", self.nodes[id.0].path),
            )),
            None => {
                let id = self.push(
                    dir,
                    name,
                    NodeKind::Directory {
                        children: BTreeMap::new(),
                        explicit: false,
                    },
                );
                debug!(path = %self.nodes[id.0].path, "synthesized implicit directory");
                Ok(id)
            }
        }
    }

    fn child(&self, dir: NodeId, name: &str) -> Option<NodeId> {
        match &self.nodes[dir.0].kind {
            NodeKind::Directory { children, .. } => children.get(name).copied(),
            NodeKind::File { .. } => None,
        }
    }

    fn push(&mut self, parent: NodeId, name: &str, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        let parent_path = &self.nodes[parent.0].path;
        let path = if parent == Tree::ROOT {
            name.to_owned()
        } else {
            format!("{parent_path}/{name}")
        };

        let mut node = Node::directory(name.to_owned(), path, Some(parent));
        if let NodeKind::File { .. } = kind {
            node.file_type = FileType::Regular;
        }
        node.kind = kind;
        self.nodes.push(node);

        if let NodeKind::Directory { children, .. } = &mut self.nodes[parent.0].kind {
            children.insert(name.to_owned(), id);
        }
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tar::ScannedEntry;

    fn entry(path: &str, file_type: FileType) -> ScannedEntry {
        ScannedEntry {
            path: path.to_owned(),
            file_type,
            size: if file_type == FileType::Directory { 0 } else { 3 },
            content_offset: 512,
            header_offset: 0,
            mode: 0o640,
            mtime: 42,
            link_name: None,
        }
    }

    fn file(path: &str) -> ScannedEntry {
        entry(path, FileType::Regular)
    }

    fn dir(path: &str) -> ScannedEntry {
        entry(path, FileType::Directory)
    }

    fn lookup(tree: &Tree, path: &str) -> Option<NodeId> {
        path.split('/')
            .try_fold(Tree::ROOT, |dir, name| tree.child(dir, name))
    }

    fn names(tree: &Tree, id: NodeId) -> Vec<&str> {
        tree.children(id).map(|c| tree.node(c).name.as_str()).collect()
    }

    #[test]
    fn synthesizes_missing_directories() {
        let tree = Tree::build([file("dir1/dir11/file111"), file("foo")]).unwrap();

        let dir11 = lookup(&tree, "dir1/dir11").unwrap();
        let node = tree.node(dir11);
        assert!(node.is_dir());
        assert_eq!(node.path, "dir1/dir11");
        assert_eq!(node.mode, DEFAULT_DIR_MODE);
        assert_eq!(node.parent, lookup(&tree, "dir1"));
        assert!(matches!(node.kind, NodeKind::Directory { explicit: false, .. }));

        let file111 = tree.node(lookup(&tree, "dir1/dir11/file111").unwrap());
        assert_eq!(file111.path, "dir1/dir11/file111");
        assert_eq!(file111.name, "file111");
        assert_eq!(names(&tree, Tree::ROOT), ["dir1", "foo"]);
        assert_eq!(tree.len(), 5);
    }

    #[test]
    fn explicit_header_merges_into_synthesized_directory() {
        let tree = Tree::build([file("d/f"), dir("d/")]).unwrap();

        let d = tree.node(lookup(&tree, "d").unwrap());
        assert!(matches!(d.kind, NodeKind::Directory { explicit: true, .. }));
        assert_eq!(d.mode, 0o640);
        assert_eq!(d.mtime, 42);
        assert_eq!(names(&tree, lookup(&tree, "d").unwrap()), ["f"]);
    }

    #[test]
    fn later_file_wins() {
        let mut second = file("a");
        second.content_offset = 2048;
        second.size = 9;
        second.mode = 0o600;
        let tree = Tree::build([file("a"), second]).unwrap();

        let a = tree.node(lookup(&tree, "a").unwrap());
        assert!(matches!(a.kind, NodeKind::File { offset: 2048, size: 9 }));
        assert_eq!(a.mode, 0o600);
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn file_used_as_directory_is_rejected() {
        let err = Tree::build([file("a"), file("a/b")]).unwrap_err();
        assert!(matches!(err, Error::Format { .. }), "{err}");
    }

    #[test]
    fn file_and_directory_at_same_path_conflict() {
        let err = Tree::build([file("a"), dir("a/")]).unwrap_err();
        assert!(matches!(err, Error::Format { .. }), "{err}");

        let err = Tree::build([dir("a/"), file("a")]).unwrap_err();
        assert!(matches!(err, Error::Format { .. }), "{err}");
    }

    #[test]
    fn dot_segments_are_normalized() {
        let tree = Tree::build([dir("./"), file("./x//y"), file("/abs")]).unwrap();

        assert!(lookup(&tree, "x/y").is_some());
        assert!(lookup(&tree, "abs").is_some());
        assert_eq!(tree.node(Tree::ROOT).mode, 0o640);
        assert_eq!(tree.node(Tree::ROOT).name, ".");
    }

    #[test]
    fn parent_segments_are_rejected() {
        let err = Tree::build([file("a/../../etc/passwd")]).unwrap_err();
        assert!(matches!(err, Error::Format { .. }), "{err}");
    }

    #[test]
    fn file_naming_the_root_is_rejected() {
        let err = Tree::build([file("./")]).unwrap_err();
        assert!(matches!(err, Error::Format { .. }), "{err}");
    }

    #[test]
    fn empty_tree_has_only_the_root() {
        let tree = TreeBuilder::new().finish();
        assert!(tree.is_empty());
        assert!(tree.node(Tree::ROOT).is_dir());
        assert_eq!(tree.node(Tree::ROOT).path, ".");
        assert_eq!(tree.children(Tree::ROOT).count(), 0);
    }
}
