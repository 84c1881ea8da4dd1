use super::metadata::Metadata;
use super::path::join;
use super::tree::{NodeId, Tree};

/// Depth-first, name-ordered traversal, created by [`TarFs::walk`](super::TarFs::walk).
///
/// Yields the starting entry first, then every descendant as
/// `(path, metadata)`, with paths relative to the filesystem root.
pub struct Walk<'a> {
    tree: &'a Tree,
    stack: Vec<(NodeId, String)>,
}

impl<'a> Walk<'a> {
    pub(crate) fn new(tree: &'a Tree, start: NodeId, path: &str) -> Self {
        Self {
            tree,
            stack: vec![(start, path.to_owned())],
        }
    }
}

impl Iterator for Walk<'_> {
    type Item = (String, Metadata);

    fn next(&mut self) -> Option<Self::Item> {
        let (id, path) = self.stack.pop()?;
        let node = self.tree.node(id);

        // Pushed in reverse so the smallest name is visited first
        for child in self.tree.children(id).rev() {
            let name = &self.tree.node(child).name;
            self.stack.push((child, join(&path, name)));
        }

        Some((path, node.metadata()))
    }
}
