use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use crate::error::{Error, Result};
use crate::io::ReadAt;
use crate::tar::TarScanner;

use super::file::TarFile;
use super::glob;
use super::metadata::Metadata;
use super::path::{join, resolve};
use super::tree::{NodeId, Tree};
use super::walk::Walk;

/// A tar archive exposed as a read-only filesystem.
///
/// Construction scans every header once and builds the directory tree;
/// after that, `stat`, `read_dir`, `glob`, `sub` and `walk` only consult
/// the tree, and file content is fetched lazily through [`TarFile`]s.
///
/// ## Example
///
/// ```no_run
/// use std::sync::Arc;
/// use runtar::{LocalFileReader, TarFs};
///
/// # async fn run() -> anyhow::Result<()> {
/// let reader = Arc::new(LocalFileReader::new("test.tar".as_ref())?);
/// let fs = TarFs::new(reader).await?;
///
/// for entry in fs.read_dir(".")? {
///     println!("{} {}", entry.name(), entry.size());
/// }
/// let content = fs.read_file("dir1/dir11/file111").await?;
/// # Ok(())
/// # }
/// ```
pub struct TarFs<R: ReadAt> {
    reader: Arc<R>,
    tree: Arc<Tree>,
    /// Node this view treats as `.`
    root: NodeId,
}

impl<R: ReadAt> Clone for TarFs<R> {
    fn clone(&self) -> Self {
        Self {
            reader: Arc::clone(&self.reader),
            tree: Arc::clone(&self.tree),
            root: self.root,
        }
    }
}

impl<R: ReadAt> TarFs<R> {
    /// Index the archive behind `reader`.
    ///
    /// # Errors
    ///
    /// [`Error::Format`] if any header is malformed or truncated, or if the
    /// members describe an impossible tree. No filesystem is produced then.
    pub async fn new(reader: Arc<R>) -> Result<Self> {
        let started = Instant::now();

        let entries = TarScanner::new(Arc::clone(&reader)).scan().await?;
        let members = entries.len();
        let tree = Tree::build(entries)?;

        info!(
            members,
            nodes = tree.len(),
            elapsed = ?started.elapsed(),
            "indexed tar archive"
        );

        Ok(Self {
            reader,
            tree: Arc::new(tree),
            root: Tree::ROOT,
        })
    }

    /// Get a reference to the underlying storage.
    pub fn reader(&self) -> &Arc<R> {
        &self.reader
    }

    /// Open an entry. Directories open too, but their handles refuse byte reads.
    pub fn open(&self, path: &str) -> Result<TarFile<R>> {
        let id = resolve(&self.tree, self.root, "open", path)?;
        Ok(TarFile::new(
            Arc::clone(&self.reader),
            Arc::clone(&self.tree),
            id,
            path,
        ))
    }

    pub fn stat(&self, path: &str) -> Result<Metadata> {
        let id = resolve(&self.tree, self.root, "stat", path)?;
        Ok(self.tree.node(id).metadata())
    }

    /// List a directory's immediate children, sorted by name.
    pub fn read_dir(&self, path: &str) -> Result<Vec<Metadata>> {
        let id = resolve(&self.tree, self.root, "readdir", path)?;
        if !self.tree.node(id).is_dir() {
            return Err(Error::not_dir("readdir", path));
        }
        Ok(self
            .tree
            .children(id)
            .map(|child| self.tree.node(child).metadata())
            .collect())
    }

    /// Read a whole file into memory.
    pub async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let mut file = self.open(path)?;
        let mut content = Vec::with_capacity(file.stat().size() as usize);
        file.read_to_end(&mut content).await?;
        Ok(content)
    }

    /// All paths matching `pattern`, sorted. Wildcards match within a single
    /// segment only, and a pattern deeper than the tree simply matches
    /// nothing.
    ///
    /// # Errors
    ///
    /// [`Error::BadPattern`] for malformed syntax, whether or not anything
    /// could have matched.
    pub fn glob(&self, pattern: &str) -> Result<Vec<String>> {
        let segments = glob::compile(pattern).ok_or_else(|| Error::BadPattern {
            pattern: pattern.to_owned(),
        })?;
        if pattern == "." {
            return Ok(vec![".".to_owned()]);
        }

        let mut frontier = vec![(self.root, ".".to_owned())];
        for segment in &segments {
            let mut next = Vec::new();
            for (dir, path) in &frontier {
                for child in self.tree.children(*dir) {
                    let name = &self.tree.node(child).name;
                    if segment.matches(name) {
                        next.push((child, join(path, name)));
                    }
                }
            }
            if next.is_empty() {
                return Ok(Vec::new());
            }
            frontier = next;
        }

        let mut matches: Vec<String> = frontier.into_iter().map(|(_, path)| path).collect();
        matches.sort();
        Ok(matches)
    }

    /// A view rooted at directory `dir`, sharing this view's tree and storage.
    pub fn sub(&self, dir: &str) -> Result<TarFs<R>> {
        let id = resolve(&self.tree, self.root, "sub", dir)?;
        if !self.tree.node(id).is_dir() {
            return Err(Error::not_dir("sub", dir));
        }
        Ok(Self {
            reader: Arc::clone(&self.reader),
            tree: Arc::clone(&self.tree),
            root: id,
        })
    }

    /// Walk `path` and everything beneath it, depth first in name order.
    pub fn walk(&self, path: &str) -> Result<Walk<'_>> {
        let id = resolve(&self.tree, self.root, "walk", path)?;
        Ok(Walk::new(&self.tree, id, path))
    }
}
