//! Directory tree projection types.
//!
//! This module provides [`TreeNode`], the read-side hierarchical projection
//! of a directory scan, and [`FileEntry`], the flat scan row a tree is built
//! from. Tree data is never authoritative: it is a projection of registry
//! state and is rebuilt wholesale on re-scan.

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use super::status::FileStatus;

/// One row of a raw directory listing, before tree construction.
///
/// Produced either by the server-side directory walker or from a
/// client-side directory pick.
///
/// # Examples
///
/// ```
/// use ds_core::FileEntry;
/// use camino::Utf8PathBuf;
///
/// let entry = FileEntry::new(Utf8PathBuf::from("dirA/f1.txt"), 1000, 1704067200);
/// assert_eq!(entry.relative_path.as_str(), "dirA/f1.txt");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Path relative to the scanned root, `/`-separated.
    pub relative_path: Utf8PathBuf,

    /// File size in bytes.
    pub size: u64,

    /// Unix timestamp of the last filesystem modification.
    pub last_modified: u64,
}

impl FileEntry {
    /// Creates a new entry.
    #[inline]
    #[must_use]
    pub const fn new(relative_path: Utf8PathBuf, size: u64, last_modified: u64) -> Self {
        Self {
            relative_path,
            size,
            last_modified,
        }
    }
}

/// Whether a tree node is a file or a synthesized directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// A scanned file.
    File,
    /// A directory inferred from file paths (the raw listing carries no
    /// directory entries).
    Directory,
}

/// A node in the scanned directory tree.
///
/// File nodes carry a denormalized copy of the registry status; directory
/// nodes carry the aggregate of their descendants per
/// [`FileStatus::aggregate`]. Neither is authoritative - the registry is.
///
/// The `path` is the unique key within one scan and is stable across
/// in-place status refreshes, so UI state keyed by path stays valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    /// Final path component.
    pub name: String,

    /// Full `/`-separated path from the scan root; unique within one scan.
    pub path: Utf8PathBuf,

    /// File or directory.
    pub kind: NodeKind,

    /// File size in bytes (0 for directories).
    pub size: u64,

    /// Unix timestamp of last modification (files only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<u64>,

    /// Denormalized status projection; aggregate for directories.
    pub status: FileStatus,

    /// Child nodes (directories only; empty for files).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// Creates a file node.
    #[must_use]
    pub fn file(
        name: impl Into<String>,
        path: Utf8PathBuf,
        size: u64,
        last_modified: u64,
        status: FileStatus,
    ) -> Self {
        Self {
            name: name.into(),
            path,
            kind: NodeKind::File,
            size,
            last_modified: Some(last_modified),
            status,
            children: Vec::new(),
        }
    }

    /// Creates an empty directory node.
    ///
    /// Directory status starts as [`FileStatus::Unregistered`] and is
    /// recomputed once the subtree is populated.
    #[must_use]
    pub fn directory(name: impl Into<String>, path: Utf8PathBuf) -> Self {
        Self {
            name: name.into(),
            path,
            kind: NodeKind::Directory,
            size: 0,
            last_modified: None,
            status: FileStatus::Unregistered,
            children: Vec::new(),
        }
    }

    /// Returns `true` if this node is a file.
    #[inline]
    #[must_use]
    pub fn is_file(&self) -> bool {
        self.kind == NodeKind::File
    }

    /// Returns `true` if this node is a directory.
    #[inline]
    #[must_use]
    pub fn is_directory(&self) -> bool {
        self.kind == NodeKind::Directory
    }

    /// Returns the number of file nodes in this subtree, including self.
    ///
    /// # Examples
    ///
    /// ```
    /// use ds_core::{FileStatus, TreeNode};
    /// use camino::Utf8PathBuf;
    ///
    /// let mut dir = TreeNode::directory("docs", Utf8PathBuf::from("docs"));
    /// dir.children.push(TreeNode::file(
    ///     "a.txt",
    ///     Utf8PathBuf::from("docs/a.txt"),
    ///     10,
    ///     0,
    ///     FileStatus::Pending,
    /// ));
    /// assert_eq!(dir.file_count(), 1);
    /// ```
    #[must_use]
    pub fn file_count(&self) -> usize {
        match self.kind {
            NodeKind::File => 1,
            NodeKind::Directory => self.children.iter().map(TreeNode::file_count).sum(),
        }
    }

    /// Iterates over the statuses of all descendant files (depth-first).
    fn descendant_file_statuses(&self, out: &mut Vec<FileStatus>) {
        match self.kind {
            NodeKind::File => out.push(self.status),
            NodeKind::Directory => {
                for child in &self.children {
                    child.descendant_file_statuses(out);
                }
            }
        }
    }

    /// Recomputes this directory's aggregate status (and its descendants')
    /// from the file nodes below it.
    ///
    /// File nodes are left untouched. Call after building a subtree or
    /// after refreshing file statuses in place.
    pub fn recompute_aggregate(&mut self) {
        if self.kind == NodeKind::File {
            return;
        }
        for child in &mut self.children {
            child.recompute_aggregate();
        }
        let mut statuses = Vec::new();
        self.descendant_file_statuses(&mut statuses);
        self.status = FileStatus::aggregate(statuses);
    }

    /// Finds a node by path in this subtree.
    #[must_use]
    pub fn find(&self, path: &str) -> Option<&TreeNode> {
        if self.path.as_str() == path {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(path: &str, status: FileStatus) -> TreeNode {
        let path = Utf8PathBuf::from(path);
        let name = path.file_name().unwrap_or_default().to_owned();
        TreeNode::file(name, path, 100, 0, status)
    }

    #[test]
    fn test_node_kinds() {
        let f = file("a/b.txt", FileStatus::Pending);
        assert!(f.is_file());
        assert!(!f.is_directory());

        let d = TreeNode::directory("a", Utf8PathBuf::from("a"));
        assert!(d.is_directory());
        assert_eq!(d.size, 0);
        assert!(d.last_modified.is_none());
    }

    #[test]
    fn test_recompute_aggregate_precedence() {
        let mut dir = TreeNode::directory("docs", Utf8PathBuf::from("docs"));
        dir.children.push(file("docs/a.txt", FileStatus::Failed));
        dir.children.push(file("docs/b.txt", FileStatus::Completed));
        dir.recompute_aggregate();
        assert_eq!(dir.status, FileStatus::Failed);

        let mut dir = TreeNode::directory("docs", Utf8PathBuf::from("docs"));
        dir.children
            .push(file("docs/a.txt", FileStatus::InProgress));
        dir.children.push(file("docs/b.txt", FileStatus::Completed));
        dir.recompute_aggregate();
        assert_eq!(dir.status, FileStatus::InProgress);

        let mut dir = TreeNode::directory("docs", Utf8PathBuf::from("docs"));
        dir.children.push(file("docs/a.txt", FileStatus::Completed));
        dir.children.push(file("docs/b.txt", FileStatus::Completed));
        dir.recompute_aggregate();
        assert_eq!(dir.status, FileStatus::Completed);
    }

    #[test]
    fn test_recompute_aggregate_nested() {
        let mut inner = TreeNode::directory("docs/sub", Utf8PathBuf::from("docs/sub"));
        inner.children.push(file("docs/sub/x.txt", FileStatus::Failed));

        let mut dir = TreeNode::directory("docs", Utf8PathBuf::from("docs"));
        dir.children.push(file("docs/a.txt", FileStatus::Completed));
        dir.children.push(inner);
        dir.recompute_aggregate();

        // The failure deep in the subtree dominates the whole directory.
        assert_eq!(dir.status, FileStatus::Failed);
        assert_eq!(dir.children[1].status, FileStatus::Failed);
    }

    #[test]
    fn test_file_count() {
        let mut sub = TreeNode::directory("d/s", Utf8PathBuf::from("d/s"));
        sub.children.push(file("d/s/1.txt", FileStatus::Pending));
        sub.children.push(file("d/s/2.txt", FileStatus::Pending));

        let mut dir = TreeNode::directory("d", Utf8PathBuf::from("d"));
        dir.children.push(file("d/0.txt", FileStatus::Pending));
        dir.children.push(sub);

        assert_eq!(dir.file_count(), 3);
    }

    #[test]
    fn test_find_by_path() {
        let mut dir = TreeNode::directory("d", Utf8PathBuf::from("d"));
        dir.children.push(file("d/a.txt", FileStatus::Pending));

        assert!(dir.find("d/a.txt").is_some());
        assert!(dir.find("d/missing.txt").is_none());
        assert_eq!(dir.find("d").map(|n| n.kind), Some(NodeKind::Directory));
    }

    #[test]
    fn test_serialization_roundtrip() {
        let mut dir = TreeNode::directory("d", Utf8PathBuf::from("d"));
        dir.children.push(file("d/a.txt", FileStatus::Completed));
        dir.recompute_aggregate();

        let json = serde_json::to_string(&dir).unwrap();
        let parsed: TreeNode = serde_json::from_str(&json).unwrap();
        assert_eq!(dir, parsed);
    }
}
