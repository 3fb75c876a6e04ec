//! Tree construction from flat directory listings.
//!
//! This module turns the flat [`FileEntry`] listing of one scan into the
//! hierarchical [`TreeNode`] projection, stamping every file with its
//! current registry status and deriving directory aggregates.
//!
//! Directories are synthesized purely from file paths - the raw listing
//! carries no directory entries. The tree is rebuilt wholesale on re-scan;
//! only [`refresh_statuses`] mutates an existing tree, and it mutates
//! status fields exclusively so that UI state keyed by node path survives.

use std::collections::BTreeMap;

use camino::{Utf8Path, Utf8PathBuf};
use ds_core::{FileEntry, FileStatus, TreeNode};
use ds_registry::FileRegistry;
use smallvec::SmallVec;
use tracing::debug;

use crate::error::ScanError;

/// Path segments of one listing entry; stack-allocated for typical depths.
type Segments<'a> = SmallVec<[&'a str; 8]>;

/// Builds a status-annotated tree from a flat listing.
///
/// Entries are grouped by `/`-separated path segments; intermediate
/// directories are synthesized as needed. Each file node is stamped with
/// the registry status for its path (`Unregistered` when the path is
/// unknown), and each directory derives its aggregate status from its
/// descendants.
///
/// Children are ordered directories-first, then files, each alphabetically.
///
/// # Errors
///
/// Returns [`ScanError::EmptyPath`] if any entry carries an empty path.
///
/// # Examples
///
/// ```
/// use ds_core::FileEntry;
/// use ds_registry::FileRegistry;
/// use ds_scanner::build_tree;
/// use camino::Utf8PathBuf;
///
/// let registry = FileRegistry::in_memory();
/// let entries = vec![
///     FileEntry::new(Utf8PathBuf::from("dirA/f1.txt"), 10, 0),
///     FileEntry::new(Utf8PathBuf::from("dirA/dirB/f2.txt"), 20, 0),
/// ];
///
/// let tree = build_tree(&entries, &registry)?;
/// assert_eq!(tree.len(), 1);
/// assert_eq!(tree[0].name, "dirA");
/// # Ok::<(), ds_scanner::ScanError>(())
/// ```
pub fn build_tree(
    entries: &[FileEntry],
    registry: &FileRegistry,
) -> Result<Vec<TreeNode>, ScanError> {
    let mut items: Vec<(Segments<'_>, &FileEntry)> = Vec::with_capacity(entries.len());
    for entry in entries {
        let segments: Segments<'_> = entry
            .relative_path
            .components()
            .map(|c| c.as_str())
            .collect();
        if segments.is_empty() {
            return Err(ScanError::EmptyPath);
        }
        items.push((segments, entry));
    }

    let mut roots = build_level(Utf8Path::new(""), 0, &items, registry);
    for root in &mut roots {
        root.recompute_aggregate();
    }

    debug!(entries = entries.len(), roots = roots.len(), "Tree built");
    Ok(roots)
}

/// Builds one directory level from the items that live below `prefix`.
fn build_level(
    prefix: &Utf8Path,
    depth: usize,
    items: &[(Segments<'_>, &FileEntry)],
    registry: &FileRegistry,
) -> Vec<TreeNode> {
    // Group by the segment at this depth: leaves become file nodes,
    // everything else becomes a synthesized directory.
    let mut dirs: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    let mut files: Vec<(&str, &FileEntry)> = Vec::new();

    for (index, (segments, entry)) in items.iter().enumerate() {
        let name = segments[depth];
        if depth + 1 == segments.len() {
            files.push((name, entry));
        } else {
            dirs.entry(name).or_default().push(index);
        }
    }

    let mut nodes = Vec::with_capacity(dirs.len() + files.len());

    for (name, indices) in dirs {
        let path = if prefix.as_str().is_empty() {
            Utf8PathBuf::from(name)
        } else {
            prefix.join(name)
        };

        let subset: Vec<(Segments<'_>, &FileEntry)> = indices
            .into_iter()
            .map(|i| (items[i].0.clone(), items[i].1))
            .collect();

        let mut node = TreeNode::directory(name, path.clone());
        node.children = build_level(&path, depth + 1, &subset, registry);
        nodes.push(node);
    }

    files.sort_by_key(|(name, _)| *name);
    for (name, entry) in files {
        nodes.push(TreeNode::file(
            name,
            entry.relative_path.clone(),
            entry.size,
            entry.last_modified,
            status_for(registry, &entry.relative_path),
        ));
    }

    nodes
}

/// Re-queries the registry for every file node and updates statuses in
/// place, recomputing directory aggregates.
///
/// This is the explicit cache-bypassing refresh path: node identity and
/// structure are preserved, only `status` fields change.
///
/// # Examples
///
/// ```
/// use ds_core::{FileEntry, FileStatus};
/// use ds_registry::FileRegistry;
/// use ds_scanner::{build_tree, refresh_statuses};
/// use camino::{Utf8Path, Utf8PathBuf};
///
/// let registry = FileRegistry::in_memory();
/// let entries = vec![FileEntry::new(Utf8PathBuf::from("doc.pdf"), 10, 0)];
/// let mut tree = build_tree(&entries, &registry)?;
/// assert_eq!(tree[0].status, FileStatus::Unregistered);
///
/// registry.register(Utf8Path::new("doc.pdf"), None, 10)?;
/// refresh_statuses(&mut tree, &registry);
/// assert_eq!(tree[0].status, FileStatus::Pending);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn refresh_statuses(nodes: &mut [TreeNode], registry: &FileRegistry) {
    for node in nodes.iter_mut() {
        refresh_node(node, registry);
        node.recompute_aggregate();
    }
}

/// Depth-first status refresh of one subtree.
fn refresh_node(node: &mut TreeNode, registry: &FileRegistry) {
    if node.is_file() {
        node.status = status_for(registry, &node.path);
    } else {
        for child in &mut node.children {
            refresh_node(child, registry);
        }
    }
}

/// Looks up the registry status for a path; unknown paths read as
/// unregistered, never as an error.
fn status_for(registry: &FileRegistry, path: &Utf8Path) -> FileStatus {
    registry
        .get_status(path)
        .map_or(FileStatus::Unregistered, |record| record.status)
}
