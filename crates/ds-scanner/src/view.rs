//! Presentation-side tree truncation.
//!
//! Very deep trees and very wide directories are capped for rendering, but
//! the underlying tree data stays complete and queryable - truncation is a
//! view layered on top, never a mutation of scan results.

use ds_core::TreeNode;

/// A render-ready view of a tree with depth and sibling caps applied.
///
/// # Examples
///
/// ```
/// use ds_core::{FileStatus, TreeNode};
/// use ds_scanner::TreeView;
/// use camino::Utf8PathBuf;
///
/// let mut dir = TreeNode::directory("docs", Utf8PathBuf::from("docs"));
/// for i in 0..10 {
///     let path = Utf8PathBuf::from(format!("docs/f{i}.txt"));
///     dir.children.push(TreeNode::file(
///         format!("f{i}.txt"),
///         path,
///         1,
///         0,
///         FileStatus::Pending,
///     ));
/// }
///
/// let view = TreeView::truncated(&[dir], 32, 4);
/// assert_eq!(view.nodes[0].children.len(), 4);
/// assert_eq!(view.hidden_siblings, 6);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TreeView {
    /// The truncated node forest.
    pub nodes: Vec<TreeNode>,

    /// Total sibling nodes hidden by the per-directory cap.
    pub hidden_siblings: usize,

    /// Total subtrees hidden by the depth cap.
    pub depth_capped: usize,
}

impl TreeView {
    /// Builds a truncated view of a tree.
    ///
    /// At most `max_siblings` children are kept per directory and subtrees
    /// below `max_depth` are pruned. The input tree is not modified.
    #[must_use]
    pub fn truncated(nodes: &[TreeNode], max_depth: usize, max_siblings: usize) -> Self {
        let mut hidden_siblings = 0usize;
        let mut depth_capped = 0usize;

        let nodes = truncate_level(nodes, 0, max_depth, max_siblings, &mut hidden_siblings, &mut depth_capped);

        Self {
            nodes,
            hidden_siblings,
            depth_capped,
        }
    }

    /// Returns `true` if any node was hidden by either cap.
    #[inline]
    #[must_use]
    pub const fn is_truncated(&self) -> bool {
        self.hidden_siblings > 0 || self.depth_capped > 0
    }
}

/// Copies one level, applying both caps.
fn truncate_level(
    nodes: &[TreeNode],
    depth: usize,
    max_depth: usize,
    max_siblings: usize,
    hidden_siblings: &mut usize,
    depth_capped: &mut usize,
) -> Vec<TreeNode> {
    let kept = nodes.len().min(max_siblings);
    *hidden_siblings += nodes.len() - kept;

    nodes[..kept]
        .iter()
        .map(|node| {
            let mut copy = node.clone();
            if copy.children.is_empty() {
                return copy;
            }
            if depth + 1 >= max_depth {
                *depth_capped += copy.children.len();
                copy.children = Vec::new();
            } else {
                copy.children = truncate_level(
                    &copy.children,
                    depth + 1,
                    max_depth,
                    max_siblings,
                    hidden_siblings,
                    depth_capped,
                );
            }
            copy
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use ds_core::FileStatus;

    fn file(path: &str) -> TreeNode {
        let path = Utf8PathBuf::from(path);
        let name = path.file_name().unwrap_or_default().to_owned();
        TreeNode::file(name, path, 1, 0, FileStatus::Pending)
    }

    fn wide_dir(count: usize) -> TreeNode {
        let mut dir = TreeNode::directory("docs", Utf8PathBuf::from("docs"));
        for i in 0..count {
            dir.children.push(file(&format!("docs/f{i}.txt")));
        }
        dir
    }

    #[test]
    fn test_no_truncation_when_under_caps() {
        let tree = vec![wide_dir(3)];
        let view = TreeView::truncated(&tree, 32, 500);

        assert_eq!(view.nodes, tree);
        assert!(!view.is_truncated());
    }

    #[test]
    fn test_sibling_cap() {
        let tree = vec![wide_dir(10)];
        let view = TreeView::truncated(&tree, 32, 4);

        assert_eq!(view.nodes[0].children.len(), 4);
        assert_eq!(view.hidden_siblings, 6);
        assert!(view.is_truncated());
    }

    #[test]
    fn test_depth_cap() {
        let mut inner = TreeNode::directory("docs/sub", Utf8PathBuf::from("docs/sub"));
        inner.children.push(file("docs/sub/deep.txt"));
        let mut outer = TreeNode::directory("docs", Utf8PathBuf::from("docs"));
        outer.children.push(inner);

        let view = TreeView::truncated(&[outer], 2, 500);

        // The directory below the cap survives, its children do not.
        assert_eq!(view.nodes[0].children.len(), 1);
        assert!(view.nodes[0].children[0].children.is_empty());
        assert_eq!(view.depth_capped, 1);
    }

    #[test]
    fn test_input_tree_not_modified() {
        let tree = vec![wide_dir(10)];
        let _ = TreeView::truncated(&tree, 1, 1);
        assert_eq!(tree[0].children.len(), 10);
    }
}
