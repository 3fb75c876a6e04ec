//! Directory scanner and status-annotated tree builder with caching.
//!
//! This crate converts a raw file listing - from a server-side directory
//! walk or a client-side directory pick - into a hierarchical tree
//! annotated with each file's current registry status, and caches built
//! trees keyed by a listing signature.
//!
//! # Overview
//!
//! The main entry point is [`Scanner`], which combines:
//!
//! - [`FileWalker`]: directory traversal respecting `.gitignore` patterns
//! - [`build_tree`]: tree construction with registry status stamping
//! - [`TreeCache`]: signature + TTL caching of built trees
//! - [`TreeView`]: presentation-side depth/sibling truncation
//!
//! # Example
//!
//! ```ignore
//! use ds_scanner::Scanner;
//! use ds_registry::FileRegistry;
//! use ds_core::ScanConfig;
//! use camino::Utf8Path;
//!
//! let registry = FileRegistry::in_memory();
//! let scanner = Scanner::new(ScanConfig::default());
//!
//! let outcome = scanner.scan(Utf8Path::new("./documents"), &registry)?;
//! println!("{} files, cache hit: {}", outcome.entries.len(), outcome.cache_hit);
//!
//! // Re-scan of an unchanged directory serves the cached tree.
//! let again = scanner.scan(Utf8Path::new("./documents"), &registry)?;
//! assert!(again.cache_hit);
//! ```
//!
//! # Ownership
//!
//! The tree belongs to the scanner session that built it and is replaced
//! wholesale on re-scan. The only in-place mutation is
//! [`refresh_statuses`], which re-stamps status fields from the registry
//! while preserving node identity.

#![deny(clippy::all)]
#![warn(missing_docs)]

mod cache;
mod error;
mod tree;
mod view;
mod walker;

pub use cache::TreeCache;
pub use error::ScanError;
pub use tree::{build_tree, refresh_statuses};
pub use view::TreeView;
pub use walker::FileWalker;

use camino::Utf8Path;
use ds_core::{scan_signature, FileEntry, ScanConfig, TreeNode};
use ds_registry::FileRegistry;
use tracing::{debug, info};

/// Result of one directory scan.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    /// The built (or cached) tree.
    pub tree: Vec<TreeNode>,

    /// The flat listing the tree was built from.
    pub entries: Vec<FileEntry>,

    /// Signature of the listing, usable for cache bookkeeping.
    pub signature: u64,

    /// Whether the tree came from the cache.
    pub cache_hit: bool,
}

/// Scanner session: walker + tree builder + cache behind one handle.
///
/// The cache is constructed with the scanner and torn down with it - an
/// explicit handle, never a global.
#[derive(Debug)]
pub struct Scanner {
    /// Scanner configuration.
    config: ScanConfig,

    /// Cache of built trees for this session.
    cache: TreeCache,
}

impl Scanner {
    /// Creates a scanner session with the given configuration.
    #[must_use]
    pub fn new(config: ScanConfig) -> Self {
        let cache = TreeCache::new(config.cache_ttl_secs);
        Self { config, cache }
    }

    /// Scans a directory and returns its status-annotated tree.
    ///
    /// When the directory's listing signature matches a fresh cache entry
    /// the cached tree is returned without re-querying the registry;
    /// otherwise the tree is rebuilt and cached.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError`] if the walk or tree construction fails.
    pub fn scan(
        &self,
        root: &Utf8Path,
        registry: &FileRegistry,
    ) -> Result<ScanOutcome, ScanError> {
        let walker = FileWalker::new(root)?.with_skip_dirs(&self.config.skip_dirs);
        let entries = walker.collect_entries()?;
        let signature = scan_signature(&entries);

        if let Some(tree) = self.cache.get(root.as_str(), signature) {
            debug!(root = %root, "Serving cached tree");
            return Ok(ScanOutcome {
                tree,
                entries,
                signature,
                cache_hit: true,
            });
        }

        let tree = build_tree(&entries, registry)?;
        self.cache.insert(root.as_str(), signature, tree.clone());

        info!(root = %root, files = entries.len(), "Directory scanned");
        Ok(ScanOutcome {
            tree,
            entries,
            signature,
            cache_hit: false,
        })
    }

    /// Re-stamps a tree's statuses from the registry, in place.
    ///
    /// This is the explicit refresh path: it bypasses and invalidates the
    /// cached tree for `root`, so the next [`scan`](Self::scan) rebuilds
    /// from live registry state.
    pub fn refresh(&self, root: &Utf8Path, tree: &mut [TreeNode], registry: &FileRegistry) {
        refresh_statuses(tree, registry);
        self.cache.invalidate(root.as_str());
        debug!(root = %root, "Tree statuses refreshed");
    }

    /// Builds the truncated presentation view of a tree per the configured
    /// depth and sibling caps.
    #[must_use]
    pub fn view(&self, tree: &[TreeNode]) -> TreeView {
        TreeView::truncated(tree, self.config.max_tree_depth, self.config.max_siblings)
    }

    /// Returns the scanner's cache handle.
    #[must_use]
    pub const fn cache(&self) -> &TreeCache {
        &self.cache
    }

    /// Returns the scanner configuration.
    #[must_use]
    pub const fn config(&self) -> &ScanConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn fixture() -> (TempDir, Scanner, FileRegistry) {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let root = Utf8Path::from_path(dir.path()).expect("Invalid path");
        fs::create_dir_all(root.join("sub").as_std_path()).expect("mkdir failed");
        fs::write(root.join("a.pdf").as_std_path(), b"%PDF").expect("write failed");
        fs::write(root.join("sub/b.txt").as_std_path(), b"hello").expect("write failed");

        (dir, Scanner::new(ScanConfig::default()), FileRegistry::in_memory())
    }

    #[test]
    fn test_scan_builds_tree() {
        let (dir, scanner, registry) = fixture();
        let root = Utf8Path::from_path(dir.path()).expect("Invalid path");

        let outcome = scanner.scan(root, &registry).expect("scan failed");
        assert!(!outcome.cache_hit);
        assert_eq!(outcome.entries.len(), 2);
        assert_eq!(outcome.tree.len(), 2); // "sub" directory + "a.pdf"
    }

    #[test]
    fn test_second_scan_hits_cache() {
        let (dir, scanner, registry) = fixture();
        let root = Utf8Path::from_path(dir.path()).expect("Invalid path");

        let first = scanner.scan(root, &registry).expect("scan failed");
        let second = scanner.scan(root, &registry).expect("scan failed");

        assert!(!first.cache_hit);
        assert!(second.cache_hit);
        assert_eq!(first.signature, second.signature);
        assert_eq!(first.tree, second.tree);
    }

    #[test]
    fn test_listing_change_misses_cache() {
        let (dir, scanner, registry) = fixture();
        let root = Utf8Path::from_path(dir.path()).expect("Invalid path");

        let first = scanner.scan(root, &registry).expect("scan failed");
        fs::write(root.join("new.pdf").as_std_path(), b"%PDF").expect("write failed");
        let second = scanner.scan(root, &registry).expect("scan failed");

        assert!(!second.cache_hit);
        assert_ne!(first.signature, second.signature);
        assert_eq!(second.entries.len(), 3);
    }

    #[test]
    fn test_refresh_invalidates_cache() {
        let (dir, scanner, registry) = fixture();
        let root = Utf8Path::from_path(dir.path()).expect("Invalid path");

        let mut outcome = scanner.scan(root, &registry).expect("scan failed");
        registry
            .register(Utf8Path::new("a.pdf"), None, 4)
            .expect("register failed");

        scanner.refresh(root, &mut outcome.tree, &registry);

        // The refreshed tree sees the registration...
        assert_eq!(
            outcome
                .tree
                .iter()
                .find_map(|n| n.find("a.pdf"))
                .map(|n| n.status),
            Some(ds_core::FileStatus::Pending)
        );

        // ...and the next scan rebuilds rather than serving the stale tree.
        let next = scanner.scan(root, &registry).expect("scan failed");
        assert!(!next.cache_hit);
    }

    #[test]
    fn test_view_applies_config_caps() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let root = Utf8Path::from_path(dir.path()).expect("Invalid path");
        for i in 0..5 {
            fs::write(root.join(format!("f{i}.pdf")).as_std_path(), b"x").expect("write failed");
        }

        let scanner = Scanner::new(ScanConfig {
            max_siblings: 2,
            ..ScanConfig::default()
        });
        let registry = FileRegistry::in_memory();
        let outcome = scanner.scan(root, &registry).expect("scan failed");

        let view = scanner.view(&outcome.tree);
        assert_eq!(view.nodes.len(), 2);
        assert_eq!(view.hidden_siblings, 3);
    }
}
