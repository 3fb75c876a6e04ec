//! Signature-keyed cache for built trees.
//!
//! Rebuilding a tree means re-querying registry status for every file in a
//! potentially large directory. The cache avoids that work when nothing
//! changed: a hit requires both an identical listing signature and a build
//! inside the freshness window. The TTL bounds staleness for the case where
//! files are processed server-side between scans without the listing
//! itself changing.
//!
//! # Safety Pattern
//!
//! The cache is an explicit process-scoped handle - there is no global
//! singleton. It never exposes lock guards; `get` returns a clone of the
//! cached tree.

use ds_core::{unix_now, FxHashMap, TreeNode};
use parking_lot::RwLock;
use tracing::debug;

/// One cached tree with its change-detection metadata.
#[derive(Debug, Clone)]
struct CachedTree {
    /// Signature of the listing the tree was built from.
    signature: u64,
    /// Unix timestamp of the build.
    built_at: u64,
    /// The built tree.
    tree: Vec<TreeNode>,
}

/// A signature + TTL cache of built trees, keyed by directory.
///
/// # Thread Safety
///
/// `TreeCache` is `Send + Sync`; share one handle per scanner session.
///
/// # Examples
///
/// ```
/// use ds_scanner::TreeCache;
///
/// let cache = TreeCache::new(300);
///
/// cache.insert_at("documents", 42, Vec::new(), 1000);
///
/// // Same signature inside the window: hit.
/// assert!(cache.get_at("documents", 42, 1100).is_some());
///
/// // Changed listing: miss.
/// assert!(cache.get_at("documents", 43, 1100).is_none());
///
/// // Same signature but stale: miss.
/// assert!(cache.get_at("documents", 42, 2000).is_none());
/// ```
#[derive(Debug)]
pub struct TreeCache {
    /// Cached trees keyed by directory identifier.
    entries: RwLock<FxHashMap<String, CachedTree>>,

    /// Freshness window in seconds.
    ttl_secs: u64,
}

impl TreeCache {
    /// Creates an empty cache with the given freshness window.
    #[must_use]
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            entries: RwLock::new(FxHashMap::default()),
            ttl_secs,
        }
    }

    /// Returns the cached tree for a directory when the signature matches
    /// and the entry is still fresh.
    #[must_use]
    pub fn get(&self, directory: &str, signature: u64) -> Option<Vec<TreeNode>> {
        self.get_at(directory, signature, unix_now())
    }

    /// Lookup with an explicit wall-clock, for deterministic tests.
    #[must_use]
    pub fn get_at(&self, directory: &str, signature: u64, now: u64) -> Option<Vec<TreeNode>> {
        let entries = self.entries.read();
        let cached = entries.get(directory)?;

        if cached.signature != signature {
            debug!(directory, "Cache miss: listing changed");
            return None;
        }
        if now.saturating_sub(cached.built_at) > self.ttl_secs {
            debug!(directory, "Cache miss: entry expired");
            return None;
        }

        debug!(directory, "Cache hit");
        Some(cached.tree.clone())
    }

    /// Stores a freshly built tree for a directory.
    pub fn insert(&self, directory: &str, signature: u64, tree: Vec<TreeNode>) {
        self.insert_at(directory, signature, tree, unix_now());
    }

    /// Insert with an explicit wall-clock, for deterministic tests.
    pub fn insert_at(&self, directory: &str, signature: u64, tree: Vec<TreeNode>, now: u64) {
        self.entries.write().insert(
            directory.to_owned(),
            CachedTree {
                signature,
                built_at: now,
                tree,
            },
        );
    }

    /// Drops the cached tree for one directory.
    pub fn invalidate(&self, directory: &str) {
        self.entries.write().remove(directory);
    }

    /// Drops all cached trees.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Returns the number of cached directories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns `true` if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use ds_core::{FileStatus, TreeNode};

    fn sample_tree() -> Vec<TreeNode> {
        vec![TreeNode::file(
            "a.pdf",
            Utf8PathBuf::from("a.pdf"),
            10,
            0,
            FileStatus::Pending,
        )]
    }

    #[test]
    fn test_hit_within_window() {
        let cache = TreeCache::new(300);
        cache.insert_at("docs", 7, sample_tree(), 1000);

        let hit = cache.get_at("docs", 7, 1299);
        assert_eq!(hit, Some(sample_tree()));
    }

    #[test]
    fn test_miss_on_signature_change() {
        let cache = TreeCache::new(300);
        cache.insert_at("docs", 7, sample_tree(), 1000);
        assert!(cache.get_at("docs", 8, 1001).is_none());
    }

    #[test]
    fn test_miss_after_ttl() {
        let cache = TreeCache::new(300);
        cache.insert_at("docs", 7, sample_tree(), 1000);
        assert!(cache.get_at("docs", 7, 1301).is_none());
    }

    #[test]
    fn test_miss_on_unknown_directory() {
        let cache = TreeCache::new(300);
        assert!(cache.get_at("never", 1, 0).is_none());
    }

    #[test]
    fn test_invalidate_single_directory() {
        let cache = TreeCache::new(300);
        cache.insert_at("a", 1, sample_tree(), 0);
        cache.insert_at("b", 2, sample_tree(), 0);

        cache.invalidate("a");

        assert!(cache.get_at("a", 1, 0).is_none());
        assert!(cache.get_at("b", 2, 0).is_some());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_clear() {
        let cache = TreeCache::new(300);
        cache.insert_at("a", 1, sample_tree(), 0);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_reinsert_replaces() {
        let cache = TreeCache::new(300);
        cache.insert_at("docs", 1, sample_tree(), 0);
        cache.insert_at("docs", 2, Vec::new(), 0);

        assert!(cache.get_at("docs", 1, 0).is_none());
        assert_eq!(cache.get_at("docs", 2, 0), Some(Vec::new()));
    }
}
