//! Fast hashing: map aliases, path identifiers, and scan signatures.
//!
//! This module provides type aliases for [`FxHashMap`] and [`FxHashSet`]
//! from the `rustc-hash` crate - approximately 2x faster than the standard
//! library's maps for string keys - plus the two domain hashes used across
//! the workspace:
//!
//! - [`path_id`]: the stable identifier hash behind
//!   [`FileId`](crate::FileId)
//! - [`scan_signature`]: the change-detection signature of a full directory
//!   listing, used as the tree cache key
//!
//! Neither hash is used in a security context, so denial-of-service
//! resistance is not required.

use std::hash::Hasher;

use rustc_hash::FxHasher;

use crate::types::FileEntry;

/// A [`HashMap`](std::collections::HashMap) using the Fx hash algorithm.
///
/// This is faster than the standard library's `HashMap` for string keys
/// but does not provide denial-of-service resistance.
pub type FxHashMap<K, V> = rustc_hash::FxHashMap<K, V>;

/// A [`HashSet`](std::collections::HashSet) using the Fx hash algorithm.
///
/// This is faster than the standard library's `HashSet` for string keys
/// but does not provide denial-of-service resistance.
pub type FxHashSet<V> = rustc_hash::FxHashSet<V>;

/// Creates a new empty [`FxHashMap`].
///
/// # Examples
///
/// ```
/// use ds_core::fx_hash_map;
///
/// let map: ds_core::FxHashMap<String, i32> = fx_hash_map();
/// assert!(map.is_empty());
/// ```
#[inline]
#[must_use]
pub fn fx_hash_map<K, V>() -> FxHashMap<K, V> {
    FxHashMap::default()
}

/// Creates a new empty [`FxHashSet`].
///
/// # Examples
///
/// ```
/// use ds_core::fx_hash_set;
///
/// let set: ds_core::FxHashSet<String> = fx_hash_set();
/// assert!(set.is_empty());
/// ```
#[inline]
#[must_use]
pub fn fx_hash_set<V>() -> FxHashSet<V> {
    FxHashSet::default()
}

/// Hashes a path string into the stable 64-bit file identifier.
///
/// The same path always produces the same value, which is what makes
/// registration idempotent per path.
///
/// # Examples
///
/// ```
/// use ds_core::path_id;
///
/// assert_eq!(path_id("a/b.txt"), path_id("a/b.txt"));
/// assert_ne!(path_id("a/b.txt"), path_id("a/c.txt"));
/// ```
#[must_use]
pub fn path_id(path: &str) -> u64 {
    let mut hasher = FxHasher::default();
    hasher.write(path.as_bytes());
    hasher.finish()
}

/// Computes the change-detection signature of a directory listing.
///
/// The signature covers the path, size, and modification time of every
/// entry, so any added, removed, renamed, or touched file produces a new
/// signature. Entry order matters: callers hash the listing as produced by
/// one scan, and a re-scan of an unchanged directory yields the same order.
///
/// # Examples
///
/// ```
/// use ds_core::{scan_signature, FileEntry};
/// use camino::Utf8PathBuf;
///
/// let entries = vec![FileEntry::new(Utf8PathBuf::from("a.txt"), 10, 100)];
/// let sig = scan_signature(&entries);
///
/// let mut touched = entries.clone();
/// touched[0].last_modified = 101;
/// assert_ne!(sig, scan_signature(&touched));
/// ```
#[must_use]
pub fn scan_signature(entries: &[FileEntry]) -> u64 {
    let mut hasher = FxHasher::default();
    for entry in entries {
        hasher.write(entry.relative_path.as_str().as_bytes());
        hasher.write_u8(b'|');
        hasher.write_u64(entry.size);
        hasher.write_u64(entry.last_modified);
    }
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;

    fn entry(path: &str, size: u64, mtime: u64) -> FileEntry {
        FileEntry::new(Utf8PathBuf::from(path), size, mtime)
    }

    #[test]
    fn test_fx_hash_map_operations() {
        let mut map: FxHashMap<&str, i32> = fx_hash_map();
        map.insert("one", 1);
        map.insert("two", 2);
        assert_eq!(map.get("one"), Some(&1));
        assert_eq!(map.get("three"), None);
    }

    #[test]
    fn test_fx_hash_set_operations() {
        let mut set: FxHashSet<&str> = fx_hash_set();
        set.insert("one");
        assert!(set.contains("one"));
        assert!(!set.contains("two"));
    }

    #[test]
    fn test_path_id_stability() {
        assert_eq!(path_id("docs/report.pdf"), path_id("docs/report.pdf"));
        assert_ne!(path_id("docs/report.pdf"), path_id("docs/report2.pdf"));
        assert_ne!(path_id(""), path_id(" "));
    }

    #[test]
    fn test_scan_signature_detects_changes() {
        let base = vec![entry("a.txt", 10, 100), entry("b.txt", 20, 200)];
        let sig = scan_signature(&base);

        // Identical listing -> identical signature.
        assert_eq!(sig, scan_signature(&base.clone()));

        // Size change.
        let mut changed = base.clone();
        changed[0].size = 11;
        assert_ne!(sig, scan_signature(&changed));

        // Modification time change.
        let mut changed = base.clone();
        changed[1].last_modified = 201;
        assert_ne!(sig, scan_signature(&changed));

        // Added file.
        let mut changed = base.clone();
        changed.push(entry("c.txt", 1, 1));
        assert_ne!(sig, scan_signature(&changed));

        // Removed file.
        let changed = vec![base[0].clone()];
        assert_ne!(sig, scan_signature(&changed));
    }

    #[test]
    fn test_scan_signature_empty() {
        assert_eq!(scan_signature(&[]), scan_signature(&[]));
    }
}
