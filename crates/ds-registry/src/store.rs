//! JSON snapshot persistence for registry records.
//!
//! The registry persists its full record set as one pretty-printed JSON
//! array. Writes go through a sibling temp file followed by a rename, so a
//! crash mid-write never leaves a torn snapshot behind.

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use ds_core::FileRecord;
use tracing::debug;

use crate::error::RegistryError;

/// Durable storage for the registry's record set.
///
/// A missing snapshot file is not an error - it simply means an empty
/// registry (first run). A present-but-corrupt file is an error, surfaced
/// to the caller rather than silently discarded.
///
/// # Examples
///
/// ```no_run
/// use ds_registry::SnapshotStore;
/// use camino::Utf8PathBuf;
///
/// let store = SnapshotStore::new(Utf8PathBuf::from("file_registry.json"));
/// let records = store.load()?;
/// println!("loaded {} records", records.len());
/// # Ok::<(), ds_registry::RegistryError>(())
/// ```
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    /// Path of the snapshot file.
    path: Utf8PathBuf,
}

impl SnapshotStore {
    /// Creates a store for the given snapshot path.
    #[inline]
    #[must_use]
    pub const fn new(path: Utf8PathBuf) -> Self {
        Self { path }
    }

    /// Returns the snapshot path.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Loads all records from the snapshot.
    ///
    /// Returns an empty vector when the snapshot file does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Persist`] on I/O failure and
    /// [`RegistryError::Parse`] when the file is not valid JSON.
    pub fn load(&self) -> Result<Vec<FileRecord>, RegistryError> {
        if !self.path.exists() {
            debug!(path = %self.path, "No snapshot yet, starting empty");
            return Ok(Vec::new());
        }

        let contents = fs::read_to_string(self.path.as_std_path())
            .map_err(|e| RegistryError::persist(self.path.clone(), e))?;
        let records: Vec<FileRecord> = serde_json::from_str(&contents)?;

        debug!(path = %self.path, count = records.len(), "Snapshot loaded");
        Ok(records)
    }

    /// Writes all records to the snapshot atomically.
    ///
    /// The records are serialized to a sibling `.tmp` file which is then
    /// renamed over the snapshot path.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Persist`] on I/O failure.
    pub fn save(&self, records: &[FileRecord]) -> Result<(), RegistryError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent.as_std_path())
                    .map_err(|e| RegistryError::persist(parent.to_owned(), e))?;
            }
        }

        let json = serde_json::to_string_pretty(records)?;

        let tmp = Utf8PathBuf::from(format!("{}.tmp", self.path));
        fs::write(tmp.as_std_path(), json.as_bytes())
            .map_err(|e| RegistryError::persist(tmp.clone(), e))?;
        fs::rename(tmp.as_std_path(), self.path.as_std_path())
            .map_err(|e| RegistryError::persist(self.path.clone(), e))?;

        debug!(path = %self.path, count = records.len(), "Snapshot saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8Path;
    use ds_core::FileStatus;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> SnapshotStore {
        let path = Utf8Path::from_path(dir.path())
            .expect("Invalid path")
            .join("registry.json");
        SnapshotStore::new(path)
    }

    fn record(path: &str) -> FileRecord {
        FileRecord::new(Utf8PathBuf::from(path), None, 100, 0)
    }

    #[test]
    fn test_load_missing_is_empty() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let store = store_in(&dir);
        let records = store.load().expect("Load failed");
        assert!(records.is_empty());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let store = store_in(&dir);

        let records = vec![record("a.pdf"), record("b/c.txt")];
        store.save(&records).expect("Save failed");

        let loaded = store.load().expect("Load failed");
        assert_eq!(loaded, records);
    }

    #[test]
    fn test_save_overwrites() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let store = store_in(&dir);

        store.save(&[record("a.pdf")]).expect("Save failed");
        store.save(&[record("b.pdf")]).expect("Save failed");

        let loaded = store.load().expect("Load failed");
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "b.pdf");
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let path = Utf8Path::from_path(dir.path())
            .expect("Invalid path")
            .join("nested/deeper/registry.json");
        let store = SnapshotStore::new(path);

        store.save(&[record("a.pdf")]).expect("Save failed");
        assert_eq!(store.load().expect("Load failed").len(), 1);
    }

    #[test]
    fn test_load_rejects_corrupt_snapshot() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let store = store_in(&dir);
        fs::write(store.path().as_std_path(), b"{not json").expect("Write failed");

        assert!(store.load().is_err());
    }

    #[test]
    fn test_statuses_survive_roundtrip() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let store = store_in(&dir);

        let mut rec = record("a.pdf");
        rec.status = FileStatus::Failed;
        rec.error = Some("timeout".to_owned());
        store.save(std::slice::from_ref(&rec)).expect("Save failed");

        let loaded = store.load().expect("Load failed");
        assert_eq!(loaded[0].status, FileStatus::Failed);
        assert_eq!(loaded[0].error.as_deref(), Some("timeout"));
    }
}
