//! Per-status registry aggregates.
//!
//! Statistics are recomputed on demand from the live record map rather than
//! incrementally maintained, so they are always consistent with
//! [`list_by_status`](crate::FileRegistry::list_by_status).

use std::collections::BTreeMap;

use ds_core::{FileRecord, FileStatus};
use serde::{Deserialize, Serialize};

/// Count and cumulative size for one status bucket.
///
/// # Examples
///
/// ```
/// use ds_registry::StatusStats;
///
/// let stats = StatusStats { count: 2, total_size_bytes: 3000 };
/// assert_eq!(stats.count, 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatusStats {
    /// Number of records in this status.
    pub count: u64,

    /// Sum of record sizes in bytes.
    pub total_size_bytes: u64,
}

/// A point-in-time aggregate view of the registry.
///
/// Every status has an entry, including zeroed buckets, so consumers can
/// render a stable table without probing for missing keys. `Unregistered`
/// is always zero - unregistered files have no records by definition.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RegistryStatistics {
    /// Aggregates keyed by status.
    pub by_status: BTreeMap<FileStatus, StatusStats>,

    /// Aggregate over all persisted records.
    pub total: StatusStats,
}

impl RegistryStatistics {
    /// Computes statistics from a record iterator.
    ///
    /// # Examples
    ///
    /// ```
    /// use ds_registry::RegistryStatistics;
    /// use ds_core::{FileRecord, FileStatus};
    /// use camino::Utf8PathBuf;
    ///
    /// let records = vec![FileRecord::new(Utf8PathBuf::from("a.pdf"), None, 1000, 0)];
    /// let stats = RegistryStatistics::compute(records.iter());
    ///
    /// assert_eq!(stats.get(FileStatus::Pending).count, 1);
    /// assert_eq!(stats.get(FileStatus::Completed).count, 0);
    /// assert_eq!(stats.total.total_size_bytes, 1000);
    /// ```
    #[must_use]
    pub fn compute<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a FileRecord>,
    {
        let mut by_status: BTreeMap<FileStatus, StatusStats> = [
            FileStatus::Unregistered,
            FileStatus::Pending,
            FileStatus::InProgress,
            FileStatus::Completed,
            FileStatus::Failed,
            FileStatus::Archived,
        ]
        .into_iter()
        .map(|s| (s, StatusStats::default()))
        .collect();

        let mut total = StatusStats::default();

        for record in records {
            let bucket = by_status.entry(record.status).or_default();
            bucket.count += 1;
            bucket.total_size_bytes += record.size;
            total.count += 1;
            total.total_size_bytes += record.size;
        }

        Self { by_status, total }
    }

    /// Returns the bucket for a status (zeroed when absent).
    #[inline]
    #[must_use]
    pub fn get(&self, status: FileStatus) -> StatusStats {
        self.by_status.get(&status).copied().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;

    fn record(path: &str, size: u64, status: FileStatus) -> FileRecord {
        let mut r = FileRecord::new(Utf8PathBuf::from(path), None, size, 0);
        r.status = status;
        r
    }

    #[test]
    fn test_compute_empty() {
        let stats = RegistryStatistics::compute(std::iter::empty());
        assert_eq!(stats.total, StatusStats::default());
        // All buckets exist, zeroed.
        assert_eq!(stats.by_status.len(), 6);
        assert_eq!(stats.get(FileStatus::Pending).count, 0);
    }

    #[test]
    fn test_compute_buckets() {
        let records = vec![
            record("a.pdf", 100, FileStatus::Pending),
            record("b.pdf", 200, FileStatus::Pending),
            record("c.pdf", 300, FileStatus::Completed),
            record("d.pdf", 400, FileStatus::Failed),
        ];

        let stats = RegistryStatistics::compute(records.iter());

        assert_eq!(stats.get(FileStatus::Pending).count, 2);
        assert_eq!(stats.get(FileStatus::Pending).total_size_bytes, 300);
        assert_eq!(stats.get(FileStatus::Completed).count, 1);
        assert_eq!(stats.get(FileStatus::Failed).total_size_bytes, 400);
        assert_eq!(stats.total.count, 4);
        assert_eq!(stats.total.total_size_bytes, 1000);
    }

    #[test]
    fn test_unregistered_always_zero() {
        let records = vec![record("a.pdf", 100, FileStatus::Pending)];
        let stats = RegistryStatistics::compute(records.iter());
        assert_eq!(stats.get(FileStatus::Unregistered), StatusStats::default());
    }

    #[test]
    fn test_serialization() {
        let records = vec![record("a.pdf", 100, FileStatus::Archived)];
        let stats = RegistryStatistics::compute(records.iter());

        let json = serde_json::to_string(&stats).unwrap();
        let parsed: RegistryStatistics = serde_json::from_str(&json).unwrap();
        assert_eq!(stats, parsed);
    }
}
