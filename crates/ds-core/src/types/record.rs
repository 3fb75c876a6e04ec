//! File record types: the authoritative persisted state of one document.
//!
//! This module provides [`FileRecord`], the registry's unit of truth for a
//! tracked file, and [`FileId`], the stable identifier assigned at
//! registration.

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use super::status::FileStatus;
use crate::hash::path_id;

/// An opaque identifier for a registered file.
///
/// Uses a newtype pattern for type safety - prevents accidentally using a
/// raw integer where a file ID is expected. The inner value is a hash of the
/// registered path, which makes registration idempotent: the same path always
/// maps to the same ID.
///
/// # Examples
///
/// ```
/// use ds_core::FileId;
///
/// let a = FileId::from_path("reports/q3.pdf".as_ref());
/// let b = FileId::from_path("reports/q3.pdf".as_ref());
/// assert_eq!(a, b);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileId(pub u64);

impl FileId {
    /// Creates a file ID from a raw u64 value.
    #[inline]
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Derives the file ID for a path.
    ///
    /// The same path always produces the same ID.
    ///
    /// # Examples
    ///
    /// ```
    /// use ds_core::FileId;
    /// use camino::Utf8Path;
    ///
    /// let id = FileId::from_path(Utf8Path::new("a/b/report.pdf"));
    /// assert_ne!(id.as_u64(), 0);
    /// ```
    #[inline]
    #[must_use]
    pub fn from_path(path: &Utf8Path) -> Self {
        Self(path_id(path.as_str()))
    }

    /// Returns the inner u64 value.
    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for FileId {
    /// Renders the ID as the opaque 16-hex-digit string used in logs and
    /// CLI output.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl From<u64> for FileId {
    #[inline]
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// The authoritative persisted state of one tracked document.
///
/// Records are created by registration, mutated by the dispatcher as
/// analysis proceeds, and removed only by the age-based cleanup policy.
///
/// # Invariants
///
/// - `analysis` is present if and only if `status == Completed`.
/// - `error` is present if and only if `status == Failed`.
/// - A file that was never registered has no record at all; "unregistered"
///   exists only as a scan-side projection.
///
/// These invariants are upheld by the registry, which is the only writer.
///
/// # Examples
///
/// ```
/// use ds_core::{FileRecord, FileStatus};
/// use camino::Utf8PathBuf;
///
/// let record = FileRecord::new(Utf8PathBuf::from("docs/brief.pdf"), None, 2048, 1704067200);
/// assert_eq!(record.status, FileStatus::Pending);
/// assert!(record.analysis.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Stable identifier, assigned at registration.
    pub id: FileId,

    /// The path the file was originally registered under.
    pub original_path: Utf8PathBuf,

    /// The file's current path; diverges from `original_path` after
    /// archival moves the file.
    pub current_path: Utf8PathBuf,

    /// File name (final path component).
    pub name: String,

    /// File size in bytes.
    pub size: u64,

    /// Extension-based type hint (e.g. `pdf`), empty when the path has no
    /// extension.
    pub file_type: String,

    /// Where the file sits in the analysis lifecycle.
    pub status: FileStatus,

    /// Opaque analysis result payload; present only when completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<serde_json::Value>,

    /// Analysis error message; present only when failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Unix timestamp of registration.
    pub created_at: u64,

    /// Unix timestamp of the last status mutation.
    pub modified_at: u64,
}

impl FileRecord {
    /// Creates a fresh record for a newly registered path.
    ///
    /// The record starts in [`FileStatus::Pending`] with no result payload.
    ///
    /// # Arguments
    ///
    /// * `path` - The path being registered (also the current path)
    /// * `original_path` - Optional distinct origin path; defaults to `path`
    /// * `size` - File size in bytes
    /// * `now` - Registration timestamp (unix seconds)
    #[must_use]
    pub fn new(path: Utf8PathBuf, original_path: Option<Utf8PathBuf>, size: u64, now: u64) -> Self {
        let name = path.file_name().unwrap_or_default().to_owned();
        let file_type = path.extension().unwrap_or_default().to_owned();
        let id = FileId::from_path(&path);

        Self {
            id,
            original_path: original_path.unwrap_or_else(|| path.clone()),
            current_path: path,
            name,
            size,
            file_type,
            status: FileStatus::Pending,
            analysis: None,
            error: None,
            created_at: now,
            modified_at: now,
        }
    }

    /// Returns `true` if the result payload fields satisfy the
    /// status/payload mutual-exclusion invariant.
    ///
    /// # Examples
    ///
    /// ```
    /// use ds_core::FileRecord;
    /// use camino::Utf8PathBuf;
    ///
    /// let record = FileRecord::new(Utf8PathBuf::from("a.txt"), None, 10, 0);
    /// assert!(record.payload_consistent());
    /// ```
    #[must_use]
    pub fn payload_consistent(&self) -> bool {
        let analysis_ok = self.analysis.is_some() == (self.status == FileStatus::Completed);
        let error_ok = self.error.is_some() == (self.status == FileStatus::Failed);
        analysis_ok && error_ok && !(self.analysis.is_some() && self.error.is_some())
    }
}

/// Payload accompanying a status update.
///
/// `Completed` transitions carry an analysis result, `Failed` transitions an
/// error message; every other transition carries nothing.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusPayload {
    /// No payload (e.g. `Pending -> InProgress`).
    None,
    /// Analysis result for a `Completed` transition.
    Analysis(serde_json::Value),
    /// Error message for a `Failed` transition.
    Error(String),
}
