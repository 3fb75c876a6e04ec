//! Error types for the ds-registry crate.
//!
//! This module provides the [`RegistryError`] type for errors raised by
//! registry operations.

use camino::Utf8PathBuf;
use ds_core::{FileId, FileStatus};

/// Errors that can occur during registry operations.
///
/// Structural errors (`InvalidPath`, `NotFound`, `InvalidTransition`) are
/// usage errors surfaced synchronously to the caller and never retried.
/// Persistence errors indicate the snapshot could not be written or read.
///
/// # Examples
///
/// ```
/// use ds_registry::RegistryError;
/// use ds_core::FileStatus;
///
/// let err = RegistryError::InvalidTransition {
///     from: FileStatus::Pending,
///     to: FileStatus::Archived,
/// };
/// assert!(err.to_string().contains("pending"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// An empty or malformed path was passed to registration.
    #[error("invalid path '{path}': {reason}")]
    InvalidPath {
        /// The offending path (possibly empty).
        path: Utf8PathBuf,
        /// Explanation of why the path is invalid.
        reason: String,
    },

    /// An operation referenced an unknown file ID.
    ///
    /// Note that an unknown *path* is not an error: callers treat it as
    /// `unregistered`.
    #[error("no record for file id {0}")]
    NotFound(FileId),

    /// A status mutation violated the lifecycle state machine.
    ///
    /// The record is left unchanged.
    #[error("invalid status transition: {} -> {}", from.label().to_ascii_lowercase(), to.label().to_ascii_lowercase())]
    InvalidTransition {
        /// The record's current status.
        from: FileStatus,
        /// The rejected target status.
        to: FileStatus,
    },

    /// The snapshot file could not be read or written.
    #[error("snapshot I/O failed for {path}: {source}")]
    Persist {
        /// The snapshot path involved.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The snapshot file exists but could not be parsed.
    #[error("snapshot is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

impl RegistryError {
    /// Creates a new [`RegistryError::InvalidPath`] error.
    #[inline]
    pub fn invalid_path(path: impl Into<Utf8PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates a new [`RegistryError::Persist`] error.
    #[inline]
    pub fn persist(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Persist {
            path: path.into(),
            source,
        }
    }
}
