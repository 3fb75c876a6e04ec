//! Error types for the ds-scanner crate.
//!
//! This module provides the [`ScanError`] type for errors that can occur
//! during directory traversal and tree construction.

use camino::Utf8PathBuf;

/// Errors that can occur during scanning operations.
///
/// # Error Recovery Strategy
///
/// - **Walker errors** ([`ScanError::Walk`]): fatal - propagate immediately
/// - **Metadata errors** ([`ScanError::Metadata`]): log warning, skip file,
///   continue scan
/// - **Structural errors** ([`ScanError::InvalidRoot`],
///   [`ScanError::EmptyPath`]): usage errors, surfaced synchronously
///
/// # Examples
///
/// ```
/// use ds_scanner::ScanError;
///
/// let err = ScanError::invalid_root("root path does not exist: /nope");
/// assert!(err.is_fatal());
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// Failed to walk a directory.
    ///
    /// This is typically a fatal error that prevents scanning from
    /// continuing.
    #[error("failed to walk directory: {0}")]
    Walk(#[from] ignore::Error),

    /// Failed to read a file's metadata.
    ///
    /// Contains the path that failed and the underlying I/O error.
    /// Scanning can continue by skipping this file.
    #[error("failed to read metadata for {path}: {source}")]
    Metadata {
        /// The path of the file whose metadata couldn't be read.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The scan root is missing or not a directory.
    #[error("invalid scan root: {0}")]
    InvalidRoot(String),

    /// A listing entry carried an empty path.
    #[error("listing entry has an empty path")]
    EmptyPath,

    /// A path is not valid UTF-8.
    ///
    /// This crate uses UTF-8 paths throughout. If a non-UTF-8 path is
    /// encountered, it cannot be processed.
    #[error("path is not valid UTF-8: {}", _0.display())]
    NonUtf8Path(std::path::PathBuf),
}

impl ScanError {
    /// Creates a new [`ScanError::Metadata`] error.
    #[inline]
    pub fn metadata(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Metadata {
            path: path.into(),
            source,
        }
    }

    /// Creates a new [`ScanError::InvalidRoot`] error.
    #[inline]
    pub fn invalid_root(message: impl Into<String>) -> Self {
        Self::InvalidRoot(message.into())
    }

    /// Returns `true` if this error is recoverable (scanning can continue).
    #[inline]
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Metadata { .. })
    }

    /// Returns `true` if this error is fatal (scanning should stop).
    #[inline]
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !self.is_recoverable()
    }
}
