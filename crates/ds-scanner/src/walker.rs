//! Directory traversal for analyzable documents.
//!
//! This module provides [`FileWalker`], which uses the `ignore` crate to
//! efficiently walk directories while respecting `.gitignore` patterns, and
//! turns the result into the flat [`FileEntry`] listing the tree builder
//! consumes.
//!
//! # Features
//!
//! - Respects `.gitignore` and `.ignore` patterns
//! - Filters for analyzable document extensions (`.pdf`, `.docx`, ...)
//! - Skips hidden directories and files
//! - Converts paths to UTF-8 [`Utf8PathBuf`](camino::Utf8PathBuf)
//! - Gathers size/mtime metadata in parallel with rayon

use std::fs;
use std::time::UNIX_EPOCH;

use camino::{Utf8Path, Utf8PathBuf};
use ds_core::FileEntry;
use ignore::WalkBuilder;
use rayon::prelude::*;
use tracing::warn;

use crate::error::ScanError;

/// Default directories to skip during scanning.
///
/// These hold transient or tooling data, never documents worth analyzing.
const SKIP_DIRECTORIES: &[&str] = &[
    ".git",
    ".cache",
    ".Trash",
    "__pycache__",
    "node_modules",
    "tmp",
];

/// Document extensions accepted for analysis.
const DOCUMENT_EXTENSIONS: &[&str] = &["pdf", "png", "jpg", "jpeg", "doc", "docx", "eml", "txt"];

/// A file walker that discovers analyzable documents in a directory tree.
///
/// Uses the `ignore` crate for efficient traversal with gitignore support.
///
/// # Design
///
/// The walker uses a "collect-then-parallelize" pattern:
/// 1. Walker collects all paths first (single-threaded, I/O bound)
/// 2. Metadata is then gathered in parallel with rayon
///
/// The resulting listing is sorted by relative path, so an unchanged
/// directory always yields the same listing - and therefore the same
/// [`scan_signature`](ds_core::scan_signature).
///
/// # Examples
///
/// ```ignore
/// use ds_scanner::FileWalker;
/// use camino::Utf8Path;
///
/// let walker = FileWalker::new(Utf8Path::new("./documents"))?;
/// let entries = walker.collect_entries()?;
///
/// println!("Found {} documents", entries.len());
/// ```
#[derive(Debug)]
pub struct FileWalker {
    /// The root directory to walk.
    root: Utf8PathBuf,
    /// Additional directories to skip (beyond standard filters).
    skip_dirs: Vec<String>,
    /// Whether to follow symbolic links.
    follow_links: bool,
}

impl FileWalker {
    /// Creates a new file walker for the given root directory.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::InvalidRoot`] if the root path doesn't exist or
    /// isn't a directory.
    pub fn new(root: &Utf8Path) -> Result<Self, ScanError> {
        if !root.exists() {
            return Err(ScanError::invalid_root(format!(
                "root path does not exist: {root}"
            )));
        }
        if !root.is_dir() {
            return Err(ScanError::invalid_root(format!(
                "root path is not a directory: {root}"
            )));
        }

        Ok(Self {
            root: root.to_owned(),
            skip_dirs: Vec::new(),
            follow_links: false,
        })
    }

    /// Adds directories to skip during traversal.
    ///
    /// These are in addition to the default skip list (`.git`, `.cache`,
    /// etc.).
    #[must_use]
    pub fn with_skip_dirs<S: AsRef<str>>(mut self, dirs: &[S]) -> Self {
        self.skip_dirs
            .extend(dirs.iter().map(|d| d.as_ref().to_owned()));
        self
    }

    /// Configures whether to follow symbolic links.
    ///
    /// By default, symbolic links are not followed.
    #[must_use]
    pub const fn with_follow_links(mut self, follow: bool) -> Self {
        self.follow_links = follow;
        self
    }

    /// Collects the flat document listing for the tree builder.
    ///
    /// Walks the directory tree, filters for document files, and gathers
    /// size and modification time for each. Files whose metadata cannot be
    /// read are skipped with a warning rather than failing the scan.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Walk`] if directory traversal fails and
    /// [`ScanError::NonUtf8Path`] if a non-UTF-8 path is encountered.
    pub fn collect_entries(&self) -> Result<Vec<FileEntry>, ScanError> {
        let paths = self.collect_paths()?;

        // Metadata in parallel; a file deleted mid-scan is skipped.
        let mut entries: Vec<FileEntry> = paths
            .par_iter()
            .filter_map(|path| match self.entry_for(path) {
                Ok(entry) => Some(entry),
                Err(error) => {
                    warn!(path = %path, error = %error, "Skipping unreadable file");
                    None
                }
            })
            .collect();

        entries.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        Ok(entries)
    }

    /// Collects all document file paths in the directory tree.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Walk`] if directory traversal fails.
    pub fn collect_paths(&self) -> Result<Vec<Utf8PathBuf>, ScanError> {
        let mut paths = Vec::new();
        let walker = self.build_walker();

        for result in walker {
            let entry = result?;

            // Skip directories and non-files
            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }

            let path = entry.path();

            // Convert to UTF-8 path
            let utf8_path =
                Utf8Path::from_path(path).ok_or_else(|| ScanError::NonUtf8Path(path.to_owned()))?;

            // Check if it's an analyzable document
            if !self.is_document_file(utf8_path) {
                continue;
            }

            // Skip files in excluded directories
            if self.should_skip_path(utf8_path) {
                continue;
            }

            paths.push(utf8_path.to_owned());
        }

        Ok(paths)
    }

    /// Builds one listing row, with the path made relative to the root.
    fn entry_for(&self, path: &Utf8Path) -> Result<FileEntry, ScanError> {
        let metadata =
            fs::metadata(path.as_std_path()).map_err(|e| ScanError::metadata(path, e))?;

        let last_modified = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map_or(0, |d| d.as_secs());

        let relative = path.strip_prefix(&self.root).unwrap_or(path).to_owned();

        Ok(FileEntry::new(relative, metadata.len(), last_modified))
    }

    /// Builds the ignore walker with configured settings.
    fn build_walker(&self) -> ignore::Walk {
        WalkBuilder::new(&self.root)
            // Enable standard filters (.gitignore, .ignore, hidden files)
            .standard_filters(true)
            // Don't follow links by default
            .follow_links(self.follow_links)
            // Use a single thread for walking (we parallelize later)
            .threads(1)
            // Don't require the root to be a git repo
            .require_git(false)
            .build()
    }

    /// Checks if a path is an analyzable document based on extension.
    #[allow(clippy::unused_self)] // Method signature kept for consistency
    fn is_document_file(&self, path: &Utf8Path) -> bool {
        path.extension()
            .is_some_and(|ext| DOCUMENT_EXTENSIONS.iter().any(|d| ext.eq_ignore_ascii_case(d)))
    }

    /// Checks if a path should be skipped based on directory name.
    fn should_skip_path(&self, path: &Utf8Path) -> bool {
        for component in path.components() {
            let component_str = component.as_str();

            if SKIP_DIRECTORIES.contains(&component_str) {
                return true;
            }

            if self.skip_dirs.iter().any(|d| d == component_str) {
                return true;
            }
        }

        false
    }

    /// Returns the root directory being walked.
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }
}
