//! Core types, errors, and utilities for the DocuSense analysis core.
//!
//! This crate provides the foundational types used across the workspace:
//!
//! - Domain types (`FileRecord`, `AnalysisTask`, `TreeNode`, `FileStatus`)
//! - The file and task status state machines
//! - Configuration structures for every component
//! - Error types for consistent error handling
//! - Type aliases for `FxHashMap`/`FxHashSet` (faster than std)
//! - Wall-clock helpers for timestamp fields

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod hash;
pub mod time;
pub mod types;

pub use config::{
    AiConfig, Config, ProviderConfig, QueueConfig, RegistryConfig, ScanConfig, SyncConfig,
};
pub use error::ConfigError;
pub use hash::{fx_hash_map, fx_hash_set, path_id, scan_signature, FxHashMap, FxHashSet};
pub use time::unix_now;
pub use types::{
    AnalysisMode, AnalysisTask, FileEntry, FileId, FileRecord, FileStatus, NodeKind, Prompt,
    StatusPayload, TaskId, TaskSpec, TaskStatus, TreeNode,
};
