//! Authoritative file registry with JSON snapshot persistence.
//!
//! This crate is the single mutable source of truth for tracked documents.
//! Every other component is read-only with respect to registry state:
//! the scanner stamps tree projections from it, the queue's dispatcher asks
//! it to apply status transitions, and the synchronizer mirrors it into
//! client views.
//!
//! # Overview
//!
//! The main entry point is [`FileRegistry`], which combines:
//!
//! - An in-memory record map (`parking_lot::RwLock` + `FxHashMap`)
//! - [`SnapshotStore`]: durable JSON persistence surviving restarts
//! - [`RegistryStatistics`]: on-demand per-status aggregates
//!
//! # Writers
//!
//! Registry state is written only by:
//!
//! 1. Registration (`register`)
//! 2. The dispatcher applying task outcomes (`update_status`)
//! 3. Explicit archive/cleanup operations
//!
//! # Example
//!
//! ```
//! use ds_registry::FileRegistry;
//! use ds_core::FileStatus;
//! use camino::Utf8Path;
//!
//! let registry = FileRegistry::in_memory();
//!
//! let record = registry.register(Utf8Path::new("a/b/report.pdf"), None, 1000)?;
//! assert_eq!(record.status, FileStatus::Pending);
//!
//! // Registration is idempotent per path.
//! let again = registry.register(Utf8Path::new("a/b/report.pdf"), None, 1000)?;
//! assert_eq!(record.id, again.id);
//! # Ok::<(), ds_registry::RegistryError>(())
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

mod error;
mod registry;
mod stats;
mod store;

pub use error::RegistryError;
pub use registry::FileRegistry;
pub use stats::{RegistryStatistics, StatusStats};
pub use store::SnapshotStore;
