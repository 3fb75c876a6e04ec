//! Analysis task queue, dispatcher, and backend integration.
//!
//! This crate sequences document-analysis work: batches of
//! [`TaskSpec`](ds_core::TaskSpec)s enter the [`AnalysisQueue`], the
//! [`Dispatcher`] claims them one at a time and drives each through an
//! [`AnalysisBackend`], and every outcome lands in the
//! [`FileRegistry`](ds_registry::FileRegistry) and on the task itself.
//!
//! # Overview
//!
//! - [`AnalysisQueue`]: ordered work list with per-path dedup,
//!   pause/resume, per-strategy start/stop, and terminal-only clearing
//! - [`Dispatcher`]: single-consumer dispatch loop with timeout and
//!   bounded retries; failures are recorded, never thrown
//! - [`AnalysisBackend`] / [`HttpBackend`]: the external analysis
//!   capability and its OpenAI-compatible HTTP implementation
//! - [`TaskStore`]: JSON persistence with restart recovery (in-progress
//!   tasks re-pend on load)
//! - [`PromptCatalog`]: the static analysis-strategy list
//!
//! # Ordering guarantees
//!
//! Within one strategy group tasks dispatch in submission order; across
//! groups there is no ordering guarantee unless a group is explicitly
//! stopped. A given file path never has more than one outstanding task.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use ds_queue::{AnalysisQueue, Dispatcher, HttpBackend};
//! use ds_registry::FileRegistry;
//! use ds_core::{AiConfig, AnalysisMode, QueueConfig, TaskSpec};
//! use camino::Utf8PathBuf;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let queue = Arc::new(AnalysisQueue::in_memory());
//! queue.enqueue(vec![TaskSpec::for_path(
//!     Utf8PathBuf::from("docs/brief.pdf"),
//!     "summary",
//!     AnalysisMode::Local,
//! )])?;
//!
//! assert_eq!(queue.pending_count(), 1);
//! # Ok(())
//! # }
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

mod backend;
mod dispatcher;
mod error;
mod prompts;
mod queue;
mod store;

pub use backend::{AnalysisBackend, BackendStatus, HttpBackend};
pub use dispatcher::Dispatcher;
pub use error::{AnalysisError, QueueError};
pub use prompts::PromptCatalog;
pub use queue::AnalysisQueue;
pub use store::TaskStore;
