//! Where the synchronizer reads truth from.
//!
//! The synchronizer is generic over a [`StatusSource`] so the same loop
//! serves an in-process deployment (registry and queue in the same
//! process, [`LocalSource`]) and a remote one (an HTTP status endpoint)
//! without changes.

use std::sync::Arc;

use ds_core::{AnalysisTask, FileRecord};
use ds_queue::AnalysisQueue;
use ds_registry::FileRegistry;

use crate::error::SyncError;

/// One consistent fetch of registry and queue state.
#[derive(Debug, Clone, Default)]
pub struct StatusReport {
    /// All registry records.
    pub records: Vec<FileRecord>,

    /// All queue tasks in submission order.
    pub tasks: Vec<AnalysisTask>,

    /// Whether the queue's global pause flag is set.
    pub queue_paused: bool,
}

/// A pollable source of registry and queue truth.
///
/// Implementations must be cheap to poll: the synchronizer calls
/// [`fetch`](Self::fetch) once per interval and never concurrently.
pub trait StatusSource: Send + Sync + 'static {
    /// Fetches the current state.
    fn fetch(&self) -> impl std::future::Future<Output = Result<StatusReport, SyncError>> + Send;
}

/// [`StatusSource`] over in-process registry and queue handles.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use ds_sync::{LocalSource, StatusSource};
/// use ds_registry::FileRegistry;
/// use ds_queue::AnalysisQueue;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), ds_sync::SyncError> {
/// let source = LocalSource::new(
///     Arc::new(FileRegistry::in_memory()),
///     Arc::new(AnalysisQueue::in_memory()),
/// );
///
/// let report = source.fetch().await?;
/// assert!(report.records.is_empty());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct LocalSource {
    /// The registry to mirror.
    registry: Arc<FileRegistry>,

    /// The queue to mirror.
    queue: Arc<AnalysisQueue>,
}

impl LocalSource {
    /// Creates a source over in-process handles.
    #[must_use]
    pub fn new(registry: Arc<FileRegistry>, queue: Arc<AnalysisQueue>) -> Self {
        Self { registry, queue }
    }
}

impl StatusSource for LocalSource {
    async fn fetch(&self) -> Result<StatusReport, SyncError> {
        Ok(StatusReport {
            records: self.registry.list_by_status(None),
            tasks: self.queue.snapshot(),
            queue_paused: self.queue.is_paused(),
        })
    }
}
