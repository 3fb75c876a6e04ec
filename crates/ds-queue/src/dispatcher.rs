//! The dispatch loop: sequencing tasks through the analysis backend.
//!
//! A single consumer claims tasks from the queue in FIFO order, walks the
//! file's registry record through `pending -> in_progress -> completed |
//! failed`, and records every backend outcome as state. Backend failures
//! never escape the loop - the next pending task is dispatched regardless.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                    Async Runtime (tokio)                   │
//! │  ┌────────────┐   claim    ┌───────────────┐               │
//! │  │ Dispatcher │ ─────────► │ AnalysisQueue │               │
//! │  │  run loop  │            └───────────────┘               │
//! │  │ (shutdown  │   analyze  ┌───────────────┐  timeout +    │
//! │  │  oneshot)  │ ─────────► │AnalysisBackend│  retries      │
//! │  │            │   record   ┌───────────────┐               │
//! │  │            │ ─────────► │ FileRegistry  │               │
//! │  └────────────┘            └───────────────┘               │
//! └────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;
use std::time::Duration;

use ds_core::{unix_now, AnalysisTask, FileStatus, QueueConfig, StatusPayload};
use ds_registry::FileRegistry;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval, timeout};
use tracing::{debug, error, info, warn};

use crate::backend::AnalysisBackend;
use crate::error::AnalysisError;
use crate::queue::AnalysisQueue;

/// Fallback tick of the dispatch loop.
///
/// The queue's notify wakes the loop on enqueue/resume; the tick is a
/// safety net and drives completed-task pruning.
const DISPATCH_TICK: Duration = Duration::from_millis(200);

/// The analysis dispatcher.
///
/// Owns the queue/registry/backend trio for the duration of a session.
/// Start the background loop with [`start`](Self::start), or drive the
/// queue to empty synchronously with [`drain`](Self::drain) for one-shot
/// runs.
///
/// # Lifecycle
///
/// 1. **Creation**: `Dispatcher::new()` wires the components, nothing runs.
/// 2. **Background mode**: `start()` spawns the loop; `shutdown()` signals
///    it and awaits completion. In-flight work runs to completion - pause
///    and shutdown only stop new dispatches.
/// 3. **One-shot mode**: `drain().await` processes tasks until none are
///    dispatchable.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use ds_queue::{AnalysisQueue, Dispatcher, HttpBackend};
/// use ds_registry::FileRegistry;
/// use ds_core::{AiConfig, QueueConfig};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let queue = Arc::new(AnalysisQueue::in_memory());
/// let registry = Arc::new(FileRegistry::in_memory());
/// let backend = Arc::new(HttpBackend::new(AiConfig::default(), 30)?);
///
/// let dispatcher = Dispatcher::new(queue, registry, backend, QueueConfig::default());
/// let processed = dispatcher.drain().await;
/// assert_eq!(processed, 0); // nothing enqueued
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Dispatcher<B: AnalysisBackend> {
    /// The work list.
    queue: Arc<AnalysisQueue>,

    /// Source of truth for file state.
    registry: Arc<FileRegistry>,

    /// The analysis capability.
    backend: Arc<B>,

    /// Timeout/retry/retention settings.
    config: QueueConfig,

    /// Shutdown signal sender; `None` until started or after shutdown.
    shutdown_tx: Option<oneshot::Sender<()>>,

    /// Handle to the running loop task.
    task_handle: Option<JoinHandle<()>>,
}

impl<B: AnalysisBackend + 'static> Dispatcher<B> {
    /// Wires a dispatcher; nothing runs until [`start`](Self::start) or
    /// [`drain`](Self::drain).
    #[must_use]
    pub fn new(
        queue: Arc<AnalysisQueue>,
        registry: Arc<FileRegistry>,
        backend: Arc<B>,
        config: QueueConfig,
    ) -> Self {
        Self {
            queue,
            registry,
            backend,
            config,
            shutdown_tx: None,
            task_handle: None,
        }
    }

    /// Returns the queue handle.
    #[must_use]
    pub fn queue(&self) -> Arc<AnalysisQueue> {
        Arc::clone(&self.queue)
    }

    /// Spawns the background dispatch loop.
    ///
    /// Starting an already running dispatcher is a no-op.
    pub fn start(&mut self) {
        if self.task_handle.as_ref().is_some_and(|h| !h.is_finished()) {
            warn!("Dispatcher is already running");
            return;
        }

        info!("Starting dispatch loop");
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
        self.shutdown_tx = Some(shutdown_tx);

        let queue = Arc::clone(&self.queue);
        let registry = Arc::clone(&self.registry);
        let backend = Arc::clone(&self.backend);
        let config = self.config.clone();

        self.task_handle = Some(tokio::spawn(async move {
            let mut ticker = interval(DISPATCH_TICK);

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => {
                        info!("Dispatch loop received shutdown signal");
                        break;
                    }
                    _ = queue.work_available() => {
                        drain_queue(&queue, &registry, backend.as_ref(), &config).await;
                    }
                    _ = ticker.tick() => {
                        if let Err(e) =
                            queue.prune_completed(config.completed_retention_secs, unix_now())
                        {
                            warn!(error = %e, "Failed to prune completed tasks");
                        }
                        drain_queue(&queue, &registry, backend.as_ref(), &config).await;
                    }
                }
            }

            info!("Dispatch loop stopped");
        }));
    }

    /// Returns `true` while the background loop is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.shutdown_tx.is_some() && self.task_handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Gracefully shuts down the background loop.
    ///
    /// Signals the loop and awaits its completion. A task already handed
    /// to the backend runs to completion first - there is no mid-flight
    /// cancellation.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            // Ignore error if the loop already stopped.
            let _ = tx.send(());
        }
        if let Some(handle) = self.task_handle.take() {
            if let Err(e) = handle.await {
                error!(error = %e, "Dispatch loop task failed");
            }
        }
    }

    /// Processes tasks until none are dispatchable, returning the number
    /// processed.
    ///
    /// Used by one-shot CLI runs; respects pause and strategy gates the
    /// same way the background loop does.
    pub async fn drain(&self) -> usize {
        let mut processed = 0usize;
        while dispatch_one(&self.queue, &self.registry, self.backend.as_ref(), &self.config).await {
            processed += 1;
        }
        processed
    }
}

/// Dispatches until the queue yields no claimable task.
async fn drain_queue<B: AnalysisBackend>(
    queue: &AnalysisQueue,
    registry: &FileRegistry,
    backend: &B,
    config: &QueueConfig,
) {
    while dispatch_one(queue, registry, backend, config).await {}
}

/// Claims and fully processes one task. Returns `false` when nothing was
/// claimable.
async fn dispatch_one<B: AnalysisBackend>(
    queue: &AnalysisQueue,
    registry: &FileRegistry,
    backend: &B,
    config: &QueueConfig,
) -> bool {
    let Some(task) = queue.claim_next() else {
        return false;
    };

    debug!(id = %task.id, file = %task.file_path, "Dispatching task");

    if let Err(e) = mark_dispatched(registry, &task) {
        // Structural registry refusal (e.g. the record is already
        // completed); record it on the task and move on.
        warn!(id = %task.id, error = %e, "Registry refused dispatch");
        record_failure(queue, registry, &task, &e.to_string());
        return true;
    }

    match analyze_with_retries(backend, &task, config).await {
        Ok(result) => {
            if let Err(e) = registry.update_status(
                ds_core::FileId::from_path(&task.file_path),
                FileStatus::Completed,
                StatusPayload::Analysis(result),
            ) {
                error!(id = %task.id, error = %e, "Failed to record completion");
            }
            if let Err(e) = queue.complete_task(task.id) {
                error!(id = %task.id, error = %e, "Failed to complete task");
            }
            info!(id = %task.id, file = %task.file_path, "Analysis completed");
        }
        Err(analysis_error) => {
            record_failure(queue, registry, &task, &analysis_error.to_string());
            info!(id = %task.id, file = %task.file_path, "Analysis failed");
        }
    }

    true
}

/// Walks the file's record into `in_progress`, registering or resubmitting
/// as needed.
fn mark_dispatched(
    registry: &FileRegistry,
    task: &AnalysisTask,
) -> Result<(), ds_registry::RegistryError> {
    // Files are normally registered before enqueue; register on the fly
    // when a task arrives for an unknown path.
    let record = match registry.get_status(&task.file_path) {
        Some(record) => record,
        None => registry.register(&task.file_path, None, 0)?,
    };

    // A failed record re-enters through the resubmission edge.
    let record = if record.status == FileStatus::Failed {
        registry.update_status(record.id, FileStatus::Pending, StatusPayload::None)?
    } else {
        record
    };

    registry.update_status(record.id, FileStatus::InProgress, StatusPayload::None)?;
    Ok(())
}

/// Records a failure on both the registry and the task, tolerating
/// registry records that cannot take the transition.
fn record_failure(queue: &AnalysisQueue, registry: &FileRegistry, task: &AnalysisTask, message: &str) {
    let id = ds_core::FileId::from_path(&task.file_path);
    if let Err(e) = registry.update_status(
        id,
        FileStatus::Failed,
        StatusPayload::Error(message.to_owned()),
    ) {
        warn!(id = %task.id, error = %e, "Failed to record file failure");
    }
    if let Err(e) = queue.fail_task(task.id, message) {
        warn!(id = %task.id, error = %e, "Failed to record task failure");
    }
}

/// Calls the backend under the configured deadline, retrying transient
/// failures.
async fn analyze_with_retries<B: AnalysisBackend>(
    backend: &B,
    task: &AnalysisTask,
    config: &QueueConfig,
) -> Result<serde_json::Value, AnalysisError> {
    let deadline = Duration::from_secs(config.backend_timeout_secs);
    let attempts = config.retry_attempts.saturating_add(1);
    let mut last_error = AnalysisError::provider("no attempts made");

    for attempt in 1..=attempts {
        let call = backend.analyze(&task.file_path, &task.prompt_id, task.mode);
        let outcome = match timeout(deadline, call).await {
            Ok(result) => result,
            Err(_elapsed) => Err(AnalysisError::Timeout {
                secs: config.backend_timeout_secs,
            }),
        };

        match outcome {
            Ok(value) => return Ok(value),
            Err(e) => {
                let retryable = e.is_retryable() && attempt < attempts;
                warn!(
                    id = %task.id,
                    attempt,
                    error = %e,
                    retrying = retryable,
                    "Backend call failed"
                );
                if !retryable {
                    return Err(e);
                }
                last_error = e;
                tokio::time::sleep(Duration::from_millis(100 * u64::from(attempt))).await;
            }
        }
    }

    Err(last_error)
}
