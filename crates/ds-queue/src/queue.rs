//! The analysis queue: ordered work list with dedup and bulk controls.
//!
//! # Safety Pattern
//!
//! Queue state lives behind a single `parking_lot::Mutex`; every public
//! method takes the lock for the whole operation, so the dedup check and
//! the insert it guards are atomic - concurrent submissions of the same
//! path cannot both pass the check. Reads return clones, never guards.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use camino::Utf8Path;
use ds_core::{unix_now, AnalysisTask, FxHashSet, TaskId, TaskSpec, TaskStatus};
use parking_lot::Mutex;
use tokio::sync::Notify;
use tracing::{debug, info};

use crate::error::QueueError;
use crate::store::TaskStore;

/// Interior queue state, guarded by one mutex.
#[derive(Debug, Default)]
struct QueueState {
    /// Tasks in submission order.
    tasks: Vec<AnalysisTask>,

    /// Next task ID to assign.
    next_id: u64,

    /// Strategy groups currently stopped by the per-group gate.
    stopped_strategies: FxHashSet<String>,
}

/// An ordered work list of analysis tasks.
///
/// The queue accepts batch submissions, deduplicates outstanding work per
/// file path, exposes pause/resume and per-strategy start/stop controls,
/// and hands tasks to the dispatcher one at a time in FIFO order.
///
/// # Concurrency invariant
///
/// A given file path has at most one outstanding (pending or in-progress)
/// task at any time. Duplicate submissions while one is outstanding are
/// silently dropped.
///
/// # Examples
///
/// ```
/// use ds_queue::AnalysisQueue;
/// use ds_core::{AnalysisMode, TaskSpec};
/// use camino::Utf8PathBuf;
///
/// let queue = AnalysisQueue::in_memory();
/// let spec = TaskSpec::for_path(Utf8PathBuf::from("a.pdf"), "summary", AnalysisMode::Local);
///
/// let created = queue.enqueue(vec![spec.clone()])?;
/// assert_eq!(created.len(), 1);
///
/// // Same path again while outstanding: dropped.
/// let dup = queue.enqueue(vec![spec])?;
/// assert!(dup.is_empty());
/// # Ok::<(), ds_queue::QueueError>(())
/// ```
#[derive(Debug)]
pub struct AnalysisQueue {
    /// Task list and grouping state.
    state: Mutex<QueueState>,

    /// Global pause flag; set stops new dispatches only.
    paused: AtomicBool,

    /// Wakes the dispatcher when work may be available.
    notify: Notify,

    /// Task persistence; `None` for ephemeral queues.
    store: Option<TaskStore>,
}

impl AnalysisQueue {
    /// Creates an ephemeral queue with no persistence.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            paused: AtomicBool::new(false),
            notify: Notify::new(),
            store: None,
        }
    }

    /// Opens a persistent queue, loading the task snapshot if one exists.
    ///
    /// Tasks recorded `in_progress` by an unclean shutdown are reset to
    /// `pending` for re-dispatch.
    ///
    /// # Errors
    ///
    /// Returns a persistence error when the snapshot cannot be read.
    pub fn open(store: TaskStore) -> Result<Self, QueueError> {
        let mut tasks = store.load()?;

        let mut recovered = 0usize;
        for task in &mut tasks {
            if task.status == TaskStatus::InProgress {
                task.status = TaskStatus::Pending;
                task.progress = 0;
                recovered += 1;
            }
        }

        let next_id = tasks.iter().map(|t| t.id.as_u64() + 1).max().unwrap_or(0);

        let queue = Self {
            state: Mutex::new(QueueState {
                tasks,
                next_id,
                stopped_strategies: FxHashSet::default(),
            }),
            paused: AtomicBool::new(false),
            notify: Notify::new(),
            store: Some(store),
        };

        if recovered > 0 {
            info!(count = recovered, "Recovered in-progress tasks to pending");
            queue.persist()?;
        }
        Ok(queue)
    }

    /// Submits a batch of task specs.
    ///
    /// Specs whose file path already has an outstanding task are skipped -
    /// no duplicate task is created. Newly created tasks start `pending`
    /// and keep submission order within their strategy group. Returns the
    /// tasks actually created.
    ///
    /// # Errors
    ///
    /// Returns a persistence error if the task snapshot cannot be written.
    pub fn enqueue(&self, specs: Vec<TaskSpec>) -> Result<Vec<AnalysisTask>, QueueError> {
        let created = {
            let mut state = self.state.lock();
            let now = unix_now();
            let mut created = Vec::new();

            for spec in specs {
                let outstanding = state
                    .tasks
                    .iter()
                    .any(|t| t.status.is_outstanding() && t.file_path == spec.file_path);
                if outstanding {
                    debug!(path = %spec.file_path, "Skipping duplicate submission");
                    continue;
                }

                let id = TaskId::new(state.next_id);
                state.next_id += 1;
                let task = AnalysisTask::from_spec(id, spec, now);
                state.tasks.push(task.clone());
                created.push(task);
            }
            created
        };

        if !created.is_empty() {
            self.persist()?;
            self.notify.notify_one();
            info!(count = created.len(), "Tasks enqueued");
        }
        Ok(created)
    }

    /// Stops starting new dispatches. In-flight work runs to completion.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
        info!("Queue paused");
    }

    /// Resumes dispatching.
    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
        self.notify.notify_one();
        info!("Queue resumed");
    }

    /// Returns `true` while the global pause flag is set.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    /// Stops one strategy group: its pending tasks are skipped by dispatch
    /// until the group is started again. Layered under the global pause
    /// flag.
    pub fn stop_strategy(&self, strategy: &str) {
        self.state
            .lock()
            .stopped_strategies
            .insert(strategy.to_owned());
        info!(strategy, "Strategy stopped");
    }

    /// Starts a previously stopped strategy group.
    pub fn start_strategy(&self, strategy: &str) {
        self.state.lock().stopped_strategies.remove(strategy);
        self.notify.notify_one();
        info!(strategy, "Strategy started");
    }

    /// Returns `true` if a strategy group is currently stopped.
    #[must_use]
    pub fn is_strategy_stopped(&self, strategy: &str) -> bool {
        self.state.lock().stopped_strategies.contains(strategy)
    }

    /// Removes terminal tasks from the visible queue.
    ///
    /// Pending and in-progress tasks are left untouched; registry state is
    /// unaffected. Returns the number of tasks removed.
    ///
    /// # Errors
    ///
    /// Returns a persistence error if the task snapshot cannot be written.
    pub fn clear(&self) -> Result<usize, QueueError> {
        let removed = {
            let mut state = self.state.lock();
            let before = state.tasks.len();
            state.tasks.retain(|t| !t.status.is_terminal());
            before - state.tasks.len()
        };
        if removed > 0 {
            self.persist()?;
            info!(count = removed, "Cleared terminal tasks");
        }
        Ok(removed)
    }

    /// Removes completed tasks older than the retention window.
    ///
    /// # Errors
    ///
    /// Returns a persistence error if the task snapshot cannot be written.
    pub fn prune_completed(&self, retention_secs: u64, now: u64) -> Result<usize, QueueError> {
        let removed = {
            let mut state = self.state.lock();
            let before = state.tasks.len();
            state.tasks.retain(|t| {
                t.status != TaskStatus::Completed || now.saturating_sub(t.created_at) <= retention_secs
            });
            before - state.tasks.len()
        };
        if removed > 0 {
            self.persist()?;
            debug!(count = removed, "Pruned completed tasks");
        }
        Ok(removed)
    }

    /// Removes a single task.
    ///
    /// Pending and terminal tasks are removed; removal of an in-flight
    /// task is refused so the registry transition applied at dispatch
    /// keeps an owner.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::NotFound`] for an unknown ID and
    /// [`QueueError::TaskInFlight`] for an in-progress task.
    pub fn remove_task(&self, id: TaskId) -> Result<AnalysisTask, QueueError> {
        let removed = {
            let mut state = self.state.lock();
            let index = state
                .tasks
                .iter()
                .position(|t| t.id == id)
                .ok_or(QueueError::NotFound(id))?;
            if state.tasks[index].status == TaskStatus::InProgress {
                return Err(QueueError::TaskInFlight(id));
            }
            state.tasks.remove(index)
        };
        self.persist()?;
        info!(id = %id, "Task removed");
        Ok(removed)
    }

    /// Claims the next dispatchable task, marking it in progress.
    ///
    /// Returns `None` while paused or when no pending task belongs to a
    /// started strategy. Claiming under the state lock is what keeps the
    /// one-in-flight-per-path invariant intact across concurrent callers.
    #[must_use]
    pub fn claim_next(&self) -> Option<AnalysisTask> {
        if self.is_paused() {
            return None;
        }

        let mut state = self.state.lock();
        let stopped = state.stopped_strategies.clone();
        let task = state
            .tasks
            .iter_mut()
            .find(|t| t.status == TaskStatus::Pending && !stopped.contains(&t.prompt_id))?;

        task.status = TaskStatus::InProgress;
        let claimed = task.clone();
        drop(state);

        // Claim persistence is best-effort; the restart recovery path
        // re-pends in-progress tasks anyway.
        if let Err(error) = self.persist() {
            debug!(error = %error, "Failed to persist claim");
        }
        debug!(id = %claimed.id, path = %claimed.file_path, "Task claimed");
        Some(claimed)
    }

    /// Marks a claimed task completed, jumping progress to 100.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::NotFound`] or [`QueueError::InvalidTransition`].
    pub fn complete_task(&self, id: TaskId) -> Result<AnalysisTask, QueueError> {
        self.finish_task(id, TaskStatus::Completed, None)
    }

    /// Marks a claimed task failed with an error message.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::NotFound`] or [`QueueError::InvalidTransition`].
    pub fn fail_task(&self, id: TaskId, error: impl Into<String>) -> Result<AnalysisTask, QueueError> {
        self.finish_task(id, TaskStatus::Failed, Some(error.into()))
    }

    /// Applies a terminal outcome to a task.
    fn finish_task(
        &self,
        id: TaskId,
        outcome: TaskStatus,
        error: Option<String>,
    ) -> Result<AnalysisTask, QueueError> {
        let finished = {
            let mut state = self.state.lock();
            let task = state
                .tasks
                .iter_mut()
                .find(|t| t.id == id)
                .ok_or(QueueError::NotFound(id))?;

            if !task.status.can_transition_to(outcome) {
                return Err(QueueError::InvalidTransition {
                    from: task.status,
                    to: outcome,
                });
            }

            task.status = outcome;
            match outcome {
                TaskStatus::Completed => {
                    task.progress = 100;
                    task.error = None;
                }
                TaskStatus::Failed => task.error = error,
                _ => {}
            }
            task.clone()
        };

        self.persist()?;
        debug!(id = %id, status = outcome.label(), "Task finished");
        Ok(finished)
    }

    /// Records incremental progress for an in-flight task.
    ///
    /// Progress never decreases while a task is in progress; updates for
    /// tasks in any other state are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::NotFound`] for an unknown ID.
    pub fn record_progress(&self, id: TaskId, pct: u8) -> Result<(), QueueError> {
        let mut state = self.state.lock();
        let task = state
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(QueueError::NotFound(id))?;
        task.record_progress(pct);
        Ok(())
    }

    /// Returns `true` if a path has an outstanding task.
    #[must_use]
    pub fn has_outstanding(&self, path: &Utf8Path) -> bool {
        self.state
            .lock()
            .tasks
            .iter()
            .any(|t| t.status.is_outstanding() && t.file_path == path)
    }

    /// Returns a clone of one task.
    #[must_use]
    pub fn get(&self, id: TaskId) -> Option<AnalysisTask> {
        self.state.lock().tasks.iter().find(|t| t.id == id).cloned()
    }

    /// Returns a snapshot of all tasks in submission order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<AnalysisTask> {
        self.state.lock().tasks.clone()
    }

    /// Returns tasks grouped by strategy, for display and bulk control.
    #[must_use]
    pub fn grouped(&self) -> BTreeMap<String, Vec<AnalysisTask>> {
        let state = self.state.lock();
        let mut groups: BTreeMap<String, Vec<AnalysisTask>> = BTreeMap::new();
        for task in &state.tasks {
            groups
                .entry(task.prompt_id.clone())
                .or_default()
                .push(task.clone());
        }
        groups
    }

    /// Returns the number of tasks in the queue (any status).
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().tasks.len()
    }

    /// Returns `true` if the queue holds no tasks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.lock().tasks.is_empty()
    }

    /// Returns the number of pending tasks.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.state
            .lock()
            .tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Pending)
            .count()
    }

    /// Waits until new work may be available (enqueue, resume, or a
    /// strategy start).
    pub async fn work_available(&self) {
        self.notify.notified().await;
    }

    /// Writes the current task list to the snapshot, when persistent.
    fn persist(&self) -> Result<(), QueueError> {
        let Some(store) = &self.store else {
            return Ok(());
        };
        let tasks = self.snapshot();
        store.save(&tasks)
    }
}
