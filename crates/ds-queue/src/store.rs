//! JSON snapshot persistence for queue tasks.
//!
//! Same discipline as the registry snapshot: one pretty-printed JSON array,
//! written via temp file + rename, tolerant of a missing file on first run.

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use ds_core::AnalysisTask;
use tracing::debug;

use crate::error::QueueError;

/// Durable storage for the queue's task list.
///
/// # Examples
///
/// ```no_run
/// use ds_queue::TaskStore;
/// use camino::Utf8PathBuf;
///
/// let store = TaskStore::new(Utf8PathBuf::from("task_queue.json"));
/// let tasks = store.load()?;
/// println!("loaded {} tasks", tasks.len());
/// # Ok::<(), ds_queue::QueueError>(())
/// ```
#[derive(Debug, Clone)]
pub struct TaskStore {
    /// Path of the snapshot file.
    path: Utf8PathBuf,
}

impl TaskStore {
    /// Creates a store for the given snapshot path.
    #[inline]
    #[must_use]
    pub const fn new(path: Utf8PathBuf) -> Self {
        Self { path }
    }

    /// Returns the snapshot path.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Loads all tasks from the snapshot.
    ///
    /// Returns an empty vector when the snapshot file does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Persist`] on I/O failure and
    /// [`QueueError::Parse`] when the file is not valid JSON.
    pub fn load(&self) -> Result<Vec<AnalysisTask>, QueueError> {
        if !self.path.exists() {
            debug!(path = %self.path, "No task snapshot yet, starting empty");
            return Ok(Vec::new());
        }

        let contents = fs::read_to_string(self.path.as_std_path())
            .map_err(|e| QueueError::persist(self.path.clone(), e))?;
        let tasks: Vec<AnalysisTask> = serde_json::from_str(&contents)?;

        debug!(path = %self.path, count = tasks.len(), "Task snapshot loaded");
        Ok(tasks)
    }

    /// Writes all tasks to the snapshot atomically.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Persist`] on I/O failure.
    pub fn save(&self, tasks: &[AnalysisTask]) -> Result<(), QueueError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent.as_std_path())
                    .map_err(|e| QueueError::persist(parent.to_owned(), e))?;
            }
        }

        let json = serde_json::to_string_pretty(tasks)?;

        let tmp = Utf8PathBuf::from(format!("{}.tmp", self.path));
        fs::write(tmp.as_std_path(), json.as_bytes())
            .map_err(|e| QueueError::persist(tmp.clone(), e))?;
        fs::rename(tmp.as_std_path(), self.path.as_std_path())
            .map_err(|e| QueueError::persist(self.path.clone(), e))?;

        debug!(path = %self.path, count = tasks.len(), "Task snapshot saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::AnalysisQueue;
    use camino::Utf8PathBuf;
    use ds_core::{AnalysisMode, TaskSpec, TaskStatus};
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> TaskStore {
        let path = Utf8Path::from_path(dir.path())
            .expect("Invalid path")
            .join("tasks.json");
        TaskStore::new(path)
    }

    fn spec(path: &str) -> TaskSpec {
        TaskSpec::for_path(Utf8PathBuf::from(path), "summary", AnalysisMode::Local)
    }

    #[test]
    fn test_load_missing_is_empty() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let store = store_in(&dir);
        assert!(store.load().expect("load failed").is_empty());
    }

    #[test]
    fn test_queue_persists_across_reopen() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let store = store_in(&dir);

        {
            let queue = AnalysisQueue::open(store.clone()).expect("open failed");
            queue
                .enqueue(vec![spec("a.pdf"), spec("b.pdf")])
                .expect("enqueue failed");
        }

        let reopened = AnalysisQueue::open(store).expect("reopen failed");
        assert_eq!(reopened.len(), 2);
        assert_eq!(reopened.pending_count(), 2);
    }

    #[test]
    fn test_reopen_recovers_in_progress_to_pending() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let store = store_in(&dir);

        let claimed_id = {
            let queue = AnalysisQueue::open(store.clone()).expect("open failed");
            queue.enqueue(vec![spec("a.pdf")]).expect("enqueue failed");
            queue.claim_next().expect("claim failed").id
        };

        // Simulated unclean shutdown while the task was in flight.
        let reopened = AnalysisQueue::open(store).expect("reopen failed");
        let task = reopened.get(claimed_id).expect("task missing");
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.progress, 0);
    }

    #[test]
    fn test_reopen_continues_id_sequence() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let store = store_in(&dir);

        let first_id = {
            let queue = AnalysisQueue::open(store.clone()).expect("open failed");
            queue.enqueue(vec![spec("a.pdf")]).expect("enqueue failed")[0].id
        };

        let reopened = AnalysisQueue::open(store).expect("reopen failed");
        let second_id = reopened.enqueue(vec![spec("b.pdf")]).expect("enqueue failed")[0].id;

        assert!(second_id > first_id);
    }

    #[test]
    fn test_load_rejects_corrupt_snapshot() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let store = store_in(&dir);
        fs::write(store.path().as_std_path(), b"[not json").expect("write failed");
        assert!(store.load().is_err());
    }
}
