//! Analysis task types: one queued unit of work binding a file to a prompt.
//!
//! This module provides [`AnalysisTask`] (the queue's unit of work),
//! [`TaskSpec`] (the enqueue request), the task status state machine, and
//! [`AnalysisMode`] selecting which analysis engine handles a task.

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

/// An opaque identifier for a queued task, unique within one queue.
///
/// IDs are assigned from a monotonic counter at enqueue time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskId(pub u64);

impl TaskId {
    /// Creates a task ID from a raw u64 value.
    #[inline]
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the inner u64 value.
    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "task-{}", self.0)
    }
}

/// The lifecycle status of a queued task.
///
/// Mirrors the file lifecycle but without an unregistered state: tasks are
/// born `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Waiting in the queue for dispatch.
    #[default]
    Pending,

    /// Currently being analyzed by the backend.
    InProgress,

    /// Analysis finished successfully.
    Completed,

    /// Analysis failed; the task carries an error message.
    Failed,

    /// Task was archived after completion (terminal bookkeeping state).
    Archived,
}

impl TaskStatus {
    /// Returns `true` if the transition `self -> next` is legal.
    ///
    /// # Examples
    ///
    /// ```
    /// use ds_core::TaskStatus;
    ///
    /// assert!(TaskStatus::Pending.can_transition_to(TaskStatus::InProgress));
    /// assert!(!TaskStatus::Completed.can_transition_to(TaskStatus::Pending));
    /// ```
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::InProgress)
                | (Self::InProgress, Self::Completed | Self::Failed)
                | (Self::Completed | Self::Failed, Self::Archived)
        )
    }

    /// Returns `true` if the task is terminal (completed, failed, or
    /// archived).
    #[inline]
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Archived)
    }

    /// Returns `true` if the task is outstanding (pending or in progress).
    ///
    /// At most one outstanding task may exist per file path.
    #[inline]
    #[must_use]
    pub const fn is_outstanding(self) -> bool {
        matches!(self, Self::Pending | Self::InProgress)
    }

    /// Returns a human-readable label for this status.
    #[inline]
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
            Self::Failed => "Failed",
            Self::Archived => "Archived",
        }
    }
}

/// Which analysis engine handles a task.
///
/// `Local` runs against the bundled NLP engine; the cloud variants select a
/// configured provider. The set is extensible by configuration, so matches
/// on this enum should carry a fallback arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum AnalysisMode {
    /// Bundled local analysis engine.
    #[default]
    Local,

    /// OpenAI chat-completions provider.
    #[serde(rename = "openai")]
    OpenAi,

    /// Anthropic Claude provider.
    Claude,

    /// Mistral provider.
    Mistral,
}

impl AnalysisMode {
    /// Returns a human-readable label for this mode.
    #[inline]
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Local => "Local",
            Self::OpenAi => "OpenAI",
            Self::Claude => "Claude",
            Self::Mistral => "Mistral",
        }
    }

    /// Returns `true` if this mode calls out to a cloud provider and
    /// therefore needs credentials.
    #[inline]
    #[must_use]
    pub const fn requires_credentials(self) -> bool {
        !matches!(self, Self::Local)
    }
}

/// A request to enqueue one file for analysis.
///
/// # Examples
///
/// ```
/// use ds_core::{AnalysisMode, TaskSpec};
/// use camino::Utf8PathBuf;
///
/// let spec = TaskSpec {
///     file_path: Utf8PathBuf::from("docs/brief.pdf"),
///     file_name: "brief.pdf".to_owned(),
///     prompt_id: "summary".to_owned(),
///     mode: AnalysisMode::Local,
/// };
/// assert_eq!(spec.prompt_id, "summary");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSpec {
    /// Path of the file to analyze.
    pub file_path: Utf8PathBuf,

    /// Display name of the file.
    pub file_name: String,

    /// Which analysis prompt (strategy) to apply.
    pub prompt_id: String,

    /// Which engine to dispatch to.
    pub mode: AnalysisMode,
}

impl TaskSpec {
    /// Convenience constructor deriving the file name from the path.
    #[must_use]
    pub fn for_path(path: Utf8PathBuf, prompt_id: impl Into<String>, mode: AnalysisMode) -> Self {
        let file_name = path.file_name().unwrap_or_default().to_owned();
        Self {
            file_path: path,
            file_name,
            prompt_id: prompt_id.into(),
            mode,
        }
    }
}

/// One queued unit of analysis work.
///
/// Tasks are created by [`TaskSpec`] submission, mutated by the dispatcher
/// as analysis proceeds, and removed by explicit queue operations.
///
/// # Progress
///
/// `progress` is a 0-100 percentage, meaningful only while the task is in
/// progress. It never decreases while in progress; backends without
/// incremental reporting leave it at 0 until the jump to 100 on completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisTask {
    /// Queue-generated identifier.
    pub id: TaskId,

    /// Path of the file under analysis.
    pub file_path: Utf8PathBuf,

    /// Display name of the file.
    pub file_name: String,

    /// Where the task sits in its lifecycle.
    pub status: TaskStatus,

    /// Completion percentage, 0-100, meaningful only while in progress.
    pub progress: u8,

    /// The prompt (strategy) this task applies; tasks are grouped and bulk
    /// controlled by this key.
    pub prompt_id: String,

    /// Which engine handles this task.
    pub mode: AnalysisMode,

    /// Error message; present only when failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Unix timestamp of enqueue.
    pub created_at: u64,
}

impl AnalysisTask {
    /// Creates a pending task from a spec.
    #[must_use]
    pub fn from_spec(id: TaskId, spec: TaskSpec, now: u64) -> Self {
        Self {
            id,
            file_path: spec.file_path,
            file_name: spec.file_name,
            status: TaskStatus::Pending,
            progress: 0,
            prompt_id: spec.prompt_id,
            mode: spec.mode,
            error: None,
            created_at: now,
        }
    }

    /// Records a progress update, clamping to 100 and never moving
    /// backwards while the task is in progress.
    ///
    /// Updates for tasks that are not in progress are ignored.
    ///
    /// # Examples
    ///
    /// ```
    /// use ds_core::{AnalysisMode, AnalysisTask, TaskId, TaskSpec, TaskStatus};
    /// use camino::Utf8PathBuf;
    ///
    /// let spec = TaskSpec::for_path(Utf8PathBuf::from("a.pdf"), "summary", AnalysisMode::Local);
    /// let mut task = AnalysisTask::from_spec(TaskId::new(1), spec, 0);
    /// task.status = TaskStatus::InProgress;
    ///
    /// task.record_progress(40);
    /// task.record_progress(20); // ignored, never decreases
    /// assert_eq!(task.progress, 40);
    /// ```
    pub fn record_progress(&mut self, pct: u8) {
        if self.status != TaskStatus::InProgress {
            return;
        }
        let pct = pct.min(100);
        if pct > self.progress {
            self.progress = pct;
        }
    }
}
