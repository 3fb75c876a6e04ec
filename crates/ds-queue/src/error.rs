//! Error types for the ds-queue crate.
//!
//! Two families live here:
//!
//! - [`QueueError`]: structural queue errors (unknown task, illegal
//!   removal, persistence) - usage errors surfaced synchronously.
//! - [`AnalysisError`]: the external analysis backend failed. These are
//!   recorded as file/task state by the dispatcher and never crash the
//!   dispatch loop.

use camino::Utf8PathBuf;
use ds_core::{TaskId, TaskStatus};

/// Errors raised by queue operations.
///
/// # Examples
///
/// ```
/// use ds_queue::QueueError;
/// use ds_core::TaskId;
///
/// let err = QueueError::TaskInFlight(TaskId::new(3));
/// assert!(err.to_string().contains("task-3"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    /// An operation referenced an unknown task ID.
    #[error("no task with id {0}")]
    NotFound(TaskId),

    /// Removal was refused because the task is currently being analyzed.
    ///
    /// Removing an in-flight task would leave the registry transition that
    /// dispatch already applied without an owner; the task must finish
    /// first.
    #[error("{0} is in flight and cannot be removed")]
    TaskInFlight(TaskId),

    /// A task status mutation violated the task state machine.
    #[error("invalid task transition: {} -> {}", from.label().to_ascii_lowercase(), to.label().to_ascii_lowercase())]
    InvalidTransition {
        /// The task's current status.
        from: TaskStatus,
        /// The rejected target status.
        to: TaskStatus,
    },

    /// The task snapshot could not be read or written.
    #[error("task store I/O failed for {path}: {source}")]
    Persist {
        /// The store path involved.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The task snapshot or prompt catalog is not valid JSON.
    #[error("store is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

impl QueueError {
    /// Creates a new [`QueueError::Persist`] error.
    #[inline]
    pub fn persist(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Persist {
            path: path.into(),
            source,
        }
    }
}

/// Failures of the external analysis backend.
///
/// A timeout is treated identically to any other analysis failure: the
/// task and file record both end up `failed` with the message recorded.
///
/// # Examples
///
/// ```
/// use ds_queue::AnalysisError;
///
/// let err = AnalysisError::Timeout { secs: 30 };
/// assert!(err.to_string().contains("30"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// The backend call exceeded the configured deadline.
    #[error("analysis timed out after {secs}s")]
    Timeout {
        /// The deadline that elapsed.
        secs: u64,
    },

    /// The provider returned an error response.
    #[error("provider error: {message}")]
    Provider {
        /// The provider's error text (possibly including an HTTP status).
        message: String,
    },

    /// The HTTP transport failed (connection refused, DNS, TLS, ...).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The requested mode has no usable provider configuration.
    #[error("analysis mode '{mode}' is not configured")]
    Unconfigured {
        /// Label of the unconfigured mode.
        mode: String,
    },

    /// The provider responded with a payload we could not interpret.
    #[error("unintelligible provider response: {0}")]
    InvalidResponse(String),
}

impl AnalysisError {
    /// Creates a new [`AnalysisError::Provider`] error.
    #[inline]
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider {
            message: message.into(),
        }
    }

    /// Creates a new [`AnalysisError::Unconfigured`] error.
    #[inline]
    pub fn unconfigured(mode: impl Into<String>) -> Self {
        Self::Unconfigured { mode: mode.into() }
    }

    /// Returns `true` if retrying the call might succeed.
    ///
    /// Configuration errors are not retried; transient transport failures
    /// and timeouts are.
    #[inline]
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::Transport(_) | Self::Provider { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_in_flight_display() {
        let err = QueueError::TaskInFlight(TaskId::new(3));
        assert!(err.to_string().contains("task-3"));
        assert!(err.to_string().contains("in flight"));
    }

    #[test]
    fn test_invalid_transition_display() {
        let err = QueueError::InvalidTransition {
            from: TaskStatus::Completed,
            to: TaskStatus::InProgress,
        };
        let msg = err.to_string();
        assert!(msg.contains("completed"));
        assert!(msg.contains("in progress"));
    }

    #[test]
    fn test_analysis_error_retryability() {
        assert!(AnalysisError::Timeout { secs: 30 }.is_retryable());
        assert!(AnalysisError::provider("rate limited").is_retryable());
        assert!(!AnalysisError::unconfigured("claude").is_retryable());
        assert!(!AnalysisError::InvalidResponse("empty body".to_owned()).is_retryable());
    }

    #[test]
    fn test_unconfigured_display() {
        let err = AnalysisError::unconfigured("mistral");
        assert!(err.to_string().contains("mistral"));
    }
}
