//! File status types and the analysis lifecycle state machine.
//!
//! This module provides the [`FileStatus`] enum for tracking where a document
//! sits in the analysis lifecycle, the transition table that constrains status
//! mutations, and the precedence rule used to aggregate directory status from
//! descendant files.

use serde::{Deserialize, Serialize};

/// The analysis status of a tracked file.
///
/// Statuses follow a fixed state machine:
///
/// ```text
/// Unregistered ──register──► Pending ──dispatch──► InProgress ──┬──► Completed ──┐
///                               ▲                               │                ├──► Archived
///                               └────────resubmit────────── Failed ◄─────────────┘
/// ```
///
/// Any transition outside these edges is rejected by
/// [`can_transition_to`](Self::can_transition_to).
///
/// # Examples
///
/// ```
/// use ds_core::FileStatus;
///
/// assert!(FileStatus::Pending.can_transition_to(FileStatus::InProgress));
/// assert!(!FileStatus::Pending.can_transition_to(FileStatus::Archived));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    /// File seen in a scan but never registered; exists only as a scan
    /// artifact and is never persisted.
    #[default]
    Unregistered,

    /// File is registered and waiting to be analyzed.
    Pending,

    /// File has been handed to the analysis backend.
    InProgress,

    /// Analysis finished successfully; the record carries a result payload.
    Completed,

    /// Analysis failed; the record carries an error message.
    Failed,

    /// File was archived after a terminal analysis outcome.
    Archived,
}

impl FileStatus {
    /// Returns `true` if the transition `self -> next` is a legal edge in
    /// the lifecycle state machine.
    ///
    /// # Examples
    ///
    /// ```
    /// use ds_core::FileStatus;
    ///
    /// assert!(FileStatus::Unregistered.can_transition_to(FileStatus::Pending));
    /// assert!(FileStatus::InProgress.can_transition_to(FileStatus::Failed));
    /// assert!(FileStatus::Failed.can_transition_to(FileStatus::Pending));
    /// assert!(!FileStatus::Completed.can_transition_to(FileStatus::Pending));
    /// ```
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Unregistered, Self::Pending)
                | (Self::Pending, Self::InProgress)
                | (Self::InProgress, Self::Completed | Self::Failed)
                | (Self::Completed, Self::Archived)
                | (Self::Failed, Self::Archived | Self::Pending)
        )
    }

    /// Returns `true` if this status is terminal (no dispatch will touch it
    /// without an explicit user action).
    ///
    /// # Examples
    ///
    /// ```
    /// use ds_core::FileStatus;
    ///
    /// assert!(FileStatus::Completed.is_terminal());
    /// assert!(FileStatus::Archived.is_terminal());
    /// assert!(!FileStatus::Pending.is_terminal());
    /// ```
    #[inline]
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Archived)
    }

    /// Returns `true` if this status represents live or imminent work.
    ///
    /// Active records must never be removed by cleanup.
    #[inline]
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Pending | Self::InProgress)
    }

    /// Returns `true` if a file in this status may be (re)submitted for
    /// analysis.
    ///
    /// Unregistered files must be registered first; failed files re-enter
    /// the queue through the `Failed -> Pending` edge.
    #[inline]
    #[must_use]
    pub const fn is_resubmittable(self) -> bool {
        matches!(self, Self::Failed)
    }

    /// Returns a human-readable label for this status.
    ///
    /// # Examples
    ///
    /// ```
    /// use ds_core::FileStatus;
    ///
    /// assert_eq!(FileStatus::InProgress.label(), "In Progress");
    /// assert_eq!(FileStatus::Unregistered.label(), "Unregistered");
    /// ```
    #[inline]
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Unregistered => "Unregistered",
            Self::Pending => "Pending",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
            Self::Failed => "Failed",
            Self::Archived => "Archived",
        }
    }

    /// Computes the aggregate status of a directory from its descendant
    /// file statuses.
    ///
    /// Precedence is fixed: `Failed` wins over everything, then
    /// `InProgress`, then `Pending`; a directory whose files are all
    /// `Completed` reports `Completed`; otherwise any `Archived` descendant
    /// makes the directory `Archived`; an empty or fully unregistered
    /// directory reports `Unregistered`.
    ///
    /// # Examples
    ///
    /// ```
    /// use ds_core::FileStatus;
    ///
    /// let agg = FileStatus::aggregate([FileStatus::Failed, FileStatus::Completed]);
    /// assert_eq!(agg, FileStatus::Failed);
    ///
    /// let agg = FileStatus::aggregate([FileStatus::InProgress, FileStatus::Completed]);
    /// assert_eq!(agg, FileStatus::InProgress);
    ///
    /// let agg = FileStatus::aggregate([FileStatus::Completed, FileStatus::Completed]);
    /// assert_eq!(agg, FileStatus::Completed);
    /// ```
    #[must_use]
    pub fn aggregate<I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = Self>,
    {
        let mut total = 0usize;
        let mut completed = 0usize;
        let mut archived = 0usize;
        let mut any_failed = false;
        let mut any_in_progress = false;
        let mut any_pending = false;

        for status in statuses {
            total += 1;
            match status {
                Self::Failed => any_failed = true,
                Self::InProgress => any_in_progress = true,
                Self::Pending => any_pending = true,
                Self::Completed => completed += 1,
                Self::Archived => archived += 1,
                Self::Unregistered => {}
            }
        }

        if any_failed {
            Self::Failed
        } else if any_in_progress {
            Self::InProgress
        } else if any_pending {
            Self::Pending
        } else if total > 0 && completed == total {
            Self::Completed
        } else if archived > 0 {
            Self::Archived
        } else {
            Self::Unregistered
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_transitions() {
        assert!(FileStatus::Unregistered.can_transition_to(FileStatus::Pending));
        assert!(FileStatus::Pending.can_transition_to(FileStatus::InProgress));
        assert!(FileStatus::InProgress.can_transition_to(FileStatus::Completed));
        assert!(FileStatus::InProgress.can_transition_to(FileStatus::Failed));
        assert!(FileStatus::Completed.can_transition_to(FileStatus::Archived));
        assert!(FileStatus::Failed.can_transition_to(FileStatus::Archived));
        assert!(FileStatus::Failed.can_transition_to(FileStatus::Pending));
    }

    #[test]
    fn test_rejected_transitions() {
        // Closure: everything outside the edge set is rejected.
        let all = [
            FileStatus::Unregistered,
            FileStatus::Pending,
            FileStatus::InProgress,
            FileStatus::Completed,
            FileStatus::Failed,
            FileStatus::Archived,
        ];

        let allowed = [
            (FileStatus::Unregistered, FileStatus::Pending),
            (FileStatus::Pending, FileStatus::InProgress),
            (FileStatus::InProgress, FileStatus::Completed),
            (FileStatus::InProgress, FileStatus::Failed),
            (FileStatus::Completed, FileStatus::Archived),
            (FileStatus::Failed, FileStatus::Archived),
            (FileStatus::Failed, FileStatus::Pending),
        ];

        for from in all {
            for to in all {
                let expected = allowed.contains(&(from, to));
                assert_eq!(
                    from.can_transition_to(to),
                    expected,
                    "transition {from:?} -> {to:?}"
                );
            }
        }
    }

    #[test]
    fn test_is_terminal() {
        assert!(FileStatus::Completed.is_terminal());
        assert!(FileStatus::Failed.is_terminal());
        assert!(FileStatus::Archived.is_terminal());
        assert!(!FileStatus::Unregistered.is_terminal());
        assert!(!FileStatus::Pending.is_terminal());
        assert!(!FileStatus::InProgress.is_terminal());
    }

    #[test]
    fn test_is_active() {
        assert!(FileStatus::Pending.is_active());
        assert!(FileStatus::InProgress.is_active());
        assert!(!FileStatus::Completed.is_active());
        assert!(!FileStatus::Archived.is_active());
    }

    #[test]
    fn test_aggregate_failed_wins() {
        let agg = FileStatus::aggregate([
            FileStatus::Failed,
            FileStatus::InProgress,
            FileStatus::Pending,
            FileStatus::Completed,
        ]);
        assert_eq!(agg, FileStatus::Failed);
    }

    #[test]
    fn test_aggregate_in_progress_over_pending() {
        let agg = FileStatus::aggregate([FileStatus::InProgress, FileStatus::Pending]);
        assert_eq!(agg, FileStatus::InProgress);
    }

    #[test]
    fn test_aggregate_all_completed() {
        let agg = FileStatus::aggregate([FileStatus::Completed, FileStatus::Completed]);
        assert_eq!(agg, FileStatus::Completed);
    }

    #[test]
    fn test_aggregate_mixed_completed_not_all() {
        // Completed + Unregistered is not "all completed"; no archived
        // descendants either, so the directory reads unregistered.
        let agg = FileStatus::aggregate([FileStatus::Completed, FileStatus::Unregistered]);
        assert_eq!(agg, FileStatus::Unregistered);
    }

    #[test]
    fn test_aggregate_archived_over_unregistered() {
        let agg = FileStatus::aggregate([FileStatus::Archived, FileStatus::Unregistered]);
        assert_eq!(agg, FileStatus::Archived);
    }

    #[test]
    fn test_aggregate_empty() {
        let agg = FileStatus::aggregate(std::iter::empty());
        assert_eq!(agg, FileStatus::Unregistered);
    }

    #[test]
    fn test_serialization() {
        assert_eq!(
            serde_json::to_string(&FileStatus::InProgress).unwrap(),
            r#""in_progress""#
        );
        assert_eq!(
            serde_json::to_string(&FileStatus::Unregistered).unwrap(),
            r#""unregistered""#
        );

        let status: FileStatus = serde_json::from_str(r#""failed""#).unwrap();
        assert_eq!(status, FileStatus::Failed);
    }
}
