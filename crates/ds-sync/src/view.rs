//! The client-side merged view of registry and queue state.
//!
//! The view is read-mostly and strictly one-directional: source truth
//! always wins over whatever the client held, and a failed fetch never
//! invalidates known-good data - it only flips the connectivity flag.

use camino::{Utf8Path, Utf8PathBuf};
use ds_core::{AnalysisTask, FileStatus, FxHashMap};
use serde::Serialize;

use crate::source::StatusReport;

/// The merged client view.
///
/// # Merge policy
///
/// Registry/queue state wins wholesale on every successful poll - the
/// registry is the single writer of truth and the client is read-mostly,
/// so last-writer-wins-from-source needs no conflict resolution. On a
/// failed poll the previous view is retained and `connected` flips to
/// `false`; presentation degrades to read-only navigation.
///
/// # Examples
///
/// ```
/// use ds_sync::SyncView;
/// use ds_core::FileStatus;
/// use camino::Utf8Path;
///
/// let view = SyncView::default();
/// assert!(view.connected);
/// assert_eq!(view.status_for(Utf8Path::new("unknown.pdf")), FileStatus::Unregistered);
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct SyncView {
    /// Status per registered path.
    pub statuses: FxHashMap<Utf8PathBuf, FileStatus>,

    /// Queue tasks in submission order.
    pub tasks: Vec<AnalysisTask>,

    /// Whether the queue's global pause flag was set at the last poll.
    pub queue_paused: bool,

    /// Connectivity flag; `false` after a failed poll until the next
    /// success.
    pub connected: bool,

    /// Unix timestamp of the last successful poll.
    pub last_sync: Option<u64>,
}

impl Default for SyncView {
    /// Starts optimistic: connected until the first failed poll says
    /// otherwise.
    fn default() -> Self {
        Self {
            statuses: FxHashMap::default(),
            tasks: Vec::new(),
            queue_paused: false,
            connected: true,
            last_sync: None,
        }
    }
}

impl SyncView {
    /// Replaces the view with freshly fetched truth.
    pub fn apply_report(&mut self, report: StatusReport, now: u64) {
        self.statuses = report
            .records
            .into_iter()
            .map(|r| (r.original_path, r.status))
            .collect();
        self.tasks = report.tasks;
        self.queue_paused = report.queue_paused;
        self.connected = true;
        self.last_sync = Some(now);
    }

    /// Records a failed poll: the data is retained, only connectivity
    /// flips.
    pub fn mark_disconnected(&mut self) {
        self.connected = false;
    }

    /// Returns the last-known status for a path; unknown paths read as
    /// unregistered.
    #[must_use]
    pub fn status_for(&self, path: &Utf8Path) -> FileStatus {
        self.statuses
            .get(path)
            .copied()
            .unwrap_or(FileStatus::Unregistered)
    }

    /// Returns the number of tracked paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    /// Returns `true` if no paths are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }
}
