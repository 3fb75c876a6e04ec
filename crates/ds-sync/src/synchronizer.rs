//! The polling synchronizer loop.
//!
//! This module provides [`StatusSynchronizer`], an interval-driven poller
//! that keeps a [`SyncView`] aligned with registry and queue truth.
//!
//! # Backpressure
//!
//! A new poll never starts while the previous one is outstanding: the loop
//! awaits each fetch before honoring the next tick, and missed ticks are
//! skipped rather than bursted. Concurrent backend load from the
//! synchronizer is therefore bounded at one request.
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use ds_sync::{LocalSource, StatusSynchronizer};
//! use ds_registry::FileRegistry;
//! use ds_queue::AnalysisQueue;
//! use ds_core::SyncConfig;
//!
//! #[tokio::main]
//! async fn main() {
//!     let source = LocalSource::new(
//!         Arc::new(FileRegistry::in_memory()),
//!         Arc::new(AnalysisQueue::in_memory()),
//!     );
//!
//!     let mut sync = StatusSynchronizer::start(source, &SyncConfig::default());
//!
//!     // Receive view updates in an async context
//!     while let Some(view) = sync.recv().await {
//!         println!("connected: {}, files: {}", view.connected, view.len());
//!     }
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use ds_core::{unix_now, SyncConfig};
use parking_lot::RwLock;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::source::StatusSource;
use crate::view::SyncView;

/// Default channel capacity for view updates.
const DEFAULT_CHANNEL_CAPACITY: usize = 16;

/// A background poller that mirrors source truth into a shared view.
///
/// # Lifecycle
///
/// 1. **Creation**: [`start`](Self::start) spawns the poll loop and runs
///    one immediate poll so consumers are not blind for a full interval.
/// 2. **Consumption**: read the latest view with [`view`](Self::view), or
///    stream updates with [`recv`](Self::recv)/[`try_recv`](Self::try_recv).
/// 3. **Shutdown**: [`shutdown`](Self::shutdown) signals the loop and
///    awaits completion; dropping the synchronizer signals it too.
pub struct StatusSynchronizer {
    /// Shutdown signal sender; `None` after shutdown is initiated.
    shutdown_tx: Option<oneshot::Sender<()>>,

    /// Handle to the poll loop task.
    task_handle: Option<JoinHandle<()>>,

    /// View update receiver.
    update_rx: mpsc::Receiver<SyncView>,

    /// Latest merged view, shared with the loop.
    view: Arc<RwLock<SyncView>>,
}

impl std::fmt::Debug for StatusSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusSynchronizer")
            .field("is_running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl StatusSynchronizer {
    /// Starts the synchronizer with the configured poll interval.
    #[must_use]
    pub fn start<S: StatusSource>(source: S, config: &SyncConfig) -> Self {
        Self::with_interval(source, Duration::from_secs(config.poll_interval_secs.max(1)))
    }

    /// Starts the synchronizer with an explicit interval.
    ///
    /// Sub-second intervals are mainly useful in tests.
    #[must_use]
    pub fn with_interval<S: StatusSource>(source: S, period: Duration) -> Self {
        let (update_tx, update_rx) = mpsc::channel(DEFAULT_CHANNEL_CAPACITY);
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();
        let view = Arc::new(RwLock::new(SyncView::default()));
        let loop_view = Arc::clone(&view);

        let task_handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            // Skip-if-busy: a poll outlasting its interval swallows the
            // missed ticks instead of replaying them.
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            info!(period = ?period, "Synchronizer started");

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => {
                        info!("Synchronizer received shutdown signal");
                        break;
                    }
                    _ = ticker.tick() => {
                        poll_once(&source, &loop_view, &update_tx).await;
                    }
                }
            }

            info!("Synchronizer stopped");
        });

        Self {
            shutdown_tx: Some(shutdown_tx),
            task_handle: Some(task_handle),
            update_rx,
            view,
        }
    }

    /// Returns a clone of the latest merged view.
    #[must_use]
    pub fn view(&self) -> SyncView {
        self.view.read().clone()
    }

    /// Receives the next view update asynchronously.
    ///
    /// Returns `None` when the synchronizer has been shut down.
    pub async fn recv(&mut self) -> Option<SyncView> {
        self.update_rx.recv().await
    }

    /// Tries to receive a view update without blocking.
    pub fn try_recv(&mut self) -> Result<SyncView, mpsc::error::TryRecvError> {
        self.update_rx.try_recv()
    }

    /// Returns `true` while the poll loop is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.shutdown_tx.is_some() && self.task_handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Gracefully shuts down the poll loop.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            // Ignore error if the loop already stopped.
            let _ = tx.send(());
        }
        if let Some(handle) = self.task_handle.take() {
            if let Err(e) = handle.await {
                warn!(error = %e, "Synchronizer task failed");
            }
        }
    }
}

impl Drop for StatusSynchronizer {
    fn drop(&mut self) {
        // Send shutdown signal on drop; the loop stops at its next await.
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Runs one poll: fetch, merge, publish.
async fn poll_once<S: StatusSource>(
    source: &S,
    view: &RwLock<SyncView>,
    update_tx: &mpsc::Sender<SyncView>,
) {
    match source.fetch().await {
        Ok(report) => {
            let snapshot = {
                let mut view = view.write();
                view.apply_report(report, unix_now());
                view.clone()
            };
            debug!(files = snapshot.len(), "View synchronized");
            // A full channel only means the consumer is behind on
            // intermediate updates; the shared view stays current.
            let _ = update_tx.try_send(snapshot);
        }
        Err(error) => {
            warn!(error = %error, "Poll failed, retaining last-known view");
            let snapshot = {
                let mut view = view.write();
                view.mark_disconnected();
                view.clone()
            };
            let _ = update_tx.try_send(snapshot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{LocalSource, StatusReport};
    use crate::SyncError;
    use camino::Utf8Path;
    use ds_core::FileStatus;
    use ds_queue::AnalysisQueue;
    use ds_registry::FileRegistry;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Source that fails whenever the flag is set.
    struct FlakySource {
        inner: LocalSource,
        failing: Arc<AtomicBool>,
    }

    impl StatusSource for FlakySource {
        async fn fetch(&self) -> Result<StatusReport, SyncError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(SyncError::backend_unavailable("injected outage"));
            }
            self.inner.fetch().await
        }
    }

    fn handles() -> (Arc<FileRegistry>, Arc<AnalysisQueue>) {
        (
            Arc::new(FileRegistry::in_memory()),
            Arc::new(AnalysisQueue::in_memory()),
        )
    }

    #[tokio::test]
    async fn test_synchronizer_mirrors_registry() {
        let (registry, queue) = handles();
        registry
            .register(Utf8Path::new("a.pdf"), None, 10)
            .expect("register failed");

        let source = LocalSource::new(Arc::clone(&registry), Arc::clone(&queue));
        let mut sync = StatusSynchronizer::with_interval(source, Duration::from_millis(10));

        let view = sync.recv().await.expect("no update received");
        assert!(view.connected);
        assert_eq!(view.status_for(Utf8Path::new("a.pdf")), FileStatus::Pending);

        sync.shutdown().await;
    }

    #[tokio::test]
    async fn test_synchronizer_tracks_changes() {
        let (registry, queue) = handles();
        let source = LocalSource::new(Arc::clone(&registry), Arc::clone(&queue));
        let mut sync = StatusSynchronizer::with_interval(source, Duration::from_millis(10));

        // First update: empty registry.
        let first = sync.recv().await.expect("no update received");
        assert!(first.is_empty());

        registry
            .register(Utf8Path::new("late.pdf"), None, 10)
            .expect("register failed");

        // A later poll observes the registration.
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        loop {
            let view = sync.recv().await.expect("channel closed");
            if !view.is_empty() {
                assert_eq!(
                    view.status_for(Utf8Path::new("late.pdf")),
                    FileStatus::Pending
                );
                break;
            }
            assert!(
                std::time::Instant::now() < deadline,
                "registration never observed"
            );
        }

        sync.shutdown().await;
    }

    #[tokio::test]
    async fn test_outage_retains_view_and_flags_disconnect() {
        let (registry, queue) = handles();
        registry
            .register(Utf8Path::new("keep.pdf"), None, 10)
            .expect("register failed");

        let failing = Arc::new(AtomicBool::new(false));
        let source = FlakySource {
            inner: LocalSource::new(Arc::clone(&registry), Arc::clone(&queue)),
            failing: Arc::clone(&failing),
        };

        let mut sync = StatusSynchronizer::with_interval(source, Duration::from_millis(10));

        // Healthy first poll.
        let healthy = sync.recv().await.expect("no update received");
        assert!(healthy.connected);
        assert_eq!(healthy.len(), 1);

        // Inject the outage and wait for a disconnected update.
        failing.store(true, Ordering::SeqCst);
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        loop {
            let view = sync.recv().await.expect("channel closed");
            if !view.connected {
                // Last-known state survives the outage.
                assert_eq!(
                    view.status_for(Utf8Path::new("keep.pdf")),
                    FileStatus::Pending
                );
                break;
            }
            assert!(
                std::time::Instant::now() < deadline,
                "outage never observed"
            );
        }

        // Recovery flips connectivity back.
        failing.store(false, Ordering::SeqCst);
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        loop {
            let view = sync.recv().await.expect("channel closed");
            if view.connected {
                break;
            }
            assert!(
                std::time::Instant::now() < deadline,
                "recovery never observed"
            );
        }

        sync.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_stops_loop() {
        let (registry, queue) = handles();
        let source = LocalSource::new(registry, queue);
        let sync = StatusSynchronizer::with_interval(source, Duration::from_millis(10));

        assert!(sync.is_running());
        sync.shutdown().await;
    }

    #[tokio::test]
    async fn test_view_accessor_without_consuming_updates() {
        let (registry, queue) = handles();
        registry
            .register(Utf8Path::new("a.pdf"), None, 10)
            .expect("register failed");
        let source = LocalSource::new(Arc::clone(&registry), Arc::clone(&queue));

        let mut sync = StatusSynchronizer::with_interval(source, Duration::from_millis(10));
        let _ = sync.recv().await;

        let view = sync.view();
        assert_eq!(view.len(), 1);

        sync.shutdown().await;
    }
}
