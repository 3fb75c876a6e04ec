//! Error types for the ds-sync crate.

/// Errors that can occur during status synchronization.
///
/// Connectivity failures are absorbed by the synchronizer: the last-known
/// view is retained and only a connectivity flag flips. They are never
/// surfaced as per-operation failures to consumers.
///
/// # Examples
///
/// ```
/// use ds_sync::SyncError;
///
/// let err = SyncError::backend_unavailable("connection refused");
/// assert!(err.to_string().contains("connection refused"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The backing state could not be fetched.
    #[error("backend unavailable: {message}")]
    BackendUnavailable {
        /// Description of the connectivity failure.
        message: String,
    },

    /// The synchronizer's event channel closed unexpectedly.
    #[error("synchronizer channel closed")]
    ChannelClosed,
}

impl SyncError {
    /// Creates a new [`SyncError::BackendUnavailable`] error.
    #[inline]
    pub fn backend_unavailable(message: impl Into<String>) -> Self {
        Self::BackendUnavailable {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_unavailable_display() {
        let err = SyncError::backend_unavailable("poll failed");
        assert!(err.to_string().contains("poll failed"));
    }

    #[test]
    fn test_channel_closed_display() {
        assert!(SyncError::ChannelClosed.to_string().contains("channel"));
    }
}
