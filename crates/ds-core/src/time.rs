//! Wall-clock helpers.
//!
//! Timestamps throughout the workspace are plain unix seconds (`u64`).
//! Components that need testable time take an explicit `now` argument and
//! offer a thin wrapper that calls [`unix_now`].

use std::time::{SystemTime, UNIX_EPOCH};

/// Returns the current wall-clock time as unix seconds.
///
/// Clocks before the epoch collapse to 0 rather than panicking.
///
/// # Examples
///
/// ```
/// use ds_core::unix_now;
///
/// let now = unix_now();
/// assert!(now > 1_600_000_000); // after 2020
/// ```
#[must_use]
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unix_now_is_monotonic_enough() {
        let a = unix_now();
        let b = unix_now();
        assert!(b >= a);
    }
}
