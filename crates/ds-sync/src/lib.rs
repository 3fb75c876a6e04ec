//! Poll-based status synchronizer for client views.
//!
//! This crate reconciles client-held state with registry and queue truth.
//! There is no push channel in this design: a background loop polls on a
//! fixed interval, merges the fetched state into a [`SyncView`], and
//! streams updates to consumers.
//!
//! # Overview
//!
//! - [`StatusSource`] / [`LocalSource`]: where truth is fetched from
//! - [`SyncView`]: the merged, read-only client view with a connectivity
//!   flag
//! - [`StatusSynchronizer`]: the interval poll loop with skip-if-busy
//!   backpressure and graceful shutdown
//!
//! # Degradation
//!
//! On fetch failure the last-known view is retained and only the
//! connectivity flag flips; known-good state is never invalidated
//! speculatively. Presentation uses the flag to degrade to read-only
//! navigation.

#![deny(clippy::all)]
#![warn(missing_docs)]

mod error;
mod source;
mod synchronizer;
mod view;

pub use error::SyncError;
pub use source::{LocalSource, StatusReport, StatusSource};
pub use synchronizer::StatusSynchronizer;
pub use view::SyncView;
