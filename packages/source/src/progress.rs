//! Progress reporting for dataset loads.
//!
//! [`ProgressCallback`] decouples the ingestion crate from any rendering
//! backend. The CLI supplies an `indicatif` implementation; tests and
//! library callers use [`null_progress`].

use std::sync::Arc;

/// Receives progress updates while datasets load.
///
/// Implementations must be `Send + Sync` so one instance can be shared
/// across concurrently running fetches.
pub trait ProgressCallback: Send + Sync {
    /// Set the total expected units of work.
    fn set_total(&self, total: u64);

    /// Advance progress by `delta` units.
    fn inc(&self, delta: u64);

    /// Mark progress as complete with a final message.
    fn finish(&self, msg: String);
}

/// Ignores all progress updates.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn finish(&self, _msg: String) {}
}

/// Returns a shared [`NullProgress`] instance.
#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}
