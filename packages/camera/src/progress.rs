//! Progress reporting for camera batches.
//!
//! The batch loop reports through [`ProgressCallback`] so it does not care
//! whether progress ends up on an `indicatif` bar, in the log, or nowhere.

/// Receives progress updates from a long-running operation.
///
/// Implementations must be `Send + Sync` so they can be shared behind an
/// `Arc`.
pub trait ProgressCallback: Send + Sync {
    /// Set the total expected units of work.
    fn set_total(&self, total: u64);

    /// Advance progress by `delta` units.
    fn inc(&self, delta: u64);

    /// Update the message displayed alongside the progress indicator.
    fn set_message(&self, msg: String);

    /// Mark progress as complete with a final message.
    fn finish(&self, msg: String);
}

/// Ignores every update.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}
