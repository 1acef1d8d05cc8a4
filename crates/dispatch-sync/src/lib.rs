//! Synchronous inline dispatch for deterministic runs.
//!
//! [`SyncDispatch`] runs every item on the calling thread, in order.
//! Queue depth is always 0.

use whisker_dispatch::Dispatch;

/// Synchronous dispatch that runs closures inline.
///
/// Used by tests and single-threaded runs.
/// All work runs on the calling thread in the order submitted.
#[derive(Debug, Default, Clone, Copy)]
pub struct SyncDispatch;

impl SyncDispatch {
    pub fn new() -> Self {
        Self
    }
}

impl Dispatch for SyncDispatch {
    fn map<T, R>(&self, items: &[T], f: impl Fn(&T) -> R + Send + Sync) -> Vec<R>
    where
        T: Sync,
        R: Send,
    {
        items.iter().map(f).collect()
    }

    fn parallelism(&self) -> usize {
        1
    }
}
