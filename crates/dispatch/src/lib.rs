//! Dispatch trait for running independent simulations.
//!
//! Scoring many candidates and sweeping a grid of initial conditions are
//! both embarrassingly parallel: every simulation owns its own state and
//! shares at most a read-only rule tree. Callers hand a batch of inputs to a
//! [`Dispatch`] and block until every result is back:
//!
//! - `whisker_dispatch_sync::SyncDispatch` runs the batch inline on the
//!   calling thread
//! - `whisker_dispatch_pooled::PooledDispatch` spreads it over a rayon
//!   thread pool
//!
//! Results always come back in submission order, so output built from them
//! does not depend on which implementation ran the work.

/// Trait for running a batch of independent, CPU-bound tasks.
pub trait Dispatch: Send + Sync + Clone {
    /// Apply `f` to every item, potentially in parallel.
    ///
    /// This is a **blocking** call: it returns once every item has been
    /// processed. The result at index `i` is `f(&items[i])`.
    fn map<T, R>(&self, items: &[T], f: impl Fn(&T) -> R + Send + Sync) -> Vec<R>
    where
        T: Sync,
        R: Send;

    /// Maximum number of items processed at the same time.
    fn parallelism(&self) -> usize;
}
