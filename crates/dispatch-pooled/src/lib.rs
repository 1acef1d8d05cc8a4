//! Rayon thread pool dispatch.
//!
//! This module provides [`PooledDispatch`], which runs batches of
//! independent simulations on a dedicated rayon thread pool. Simulations are
//! CPU bound and long running, so the pool is sized to the machine's cores
//! and given generous thread stacks.
//!
//! # Example
//!
//! ```no_run
//! use whisker_dispatch_pooled::{PooledDispatch, ThreadPoolConfig};
//!
//! // Auto-detect cores
//! let dispatch = PooledDispatch::new(ThreadPoolConfig::auto()).unwrap();
//!
//! // Or customize
//! let config = ThreadPoolConfig::builder()
//!     .threads(4)
//!     .build()
//!     .unwrap();
//!
//! let dispatch = PooledDispatch::new(config).unwrap();
//! ```

use std::num::NonZeroUsize;
use std::sync::Arc;
use thiserror::Error;
use tracing::instrument;

use whisker_dispatch::Dispatch;

/// Smallest stack a simulation thread may be given.
const MIN_STACK_SIZE: usize = 64 * 1024;

/// Errors from configuring or building the simulation pool.
#[derive(Debug, Error)]
pub enum ThreadPoolError {
    #[error("Failed to build rayon thread pool: {0}")]
    RayonBuildError(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Configuration for the simulation thread pool.
///
/// Use `ThreadPoolConfig::auto()` to size the pool to the available cores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadPoolConfig {
    /// Number of worker threads. Each runs one simulation at a time.
    pub threads: usize,

    /// Stack size for worker threads (bytes). Default: 8MB.
    pub stack_size: usize,

    /// Prefix for worker thread names.
    pub thread_name_prefix: String,
}

impl Default for ThreadPoolConfig {
    fn default() -> Self {
        Self::auto()
    }
}

impl ThreadPoolConfig {
    /// Size the pool from the cores the OS reports, falling back to 4.
    pub fn auto() -> Self {
        let available = std::thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(4);

        Self::for_core_count(available)
    }

    /// Size the pool for a machine with `total_cores` cores.
    ///
    /// One core is left for the calling thread on machines with more than
    /// two cores.
    pub fn for_core_count(total_cores: usize) -> Self {
        let threads = if total_cores > 2 {
            total_cores - 1
        } else {
            total_cores.max(1)
        };

        Self {
            threads,
            ..Self::minimal()
        }
    }

    /// Start from [`auto`](Self::auto) and override individual settings.
    pub fn builder() -> ThreadPoolConfigBuilder {
        ThreadPoolConfigBuilder::new()
    }

    /// Create a minimal configuration for testing (1 thread).
    pub fn minimal() -> Self {
        Self {
            threads: 1,
            stack_size: 8 * 1024 * 1024,
            thread_name_prefix: "sim".to_string(),
        }
    }

    /// Check thread count, stack size and name prefix.
    pub fn validate(&self) -> Result<(), ThreadPoolError> {
        if self.threads == 0 {
            return Err(ThreadPoolError::InvalidConfig(
                "threads must be at least 1".to_string(),
            ));
        }
        if self.stack_size < MIN_STACK_SIZE {
            return Err(ThreadPoolError::InvalidConfig(format!(
                "stack_size must be at least {} bytes, got {}",
                MIN_STACK_SIZE, self.stack_size
            )));
        }
        if self.thread_name_prefix.is_empty() {
            return Err(ThreadPoolError::InvalidConfig(
                "thread_name_prefix must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for [`ThreadPoolConfig`].
#[derive(Debug, Clone)]
pub struct ThreadPoolConfigBuilder {
    config: ThreadPoolConfig,
}

impl ThreadPoolConfigBuilder {
    /// A builder seeded with [`ThreadPoolConfig::auto`].
    pub fn new() -> Self {
        Self {
            config: ThreadPoolConfig::auto(),
        }
    }

    /// Set the number of worker threads.
    pub fn threads(mut self, count: usize) -> Self {
        self.config.threads = count;
        self
    }

    /// Set stack size for worker threads.
    pub fn stack_size(mut self, size: usize) -> Self {
        self.config.stack_size = size;
        self
    }

    pub fn thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.thread_name_prefix = prefix.into();
        self
    }

    /// Build the configuration, validating it first.
    pub fn build(self) -> Result<ThreadPoolConfig, ThreadPoolError> {
        self.config.validate()?;
        Ok(self.config)
    }

    /// Skip validation. Pool construction still validates.
    pub fn build_unchecked(self) -> ThreadPoolConfig {
        self.config
    }
}

impl Default for ThreadPoolConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Rayon thread pool dispatch.
///
/// `map` runs inside `rayon::ThreadPool::install()`, so nested `par_iter`
/// calls also stay on this pool. Cloning shares the pool.
#[derive(Clone)]
pub struct PooledDispatch {
    config: ThreadPoolConfig,
    pool: Arc<rayon::ThreadPool>,
}

impl PooledDispatch {
    /// Validate `config` and spin up its pool.
    pub fn new(config: ThreadPoolConfig) -> Result<Self, ThreadPoolError> {
        config.validate()?;

        let pool = Arc::new(Self::build_pool(&config)?);

        tracing::info!(
            threads = config.threads,
            stack_size = config.stack_size,
            "Thread pool initialized"
        );

        Ok(Self { config, pool })
    }

    /// A pool sized by [`ThreadPoolConfig::auto`].
    pub fn auto() -> Result<Self, ThreadPoolError> {
        Self::new(ThreadPoolConfig::auto())
    }

    /// Settings the pool was built with.
    pub fn config(&self) -> &ThreadPoolConfig {
        &self.config
    }

    fn build_pool(config: &ThreadPoolConfig) -> Result<rayon::ThreadPool, ThreadPoolError> {
        let prefix = config.thread_name_prefix.clone();
        rayon::ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .stack_size(config.stack_size)
            .thread_name(move |i| format!("{}-{}", prefix, i))
            .build()
            .map_err(|e| ThreadPoolError::RayonBuildError(e.to_string()))
    }
}

impl std::fmt::Debug for PooledDispatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledDispatch")
            .field("config", &self.config)
            .field("threads", &self.pool.current_num_threads())
            .finish()
    }
}

impl Dispatch for PooledDispatch {
    #[instrument(level = "debug", skip_all, fields(items = items.len()))]
    fn map<T, R>(&self, items: &[T], f: impl Fn(&T) -> R + Send + Sync) -> Vec<R>
    where
        T: Sync,
        R: Send,
    {
        self.pool.install(|| {
            use rayon::prelude::*;
            items.par_iter().map(f).collect()
        })
    }

    fn parallelism(&self) -> usize {
        self.pool.current_num_threads()
    }
}
