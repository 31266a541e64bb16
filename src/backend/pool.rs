//! Bounded pool for blocking backend calls.
//!
//! # Responsibilities
//! - Run blocking jobs off the async I/O threads
//! - Cap how many run at once
//! - Queue the rest in arrival order instead of spawning more workers
//!
//! Slots are semaphore permits (FIFO-fair); work runs on Tokio's blocking
//! thread pool while the permit is held.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Semaphore;

/// Errors from the pool itself, as opposed to the job it ran.
#[derive(Debug, Error)]
pub enum PoolError {
    /// The pool was shut down.
    #[error("worker pool is closed")]
    Closed,

    /// The job panicked or its worker was cancelled.
    #[error("worker failed: {0}")]
    Worker(String),
}

/// A bounded set of blocking worker slots.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    slots: Arc<Semaphore>,
    size: usize,
}

impl WorkerPool {
    /// Create a pool that runs at most `size` jobs at once.
    ///
    /// A `size` of zero is bumped to one; validation rejects it earlier.
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            slots: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    /// Run `job` on a blocking worker once a slot is free.
    pub async fn run<F, T>(&self, job: F) -> Result<T, PoolError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let permit = self
            .slots
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| PoolError::Closed)?;

        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            job()
        })
        .await
        .map_err(|e| PoolError::Worker(e.to_string()))
    }

    /// Configured number of slots.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Slots not currently held by a running job.
    pub fn available(&self) -> usize {
        self.slots.available_permits()
    }

    /// Stop handing out slots. Queued and future jobs fail with [`PoolError::Closed`].
    pub fn close(&self) {
        self.slots.close();
    }
}
