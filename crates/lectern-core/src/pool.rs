//! Bounded worker pool and ordered parallel fan-out.
//!
//! The pool is a plain semaphore: it bounds how many LLM calls are in
//! flight at once regardless of how many tasks exist.
//! [`parallel_process`] is the fan-out helper the parser and quotation
//! extractor share: results come back in input order and the first error
//! fails the whole batch.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;

use crate::{Error, Result};

/// Default number of concurrent in-flight LLM calls.
pub const DEFAULT_MAX_WORKERS: usize = 15;

/// Semaphore-backed pool shared across all operations in the process.
pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
    max_workers: usize,
}

impl WorkerPool {
    pub fn new(max_workers: usize) -> Self {
        let max_workers = if max_workers == 0 {
            DEFAULT_MAX_WORKERS
        } else {
            max_workers
        };
        WorkerPool {
            semaphore: Arc::new(Semaphore::new(max_workers)),
            max_workers,
        }
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Acquire a worker slot; blocks while the pool is full, aborts on
    /// cancellation.
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<OwnedSemaphorePermit> {
        tokio::select! {
            _ = cancel.cancelled() => Err(Error::Cancelled),
            permit = self.semaphore.clone().acquire_owned() => {
                permit.map_err(|_| Error::Cancelled)
            }
        }
    }
}

/// Run `process` over every item through the worker pool.
///
/// Each item gets its own task, but a permit is acquired before the task
/// spawns, so in-flight work never exceeds the pool size. Results are
/// returned in input order; the first error (by completion) wins and the
/// whole call fails.
pub async fn parallel_process<T, R, F, Fut>(
    pool: &WorkerPool,
    items: Vec<T>,
    cancel: &CancellationToken,
    process: F,
) -> Result<Vec<R>>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(usize, T) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<R>> + Send + 'static,
{
    if items.is_empty() {
        return Ok(Vec::new());
    }

    let total = items.len();
    let (tx, mut rx) = tokio::sync::mpsc::channel::<(usize, Result<R>)>(total);

    let mut spawned = 0usize;
    for (index, item) in items.into_iter().enumerate() {
        // Cancellation here stops spawning; results already in flight are
        // still drained below.
        let permit = match pool.acquire(cancel).await {
            Ok(permit) => permit,
            Err(_) => break,
        };
        spawned += 1;

        let tx = tx.clone();
        let cancel = cancel.clone();
        let process = process.clone();
        tokio::spawn(async move {
            let _permit = permit;
            let result = if cancel.is_cancelled() {
                Err(Error::Cancelled)
            } else {
                process(index, item).await
            };
            let _ = tx.send((index, result)).await;
        });
    }
    drop(tx);

    let mut results: Vec<Option<R>> = (0..total).map(|_| None).collect();
    let mut first_error: Option<Error> = None;
    while let Some((index, result)) = rx.recv().await {
        match result {
            Ok(value) => results[index] = Some(value),
            Err(err) => {
                if first_error.is_none() {
                    first_error = Some(err);
                }
            }
        }
    }

    if let Some(err) = first_error {
        return Err(err);
    }
    if spawned < total {
        return Err(Error::Cancelled);
    }

    let mut ordered = Vec::with_capacity(total);
    for slot in results {
        match slot {
            Some(value) => ordered.push(value),
            // A task died without reporting (e.g. panicked).
            None => return Err(Error::Upstream("worker task terminated unexpectedly".into())),
        }
    }
    Ok(ordered)
}
