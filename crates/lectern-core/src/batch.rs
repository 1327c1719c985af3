//! Batch fan-out with per-element outcomes.
//!
//! Every augmenting operation accepts one document or many; batches run
//! each element in its own task and capture failures as per-element
//! error strings so one bad document never fails its siblings.
//! Cancellation is checked before each element starts: elements that
//! never started report `cancelled` instead of running.

use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::Result;

/// Run `process` over every input concurrently. The output preserves
/// input order; each element is either the operation's result or the
/// error string it failed with.
pub async fn run_batch<T, R, F, Fut>(
    inputs: Vec<T>,
    cancel: &CancellationToken,
    process: F,
) -> Vec<std::result::Result<R, String>>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<R>> + Send + 'static,
{
    let mut handles = Vec::with_capacity(inputs.len());
    for input in inputs {
        if cancel.is_cancelled() {
            handles.push(None);
            continue;
        }
        let process = process.clone();
        handles.push(Some(tokio::spawn(async move { process(input).await })));
    }

    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        let outcome = match handle {
            None => Err("cancelled: operation aborted before start".to_string()),
            Some(handle) => match handle.await {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(err)) => Err(err.to_string()),
                Err(join_err) => Err(format!("task failed: {join_err}")),
            },
        };
        results.push(outcome);
    }
    results
}
