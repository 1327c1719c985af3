//! Rate governor: process-wide token bucket plus retry-with-backoff.
//!
//! Every LLM call waits for its token estimate on the shared bucket, then
//! runs under the retry policy: rate-limit errors back off exponentially,
//! anything else returns immediately. Tokens are requested before the
//! first attempt only; retries do not re-acquire.

use std::future::Future;
use std::num::NonZeroU32;
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use tokio_util::sync::CancellationToken;

use crate::pool::WorkerPool;
use crate::{Error, Result};

/// Sustained refill rate. The remote allows 2M tokens/min for the model in
/// use; 30k/s (1.8M/min) leaves a safety margin.
pub const TOKENS_PER_SECOND: u32 = 30_000;
/// Burst capacity above the sustained rate.
pub const BURST_TOKENS: u32 = 60_000;
/// Flat per-page estimate covering the PDF payload and the structured
/// JSON response.
pub const ESTIMATED_TOKENS_PER_PAGE: u32 = 2_000;
/// Retries after the initial attempt.
pub const MAX_RETRIES: u32 = 5;

const BASE_RETRY_DELAY: Duration = Duration::from_secs(1);
const MAX_RETRY_DELAY: Duration = Duration::from_secs(32);

/// ~4 characters per token for English text.
pub fn estimate_tokens(text: &str) -> u32 {
    (text.len() / 4) as u32
}

type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Shared token bucket.
pub struct TokenBucket {
    limiter: DirectLimiter,
    burst: u32,
}

impl TokenBucket {
    pub fn new(tokens_per_second: u32, burst: u32) -> Self {
        let rate = NonZeroU32::new(tokens_per_second.max(1)).expect("non-zero rate");
        let burst_n = NonZeroU32::new(burst.max(1)).expect("non-zero burst");
        let quota = Quota::per_second(rate).allow_burst(burst_n);
        TokenBucket {
            limiter: RateLimiter::direct(quota),
            burst: burst.max(1),
        }
    }

    /// Wait until `tokens` are available. Estimates above the burst
    /// capacity are clamped so the wait can always complete.
    pub async fn acquire(&self, tokens: u32, cancel: &CancellationToken) -> Result<()> {
        let tokens = NonZeroU32::new(tokens.clamp(1, self.burst)).expect("clamped above zero");
        tokio::select! {
            _ = cancel.cancelled() => Err(Error::Cancelled),
            result = self.limiter.until_n_ready(tokens) => {
                result.map_err(|e| Error::RateLimited(e.to_string()))
            }
        }
    }
}

/// Token bucket and worker pool, constructed once at startup and shared
/// by every concurrent operation in the process.
pub struct RateGovernor {
    pub bucket: TokenBucket,
    pub pool: WorkerPool,
}

impl Default for RateGovernor {
    fn default() -> Self {
        RateGovernor {
            bucket: TokenBucket::new(TOKENS_PER_SECOND, BURST_TOKENS),
            pool: WorkerPool::new(crate::pool::DEFAULT_MAX_WORKERS),
        }
    }
}

impl RateGovernor {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Does this error read like a 429 from the remote?
pub fn is_rate_limit_error(err: &Error) -> bool {
    if matches!(err, Error::RateLimited(_)) {
        return true;
    }
    let message = err.to_string();
    ["429", "rate limit", "rate_limit_exceeded", "Too Many Requests"]
        .iter()
        .any(|needle| message.contains(needle))
}

fn backoff_delay(attempt: u32) -> Duration {
    let factor = 1u32 << (attempt - 1).min(16);
    (BASE_RETRY_DELAY * factor).min(MAX_RETRY_DELAY)
}

/// Acquire tokens once, then run `call` with retry-on-429.
///
/// Non-rate-limit errors are returned on the spot. Cancellation during
/// the token wait, the call, or a backoff sleep aborts with `Cancelled`.
pub async fn rate_limited_call<T, F, Fut>(
    bucket: &TokenBucket,
    estimated_tokens: u32,
    cancel: &CancellationToken,
    mut call: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    bucket.acquire(estimated_tokens, cancel).await?;

    let mut attempt = 0u32;
    loop {
        let result = tokio::select! {
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            result = call() => result,
        };

        let err = match result {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if !is_rate_limit_error(&err) {
            return Err(err);
        }
        if attempt >= MAX_RETRIES {
            return Err(Error::RateLimited(format!(
                "max retries ({MAX_RETRIES}) exceeded, last error: {err}"
            )));
        }

        attempt += 1;
        let delay = backoff_delay(attempt);
        tokio::select! {
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            _ = tokio::time::sleep(delay) => {}
        }
    }
}
