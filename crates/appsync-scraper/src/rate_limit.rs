//! Retry utilities for listing and image fetches.
//!
//! Provides exponential backoff with jitter for transient HTTP errors. A
//! timeout surfaces as [`ScraperError::Http`] and is retried exactly like any
//! other network failure. Non-retriable errors are propagated immediately.

use std::future::Future;
use std::time::Duration;

use crate::error::ScraperError;

/// Upper bound for a single backoff sleep.
const MAX_DELAY_MS: u64 = 60_000;

/// Returns `true` if `err` represents a transient condition that should be
/// retried after a backoff delay.
///
/// Retriable errors:
/// - [`ScraperError::RateLimited`]: HTTP 429.
/// - [`ScraperError::Http`]: network-level failure (connection reset or timeout).
/// - [`ScraperError::UnexpectedStatus`] with a 5xx status.
///
/// Everything else (404, 4xx, malformed markup, storage failures) is
/// returned immediately.
fn is_retriable(err: &ScraperError) -> bool {
    match err {
        ScraperError::RateLimited { .. } | ScraperError::Http(_) => true,
        ScraperError::UnexpectedStatus { status, .. } => (500..600).contains(status),
        _ => false,
    }
}

/// Computes the sleep before retry number `attempt` (0-based):
/// `backoff_base_secs * 2^attempt` seconds, ±25 % jitter, capped at 60 s.
fn backoff_delay(backoff_base_secs: u64, attempt: u32) -> Duration {
    let computed = backoff_base_secs
        .saturating_mul(1_000)
        .saturating_mul(1u64 << attempt.min(10));
    let capped = computed.min(MAX_DELAY_MS);
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let jittered = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
    Duration::from_millis(jittered.min(MAX_DELAY_MS))
}

/// Executes `operation` with exponential backoff retries on transient errors.
///
/// With `max_retries = 3` the operation is attempted at most 4 times total.
/// If all retries are exhausted the last error is returned.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_secs: u64,
    mut operation: F,
) -> Result<T, ScraperError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
    let mut attempt = 0u32;

    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        if !is_retriable(&err) || attempt >= max_retries {
            return Err(err);
        }

        let delay = backoff_delay(backoff_base_secs, attempt);
        tracing::warn!(
            attempt,
            max_retries,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            error = %err,
            "transient fetch error, retrying after backoff"
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}
