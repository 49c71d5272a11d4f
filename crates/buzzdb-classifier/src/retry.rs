//! Retry with exponential back-off and jitter for classifier calls.
//!
//! Only transient transport conditions are retried in-call; anything else
//! (4xx, parse failures) is surfaced immediately and the post is simply
//! retried on a later pipeline run via its `is_classified = false` flag.

use std::future::Future;
use std::time::Duration;

use crate::error::ClassifierError;

/// Returns `true` for errors worth retrying after a back-off delay:
/// network-level failures, 429, and 5xx responses.
pub(crate) fn is_retriable(err: &ClassifierError) -> bool {
    match err {
        ClassifierError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        ClassifierError::Status { status, .. } => *status == 429 || *status >= 500,
        ClassifierError::MissingContent
        | ClassifierError::Parse { .. }
        | ClassifierError::InvalidBaseUrl { .. } => false,
    }
}

/// Runs `operation` with up to `max_retries` additional attempts on
/// transient errors, sleeping `backoff_base_ms * 2^attempt` (±25 % jitter,
/// capped at 60 s) between attempts.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, ClassifierError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ClassifierError>>,
{
    const MAX_DELAY_MS: u64 = 60_000;
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let computed = backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(10));
                let capped = computed.min(MAX_DELAY_MS);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "transient classifier error — retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}
