//! Exponential-backoff retry for network calls
//!
//! Retry is local to a single call: on a retryable failure the delay
//! doubles each attempt until the attempt bound, then the error surfaces
//! to the calling strategy, which marks the unit failed and moves on.

use crate::error::FetchError;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Run `operation` up to `max_attempts` times with exponential backoff.
///
/// Non-retryable errors (4xx, parse, config) surface immediately.
pub async fn with_backoff<T, F, Fut>(
    operation_name: &str,
    max_attempts: u32,
    base_delay_ms: u64,
    mut operation: F,
) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt < max_attempts => {
                let backoff_ms = base_delay_ms.saturating_mul(1 << (attempt - 1));
                warn!(
                    operation = operation_name,
                    attempt,
                    max_attempts,
                    backoff_ms,
                    error = %err,
                    "Attempt failed, will retry after backoff"
                );
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_succeeds_first_attempt() {
        let result = with_backoff("op", 3, 1, || async { Ok::<_, FetchError>(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_retries_transient_errors() {
        let attempts = AtomicU32::new(0);
        let result = with_backoff("op", 3, 1, || {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(FetchError::Network("reset".into()))
                } else {
                    Ok(42)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhausts_attempts() {
        let attempts = AtomicU32::new(0);
        let result: Result<(), _> = with_backoff("op", 3, 1, || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(FetchError::Timeout("slow".into())) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_fatal_errors_do_not_retry() {
        let attempts = AtomicU32::new(0);
        let result: Result<(), _> = with_backoff("op", 3, 1, || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async {
                Err(FetchError::Status {
                    status: 404,
                    url: "https://example.test".into(),
                })
            }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
