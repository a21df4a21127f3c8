use crate::config::RetryConfig;
use crate::error::ProviderError;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// Run a provider call with exponential backoff.
///
/// Only retryable errors (transport, HTTP status) are retried; anything else
/// is returned immediately. The last error is returned once attempts run out.
pub async fn run_with_retry<F, Fut, T>(
    mut f: F,
    retry_config: &RetryConfig,
) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let max_attempts = retry_config.max_attempts.max(1);
    let mut delay = Duration::from_millis(retry_config.initial_delay_ms);
    let mut attempt = 1;

    loop {
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) if !e.is_retryable() || attempt >= max_attempts => return Err(e),
            Err(e) => {
                warn!("Attempt {} failed: {}, retrying in {:?}", attempt, e, delay);
                sleep(delay).await;

                // Exponential backoff
                delay = Duration::from_millis(
                    (delay.as_millis() as f64 * retry_config.backoff_multiplier)
                        .min(retry_config.max_delay_ms as f64) as u64,
                );
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn no_delay() -> RetryConfig {
        RetryConfig {
            max_attempts: 3,
            initial_delay_ms: 0,
            backoff_multiplier: 2.0,
            max_delay_ms: 0,
        }
    }

    fn unavailable() -> ProviderError {
        ProviderError::HttpStatus {
            endpoint: "getNFLGamesForPlayer".to_string(),
            status: 503,
        }
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);

        let result = run_with_retry(
            || {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if n < 3 {
                        Err(unavailable())
                    } else {
                        Ok(n)
                    }
                }
            },
            &no_delay(),
        )
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = run_with_retry(
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(unavailable()) }
            },
            &no_delay(),
        )
        .await;

        assert!(matches!(result, Err(ProviderError::HttpStatus { status: 503, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_rejection_is_not_retried() {
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = run_with_retry(
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async {
                    Err(ProviderError::Rejected {
                        endpoint: "getNFLGamesForPlayer".to_string(),
                        status_code: 400,
                    })
                }
            },
            &no_delay(),
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_doubles() {
        let config = RetryConfig {
            max_attempts: 3,
            initial_delay_ms: 1000,
            backoff_multiplier: 2.0,
            max_delay_ms: 30_000,
        };
        let start = tokio::time::Instant::now();

        let result: Result<(), _> =
            run_with_retry(|| async { Err(unavailable()) }, &config).await;

        assert!(result.is_err());
        // 1s after the first attempt, 2s after the second
        assert_eq!(start.elapsed(), Duration::from_millis(3000));
    }
}
