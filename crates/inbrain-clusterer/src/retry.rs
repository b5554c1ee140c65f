//! Retry with exponential back-off and jitter for the clustering client.

use std::future::Future;
use std::time::Duration;

use rand::Rng;

use crate::error::ClustererError;

/// Returns `true` for errors that are worth retrying after a back-off delay:
/// timeouts, connection failures, 5xx, and 429 rate limiting. Request,
/// parse, and content errors are returned immediately.
pub(crate) fn is_retriable(err: &ClustererError) -> bool {
    match err {
        ClustererError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        ClustererError::Api { status, .. } => *status == 429 || *status >= 500,
        ClustererError::Deserialize { .. }
        | ClustererError::InvalidRequest(_)
        | ClustererError::NotEnoughComments { .. }
        | ClustererError::NoClustersProduced => false,
    }
}

const MAX_DELAY_MS: u64 = 60_000;

/// Delay before retry number `attempt` (1-based): `backoff_base_ms` doubled
/// per attempt, capped at 60 s, then scaled by a random factor in 0.75..=1.25.
fn backoff_delay(attempt: u32, backoff_base_ms: u64) -> Duration {
    let exponent = attempt.saturating_sub(1).min(10);
    let capped = backoff_base_ms
        .saturating_mul(1u64 << exponent)
        .min(MAX_DELAY_MS);
    let jitter = rand::rng().random_range(0.75..=1.25);
    Duration::from_millis(capped).mul_f64(jitter)
}

/// Runs `operation` with up to `max_retries` additional attempts on transient
/// errors, sleeping [`backoff_delay`] between attempts.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, ClustererError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ClustererError>>,
{
    let mut attempt = 0u32;
    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if !is_retriable(&err) || attempt >= max_retries => return Err(err),
            Err(err) => err,
        };
        attempt += 1;
        let delay = backoff_delay(attempt, backoff_base_ms);
        tracing::warn!(
            attempt,
            max_retries,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            error = %err,
            "clustering service transient error, retrying after back-off"
        );
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::*;

    fn api_err(status: u16) -> ClustererError {
        ClustererError::Api {
            status,
            body: String::new(),
        }
    }

    #[test]
    fn rate_limit_and_server_errors_are_retriable() {
        assert!(is_retriable(&api_err(429)));
        assert!(is_retriable(&api_err(503)));
    }

    #[test]
    fn client_errors_are_not_retriable() {
        assert!(!is_retriable(&api_err(400)));
        assert!(!is_retriable(&api_err(401)));
        assert!(!is_retriable(&ClustererError::NoClustersProduced));
    }

    #[test]
    fn deserialize_error_is_not_retriable() {
        let source = serde_json::from_str::<()>("invalid").unwrap_err();
        assert!(!is_retriable(&ClustererError::Deserialize {
            context: "test".to_owned(),
            source,
        }));
    }

    #[test]
    fn backoff_doubles_within_jitter_and_caps() {
        for (attempt, nominal) in [(1, 100), (2, 200), (4, 800)] {
            let delay = backoff_delay(attempt, 100);
            assert!(delay >= Duration::from_millis(nominal * 7 / 10), "attempt {attempt}");
            assert!(delay <= Duration::from_millis(nominal * 13 / 10), "attempt {attempt}");
        }
        assert!(backoff_delay(30, 10_000) <= Duration::from_millis(MAX_DELAY_MS * 13 / 10));
        assert_eq!(backoff_delay(3, 0), Duration::ZERO);
    }

    #[tokio::test]
    async fn retries_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                let attempt = c.fetch_add(1, Ordering::SeqCst) + 1;
                if attempt < 3 {
                    Err(api_err(502))
                } else {
                    Ok(7)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(2, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(api_err(429))
            }
        })
        .await;
        assert!(matches!(result, Err(ClustererError::Api { status: 429, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn does_not_retry_bad_request() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(api_err(400))
            }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
