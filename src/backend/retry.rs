//! Bounded retry for generate calls.
//!
//! Only transient failures are retried (connect/timeout transport errors,
//! 429 and 5xx statuses); configuration and client errors fail immediately.

use std::time::Duration;

use backoff::ExponentialBackoff;
use backoff::backoff::Backoff;

use crate::backend::Generate;
use crate::error::BackendError;

/// 3 total attempts, base 1s, max 30s between attempts.
pub const MAX_ATTEMPTS: u32 = 3;
const INITIAL_INTERVAL_SECS: u64 = 1;
const MAX_INTERVAL_SECS: u64 = 30;

/// Call `generator.generate`, retrying transient failures with exponential
/// backoff. The last error is wrapped in `RetriesExhausted` when every
/// attempt fails.
pub async fn generate_with_retry(
    generator: &dyn Generate,
    prompt: &str,
    max_tokens: u32,
) -> Result<String, BackendError> {
    let mut backoff = ExponentialBackoff {
        initial_interval: Duration::from_secs(INITIAL_INTERVAL_SECS),
        max_interval: Duration::from_secs(MAX_INTERVAL_SECS),
        max_elapsed_time: None,
        ..Default::default()
    };

    let mut attempts = 0;
    let mut last_error: Option<BackendError> = None;

    while attempts < MAX_ATTEMPTS {
        attempts += 1;

        match generator.generate(prompt, max_tokens).await {
            Ok(text) => return Ok(text),
            Err(e) => {
                if !e.is_transient() {
                    return Err(e);
                }
                last_error = Some(e);
                if attempts < MAX_ATTEMPTS
                    && let Some(wait) = backoff.next_backoff()
                {
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }

    Err(BackendError::RetriesExhausted(Box::new(
        last_error.expect("last_error is set after failed retries"),
    )))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;

    use super::*;

    struct FlakyGenerator {
        calls: AtomicU32,
        succeed_after: u32,
        transient: bool,
    }

    #[async_trait]
    impl Generate for FlakyGenerator {
        async fn generate(&self, _prompt: &str, _max_tokens: u32) -> Result<String, BackendError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n >= self.succeed_after {
                return Ok("feat: recovered".to_string());
            }
            if self.transient {
                Err(BackendError::Status {
                    backend: "fake",
                    status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
                })
            } else {
                Err(BackendError::MissingConfig {
                    backend: "fake",
                    detail: "missing api_key".to_string(),
                })
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_transient_failures() {
        let generator = FlakyGenerator {
            calls: AtomicU32::new(0),
            succeed_after: 2,
            transient: true,
        };
        let out = generate_with_retry(&generator, "p", 64).await.unwrap();
        assert_eq!(out, "feat: recovered");
        assert_eq!(generator.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausts_after_max_attempts() {
        let generator = FlakyGenerator {
            calls: AtomicU32::new(0),
            succeed_after: u32::MAX,
            transient: true,
        };
        let err = generate_with_retry(&generator, "p", 64).await.unwrap_err();
        assert!(matches!(err, BackendError::RetriesExhausted(_)));
        assert_eq!(generator.calls.load(Ordering::SeqCst), MAX_ATTEMPTS);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_errors_fail_immediately() {
        let generator = FlakyGenerator {
            calls: AtomicU32::new(0),
            succeed_after: u32::MAX,
            transient: false,
        };
        let err = generate_with_retry(&generator, "p", 64).await.unwrap_err();
        assert!(matches!(err, BackendError::MissingConfig { .. }));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    }
}
