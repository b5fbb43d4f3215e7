use std::future::Future;
use std::time::Duration;

use cryptopulse_models::UpstreamConfig;
use tracing::{debug, warn};

/// Fixed-attempt, fixed-delay retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Pause between a failed attempt and the next one.
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    pub fn from_config(config: &UpstreamConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.retry_delay_ms),
        )
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

/// Runs `operation` until it succeeds or `policy.max_attempts` is reached.
///
/// The error of the final attempt is returned unchanged.
pub async fn with_retry<F, Fut, T, E>(
    policy: &RetryPolicy,
    name: &str,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt >= max_attempts => {
                warn!(operation = name, attempts = attempt, error = %err, "Giving up");
                return Err(err);
            }
            Err(err) => {
                debug!(
                    operation = name,
                    attempt,
                    max_attempts,
                    error = %err,
                    "Attempt failed, retrying"
                );
                attempt += 1;
                tokio::time::sleep(policy.delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_transient_failures() {
        let calls = &AtomicU32::new(0);
        let policy = RetryPolicy::default();
        let started = tokio::time::Instant::now();

        let result: Result<u32, String> = with_retry(&policy, "flaky", || async move {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n < 3 {
                Err(format!("failure {n}"))
            } else {
                Ok(n)
            }
        })
        .await;

        assert_eq!(result, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // Two fixed one-second pauses between three attempts
        assert_eq!(started.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn propagates_final_error() {
        let calls = &AtomicU32::new(0);
        let policy = RetryPolicy::default();

        let result: Result<(), String> = with_retry(&policy, "down", || async move {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            Err(format!("failure {n}"))
        })
        .await;

        assert_eq!(result, Err("failure 3".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn single_attempt_does_not_sleep() {
        let calls = &AtomicU32::new(0);
        let policy = RetryPolicy::new(1, Duration::from_secs(3600));

        let result: Result<(), &str> = with_retry(&policy, "once", || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err("nope")
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn zero_attempts_means_one() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts, 1);
        let from_config = RetryPolicy::from_config(&UpstreamConfig::default());
        assert_eq!(from_config, RetryPolicy::default());
    }
}
