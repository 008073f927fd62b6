//! Bounded retry-with-delay around a fallible async operation.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::warn;

use crate::config::RetryConfig;
use crate::error::{AttemptRecord, RetryError};

/// Successful outcome of a retried operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Retried<T> {
    /// Value returned by the successful attempt.
    pub value: T,
    /// Attempts made, including the successful one.
    pub attempts: usize,
    /// Failed attempts that preceded the success.
    pub history: Vec<AttemptRecord>,
}

/// Runs an operation up to `max_attempts` times, sleeping `delay` between
/// attempts. Which failures are worth another attempt is decided by the
/// caller-supplied classifier, so the policy knows nothing about error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: usize,
    delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    /// Creates a policy. A `max_attempts` of zero is treated as one.
    #[must_use]
    pub fn new(max_attempts: usize, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Creates a policy from configuration.
    #[must_use]
    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.max_attempts, config.delay)
    }

    /// Maximum number of attempts.
    #[must_use]
    pub const fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Wait between two attempts.
    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    /// Runs `operation` until it succeeds, fails with an error `is_retryable`
    /// rejects, or the attempt budget is spent.
    ///
    /// # Errors
    ///
    /// Returns `RetryError::Fatal` for a non-retryable failure and
    /// `RetryError::Exhausted` with the last error once all attempts failed.
    pub async fn run<T, E, F, Fut, C>(
        &self,
        mut operation: F,
        is_retryable: C,
    ) -> Result<Retried<T>, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        C: Fn(&E) -> bool,
        E: Display,
    {
        let start = Instant::now();
        let mut history: Vec<AttemptRecord> = Vec::new();
        let mut attempt = 1;

        loop {
            let error = match operation().await {
                Ok(value) => {
                    return Ok(Retried {
                        value,
                        attempts: attempt,
                        history,
                    });
                }
                Err(error) => error,
            };

            history.push(AttemptRecord {
                attempt_number: attempt,
                error: error.to_string(),
                elapsed: start.elapsed(),
            });

            if !is_retryable(&error) {
                return Err(RetryError::Fatal {
                    error,
                    attempts: attempt,
                    history,
                });
            }

            if attempt >= self.max_attempts {
                return Err(RetryError::Exhausted {
                    last_error: error,
                    attempts: attempt,
                    history,
                });
            }

            warn!(
                attempt,
                max_attempts = self.max_attempts,
                delay_ms = u64::try_from(self.delay.as_millis()).unwrap_or(u64::MAX),
                error = %error,
                "Attempt failed, retrying"
            );
            tokio::time::sleep(self.delay).await;
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use vlm_gemini::VisionError;

    fn transient(err: &VisionError) -> bool {
        err.is_transient()
    }

    #[tokio::test(start_paused = true)]
    async fn test_network_twice_then_success() {
        let calls = Cell::new(0);
        let policy = RetryPolicy::new(3, Duration::from_secs(1));

        let outcome = policy
            .run(
                || {
                    calls.set(calls.get() + 1);
                    let n = calls.get();
                    async move {
                        if n < 3 {
                            Err(VisionError::Network("connection reset".into()))
                        } else {
                            Ok("text")
                        }
                    }
                },
                transient,
            )
            .await
            .unwrap();

        assert_eq!(outcome.value, "text");
        assert_eq!(outcome.attempts, 3);
        assert_eq!(outcome.history.len(), 2);
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_always_rate_limited_exhausts_with_two_delays() {
        let calls = Cell::new(0);
        let delay = Duration::from_secs(1);
        let policy = RetryPolicy::new(3, delay);
        let start = Instant::now();

        let err = policy
            .run(
                || {
                    calls.set(calls.get() + 1);
                    async { Err::<(), _>(VisionError::RateLimit("quota".into())) }
                },
                transient,
            )
            .await
            .unwrap_err();

        assert!(err.is_exhausted());
        assert_eq!(err.attempts(), 3);
        assert_eq!(calls.get(), 3);
        assert!(matches!(err.last_error(), VisionError::RateLimit(_)));
        let waited = start.elapsed();
        assert!(waited >= delay * 2, "expected two delays, waited {waited:?}");
        assert!(waited < delay * 3, "expected two delays, waited {waited:?}");

        let numbers: Vec<usize> = err.history().iter().map(|r| r.attempt_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_auth_error_not_retried() {
        let calls = Cell::new(0);
        let policy = RetryPolicy::new(3, Duration::from_secs(1));
        let start = Instant::now();

        let err = policy
            .run(
                || {
                    calls.set(calls.get() + 1);
                    async { Err::<(), _>(VisionError::Auth("API key not valid".into())) }
                },
                transient,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, RetryError::Fatal { attempts: 1, .. }));
        assert!(matches!(err.last_error(), VisionError::Auth(_)));
        assert_eq!(calls.get(), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_attempts_treated_as_one() {
        let calls = Cell::new(0);
        let policy = RetryPolicy::new(0, Duration::from_secs(1));
        assert_eq!(policy.max_attempts(), 1);

        let err = policy
            .run(
                || {
                    calls.set(calls.get() + 1);
                    async { Err::<(), _>(VisionError::Network("down".into())) }
                },
                transient,
            )
            .await
            .unwrap_err();

        assert!(err.is_exhausted());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.delay(), Duration::from_secs(1));
    }
}
