use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Fixed-delay bounded retry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

/// Every attempt failed; carries the last failure
#[derive(Debug, Clone, PartialEq)]
pub struct Exhausted<E> {
    pub attempts: u32,
    pub last: E,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self { max_attempts, delay }
    }

    /// Run `op` until it succeeds or the attempt budget is spent.
    ///
    /// `op` receives the 1-based attempt number. The delay is applied between
    /// attempts only, never after the last one. A budget of zero still makes
    /// one attempt.
    pub async fn run<T, E, F, Fut>(&self, mut op: F) -> Result<T, Exhausted<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match op(attempt).await {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::info!(attempt, "succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(e) if attempt < max_attempts => {
                    tracing::warn!(attempt, max_attempts, error = %e, "attempt failed, retrying");
                    tokio::time::sleep(self.delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "attempt failed, giving up");
                    return Err(Exhausted { attempts: attempt, last: e });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Instant;

    fn fast(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::from_millis(5))
    }

    #[tokio::test]
    async fn test_first_success_makes_one_call() {
        let calls = AtomicU32::new(0);
        let result: Result<&str, Exhausted<String>> = fast(3)
            .run(|_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok("ok") }
            })
            .await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_succeeds_on_third_attempt() {
        let calls = AtomicU32::new(0);
        let result = fast(3)
            .run(|attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt < 3 {
                        Err(format!("fail {}", attempt))
                    } else {
                        Ok(attempt)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhausted_reports_last_error() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = fast(3)
            .run(|attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move { Err(format!("fail {}", attempt)) }
            })
            .await;

        let exhausted = result.unwrap_err();
        assert_eq!(exhausted.attempts, 3);
        assert_eq!(exhausted.last, "fail 3");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_delay_between_attempts() {
        let policy = RetryPolicy::new(3, Duration::from_millis(20));
        let start = Instant::now();
        let _: Result<(), _> = policy.run(|_| async { Err("no") }).await;

        // two gaps, none after the final attempt
        assert!(start.elapsed() >= Duration::from_millis(40));
    }

    #[tokio::test]
    async fn test_zero_budget_still_attempts_once() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = fast(0)
            .run(|_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err("no") }
            })
            .await;

        assert_eq!(result.unwrap_err().attempts, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
