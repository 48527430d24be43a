//! Retry policy for publish failures.
//!
//! Rate limits, transport errors and server errors are retried with an
//! exponential backoff. Anything else fails immediately.

use std::time::Duration;

use tracing::{debug, warn};

use super::{PostReceipt, PublishError, Publisher};

/// Upper bound for a single backoff delay.
pub const MAX_BACKOFF: Duration = Duration::from_secs(15 * 60);

/// Exponential backoff for the publish boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; zero disables retrying.
    pub max_retries: u32,

    /// Delay before the first retry, doubled for every further retry.
    pub initial_backoff: Duration,

    /// Cap applied to every delay.
    pub max_backoff: Duration,
}

impl RetryPolicy {
    #[must_use]
    pub const fn new(max_retries: u32, initial_backoff: Duration) -> Self {
        Self {
            max_retries,
            initial_backoff,
            max_backoff: MAX_BACKOFF,
        }
    }

    /// Delay before retry number `retry` (1-based).
    #[must_use]
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2_u32.saturating_pow(retry.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }

    /// Delay before retry number `retry` after `error`.
    ///
    /// A server-requested wait wins over the computed backoff but is
    /// still capped.
    #[must_use]
    pub fn delay_after(&self, retry: u32, error: &PublishError) -> Duration {
        error
            .retry_after()
            .map_or_else(|| self.delay_for(retry), |wait| wait.min(self.max_backoff))
    }

    /// Publishes `text`, retrying retryable failures.
    ///
    /// # Errors
    ///
    /// Returns the last error once it is not retryable or retries are
    /// exhausted.
    pub async fn publish<P: Publisher>(
        &self,
        publisher: &P,
        text: &str,
    ) -> Result<PostReceipt, PublishError> {
        let mut retry = 0;
        loop {
            match publisher.post(text).await {
                Ok(receipt) => return Ok(receipt),
                Err(e) if e.is_retryable() && retry < self.max_retries => {
                    retry += 1;
                    let delay = self.delay_after(retry, &e);
                    warn!(
                        "Publish failed ({}), retry {}/{} in {:?}",
                        e, retry, self.max_retries, delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    debug!("Publish failed after {} retries", retry);
                    return Err(e);
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(30))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    /// Publisher that replays scripted outcomes.
    struct ScriptedPublisher {
        outcomes: Mutex<VecDeque<Option<u16>>>,
        calls: Mutex<u32>,
    }

    impl ScriptedPublisher {
        /// `None` succeeds, `Some(status)` fails with that API status.
        fn new(outcomes: &[Option<u16>]) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.iter().copied().collect()),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    impl Publisher for ScriptedPublisher {
        async fn post(&self, text: &str) -> Result<PostReceipt, PublishError> {
            *self.calls.lock().unwrap() += 1;
            let outcome = self.outcomes.lock().unwrap().pop_front().flatten();
            match outcome {
                None => Ok(PostReceipt {
                    id: "1".to_owned(),
                    text: text.to_owned(),
                }),
                Some(429) => Err(PublishError::RateLimited { retry_after: None }),
                Some(status) => Err(PublishError::Api {
                    status,
                    body: String::new(),
                }),
            }
        }
    }

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy::new(max_retries, Duration::from_millis(1))
    }

    #[test]
    fn test_delay_doubles_and_caps() {
        let policy = RetryPolicy::new(5, Duration::from_secs(30));
        assert_eq!(policy.delay_for(1), Duration::from_secs(30));
        assert_eq!(policy.delay_for(2), Duration::from_secs(60));
        assert_eq!(policy.delay_for(3), Duration::from_secs(120));
        assert_eq!(policy.delay_for(40), MAX_BACKOFF);
    }

    #[test]
    fn test_server_wait_wins() {
        let policy = RetryPolicy::new(3, Duration::from_secs(1));
        let err = PublishError::RateLimited {
            retry_after: Some(Duration::from_secs(90)),
        };
        assert_eq!(policy.delay_after(1, &err), Duration::from_secs(90));

        let capped = RetryPolicy {
            max_backoff: Duration::from_secs(10),
            ..policy
        };
        assert_eq!(capped.delay_after(1, &err), Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let publisher = ScriptedPublisher::new(&[Some(503), Some(429), None]);
        let receipt = fast_policy(3).publish(&publisher, "dish").await.unwrap();
        assert_eq!(receipt.text, "dish");
        assert_eq!(publisher.calls(), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let publisher = ScriptedPublisher::new(&[Some(500), Some(500), Some(500)]);
        let err = fast_policy(1).publish(&publisher, "dish").await.unwrap_err();
        assert!(matches!(err, PublishError::Api { status: 500, .. }));
        assert_eq!(publisher.calls(), 2);
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let publisher = ScriptedPublisher::new(&[Some(403), None]);
        let err = fast_policy(3).publish(&publisher, "dish").await.unwrap_err();
        assert!(matches!(err, PublishError::Api { status: 403, .. }));
        assert_eq!(publisher.calls(), 1);
    }

    #[tokio::test]
    async fn test_no_retry_policy() {
        let publisher = ScriptedPublisher::new(&[Some(503), None]);
        assert!(RetryPolicy::new(0, Duration::ZERO).publish(&publisher, "dish").await.is_err());
        assert_eq!(publisher.calls(), 1);
    }
}
