//! Bounded retry with exponential backoff for remote calls.

use std::future::Future;
use std::time::Duration;

use issuegraph_types::{BackoffClass, RemoteError};

use crate::config::RetryConfig;

/// Retry policy applied to every remote call.
///
/// Only failures whose category is transient are retried; permanent ones
/// return immediately. After `max_retries` retries the last error is
/// returned as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    fast_base: Duration,
    normal_base: Duration,
    slow_base: Duration,
    max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            fast_base: Duration::from_millis(config.fast_base_ms),
            normal_base: Duration::from_millis(config.normal_base_ms),
            slow_base: Duration::from_millis(config.slow_base_ms),
            max_backoff: Duration::from_millis(config.max_backoff_ms),
        }
    }

    /// Policy that retries up to `max_retries` times without sleeping.
    #[must_use]
    pub fn without_delay(max_retries: u32) -> Self {
        Self {
            max_retries,
            fast_base: Duration::ZERO,
            normal_base: Duration::ZERO,
            slow_base: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Delay before retry number `attempt` (1-based).
    #[must_use]
    pub fn backoff(&self, err: &RemoteError, attempt: u32) -> Duration {
        if let Some(ms) = err.retry_after_ms {
            return Duration::from_millis(ms).min(self.max_backoff);
        }

        let base = match err.backoff_class() {
            BackoffClass::Fast => self.fast_base,
            BackoffClass::Normal => self.normal_base,
            BackoffClass::Slow => self.slow_base,
        };
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        base.saturating_mul(factor).min(self.max_backoff)
    }

    /// Run `call` until it succeeds, fails permanently, or the retry budget
    /// is spent.
    ///
    /// # Errors
    ///
    /// Returns the last [`RemoteError`] seen.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut call: F) -> Result<T, RemoteError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RemoteError>>,
    {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match call().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt <= self.max_retries => {
                    let delay = self.backoff(&err, attempt);
                    #[allow(clippy::cast_possible_truncation)]
                    let delay_ms = delay.as_millis() as u64;
                    tracing::warn!(
                        operation,
                        attempt,
                        max_retries = self.max_retries,
                        delay_ms,
                        category = %err.category,
                        "Retryable remote error, will retry"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => {
                    if err.is_retryable() {
                        tracing::error!(
                            operation,
                            attempt,
                            max_retries = self.max_retries,
                            category = %err.category,
                            "Max retries exhausted"
                        );
                    } else {
                        tracing::debug!(
                            operation,
                            category = %err.category,
                            "Non-retryable remote error"
                        );
                    }
                    return Err(err);
                }
            }
        }
    }
}
