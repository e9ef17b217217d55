//! Retry configuration, backoff calculation, and the `with_retry` helper.
//!
//! Provides [`RetryConfig`] for controlling retry behaviour and the shared
//! [`with_retry`] helper that re-invokes an async operation on retryable
//! failures, keeping retry logic in a single place.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tracing::{error, warn};

use crate::error::{HoldfastError, Result};
use crate::telemetry;

/// Predicate deciding whether a given error is worth another attempt.
pub type RetryPredicate = dyn Fn(&HoldfastError) -> bool + Send + Sync;

/// Fraction of the exponential component added as random jitter (exclusive).
const JITTER_FRACTION: f64 = 0.3;

/// Configuration for retry behaviour on transient errors.
///
/// Uses exponential backoff with jitter. Start from a preset and override
/// what the call site needs:
///
/// ```rust
/// # use holdfast::RetryConfig;
/// # use std::time::Duration;
/// let config = RetryConfig::standard()
///     .max_retries(5)
///     .base_delay(Duration::from_millis(200));
/// ```
#[derive(Clone)]
pub struct RetryConfig {
    /// Retries beyond the initial attempt. 0 = single attempt. Default: 3.
    pub max_retries: u32,
    /// Base delay before the first retry. Default: 500ms.
    pub base_delay: Duration,
    /// Maximum delay between retries (caps exponential growth). Default: 10s.
    pub max_delay: Duration,
    /// Whether to add random jitter to delays. Default: true.
    pub jitter: bool,
    should_retry: Option<Arc<RetryPredicate>>,
}

impl std::fmt::Debug for RetryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryConfig")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .field("jitter", &self.jitter)
            .field("should_retry", &self.should_retry.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::standard()
    }
}

impl RetryConfig {
    /// Create a new config with the standard preset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Low-latency preset for interactive paths: 2 retries, short delays.
    pub fn fast() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(2),
            jitter: true,
            should_retry: None,
        }
    }

    /// Balanced preset, the default: 3 retries, 500ms base, 10s cap.
    pub fn standard() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            jitter: true,
            should_retry: None,
        }
    }

    /// Patient preset for background jobs: 5 retries, up to 30s between.
    pub fn aggressive() -> Self {
        Self {
            max_retries: 5,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            jitter: true,
            should_retry: None,
        }
    }

    /// Create a config that disables retries (single attempt).
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Self::standard()
        }
    }

    /// Set the number of retries beyond the initial attempt.
    pub fn max_retries(mut self, n: u32) -> Self {
        self.max_retries = n;
        self
    }

    /// Set the base delay before the first retry.
    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Set the maximum delay between retries.
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Enable or disable jitter.
    pub fn jitter(mut self, enabled: bool) -> Self {
        self.jitter = enabled;
        self
    }

    /// Override the retry predicate.
    ///
    /// Without an override, [`default_should_retry`] is consulted.
    pub fn should_retry<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&HoldfastError) -> bool + Send + Sync + 'static,
    {
        self.should_retry = Some(Arc::new(predicate));
        self
    }

    /// Whether this config considers `error` worth another attempt.
    pub fn classify(&self, error: &HoldfastError) -> bool {
        match &self.should_retry {
            Some(predicate) => predicate(error),
            None => default_should_retry(error),
        }
    }

    /// Unjittered backoff for a given attempt number (0-indexed).
    ///
    /// Exponential: `base_delay * 2^attempt`, capped at `max_delay`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self.base_delay.saturating_mul(2u32.saturating_pow(attempt));
        delay.min(self.max_delay)
    }

    /// Full delay calculation: exponential component, plus 0–30% jitter
    /// when enabled, capped at `max_delay`. A provider `retry_after` hint
    /// (from a `RateLimited` error) takes precedence over all of it.
    pub fn effective_delay(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        if let Some(hint) = retry_after {
            return hint;
        }
        let exponential = self.base_delay.saturating_mul(2u32.saturating_pow(attempt));
        let jittered = if self.jitter {
            exponential.mul_f64(1.0 + rand::thread_rng().gen_range(0.0..JITTER_FRACTION))
        } else {
            exponential
        };
        jittered.min(self.max_delay)
    }
}

/// Default retry classifier.
///
/// Consults the error's own [`is_retryable`](HoldfastError::is_retryable)
/// flag. The free-text substring heuristic lives inside that flag (for the
/// `Http` variant only), so typed and heuristic classification cannot drift
/// apart — there is exactly one classifier.
pub fn default_should_retry(error: &HoldfastError) -> bool {
    error.is_retryable()
}

/// Execute an async operation with retry logic.
///
/// Attempts `f` up to `config.max_retries + 1` times. After a failure the
/// config's predicate is consulted; non-retryable errors are returned
/// immediately. After exhausting all attempts the *last* error is returned.
///
/// Attempts are strictly sequential — each fully completes before the next
/// begins, so the retry loop itself never issues concurrent duplicates.
pub async fn with_retry<F, Fut, T>(config: &RetryConfig, operation: &str, f: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = config.max_retries + 1;
    let mut last_err = None;

    for attempt in 0..max_attempts {
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) if config.classify(&e) => {
                metrics::counter!(telemetry::RETRIES_TOTAL, "operation" => operation.to_owned())
                    .increment(1);
                if attempt + 1 < max_attempts {
                    let delay = config.effective_delay(attempt, e.retry_after());
                    warn!(
                        operation,
                        attempt = attempt + 1,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "retrying after transient error"
                    );
                    tokio::time::sleep(delay).await;
                }
                last_err = Some(e);
            }
            Err(e) => return Err(e), // permanent error, no retry
        }
    }

    let err = last_err.unwrap_or_else(|| HoldfastError::Runtime("retry loop ran zero attempts".into()));
    error!(operation, max_attempts, error = %err, "all retry attempts exhausted");
    Err(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unjittered_delay_doubles_per_attempt() {
        let config = RetryConfig::standard()
            .base_delay(Duration::from_millis(100))
            .max_delay(Duration::from_secs(60));
        assert_eq!(config.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(200));
        assert_eq!(config.delay_for_attempt(2), Duration::from_millis(400));
        assert_eq!(config.delay_for_attempt(3), Duration::from_millis(800));
    }

    #[test]
    fn delay_clamped_at_max() {
        let config = RetryConfig::standard()
            .base_delay(Duration::from_millis(500))
            .max_delay(Duration::from_secs(2));
        assert_eq!(config.delay_for_attempt(10), Duration::from_secs(2));
    }

    #[test]
    fn jitter_stays_within_thirty_percent() {
        let config = RetryConfig::standard()
            .base_delay(Duration::from_millis(100))
            .max_delay(Duration::from_secs(60));
        for _ in 0..100 {
            let d = config.effective_delay(2, None);
            assert!(d >= Duration::from_millis(400));
            assert!(d < Duration::from_millis(520));
        }
    }

    #[test]
    fn retry_after_hint_overrides_backoff() {
        let config = RetryConfig::standard().base_delay(Duration::from_millis(1));
        let hint = Duration::from_secs(7);
        assert_eq!(config.effective_delay(0, Some(hint)), hint);
    }

    #[test]
    fn custom_predicate_overrides_default() {
        let config = RetryConfig::standard().should_retry(|_| false);
        assert!(!config.classify(&HoldfastError::RateLimited { retry_after: None }));
    }
}
