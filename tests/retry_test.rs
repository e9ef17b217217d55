//! Tests for [`with_retry`] attempt bounds, classification, and backoff.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use holdfast::{HoldfastError, RetryConfig, with_retry};

/// Shared attempt counter for closures under test.
fn counter() -> Arc<AtomicU32> {
    Arc::new(AtomicU32::new(0))
}

#[tokio::test]
async fn retries_transient_error_then_succeeds() {
    let calls = counter();
    let calls_inner = calls.clone();

    let config = RetryConfig::standard()
        .max_retries(3)
        .base_delay(Duration::from_millis(1))
        .jitter(false);

    let result = with_retry(&config, "test", move || {
        let calls = calls_inner.clone();
        async move {
            let attempt = calls.fetch_add(1, Ordering::Relaxed);
            if attempt < 2 {
                Err(HoldfastError::RateLimited { retry_after: None })
            } else {
                Ok("ok")
            }
        }
    })
    .await;

    assert_eq!(result.unwrap(), "ok");
    assert_eq!(calls.load(Ordering::Relaxed), 3); // 2 failures + 1 success
}

#[tokio::test]
async fn invokes_exactly_max_retries_plus_one_times() {
    let calls = counter();
    let calls_inner = calls.clone();

    let config = RetryConfig::standard()
        .max_retries(3)
        .base_delay(Duration::from_millis(1))
        .jitter(false);

    let result: holdfast::Result<()> = with_retry(&config, "test", move || {
        let calls = calls_inner.clone();
        async move {
            calls.fetch_add(1, Ordering::Relaxed);
            Err(HoldfastError::Api {
                status: 503,
                message: "unavailable".into(),
            })
        }
    })
    .await;

    assert!(result.is_err());
    assert_eq!(calls.load(Ordering::Relaxed), 4); // max_retries + 1
}

#[tokio::test]
async fn surfaces_the_last_error_not_the_first() {
    let calls = counter();
    let calls_inner = calls.clone();

    let config = RetryConfig::standard()
        .max_retries(2)
        .base_delay(Duration::from_millis(1))
        .jitter(false);

    // Each attempt fails with a distinct message so the surfaced error
    // identifies which invocation produced it.
    let result: holdfast::Result<()> = with_retry(&config, "test", move || {
        let calls = calls_inner.clone();
        async move {
            let attempt = calls.fetch_add(1, Ordering::Relaxed);
            Err(HoldfastError::Api {
                status: 503,
                message: format!("attempt {attempt}"),
            })
        }
    })
    .await;

    match result.unwrap_err() {
        HoldfastError::Api { message, .. } => assert_eq!(message, "attempt 2"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn does_not_retry_permanent_errors() {
    let calls = counter();
    let calls_inner = calls.clone();

    let config = RetryConfig::standard().max_retries(5);

    let result: holdfast::Result<()> = with_retry(&config, "test", move || {
        let calls = calls_inner.clone();
        async move {
            calls.fetch_add(1, Ordering::Relaxed);
            Err(HoldfastError::Authentication("bad key".into()))
        }
    })
    .await;

    assert!(result.is_err());
    assert_eq!(calls.load(Ordering::Relaxed), 1); // no retry
}

#[tokio::test]
async fn predicate_false_short_circuits() {
    let calls = counter();
    let calls_inner = calls.clone();

    let config = RetryConfig::standard()
        .max_retries(5)
        .should_retry(|_| false);

    let result: holdfast::Result<()> = with_retry(&config, "test", move || {
        let calls = calls_inner.clone();
        async move {
            calls.fetch_add(1, Ordering::Relaxed);
            // retryable by default classification, vetoed by the predicate
            Err(HoldfastError::RateLimited { retry_after: None })
        }
    })
    .await;

    assert!(result.is_err());
    assert_eq!(calls.load(Ordering::Relaxed), 1);
}

#[tokio::test]
async fn disabled_config_single_attempt() {
    let calls = counter();
    let calls_inner = calls.clone();

    let result: holdfast::Result<()> = with_retry(&RetryConfig::disabled(), "test", move || {
        let calls = calls_inner.clone();
        async move {
            calls.fetch_add(1, Ordering::Relaxed);
            Err(HoldfastError::RateLimited { retry_after: None })
        }
    })
    .await;

    assert!(result.is_err());
    assert_eq!(calls.load(Ordering::Relaxed), 1);
}

#[tokio::test]
async fn respects_retry_after_hint() {
    let calls = counter();
    let calls_inner = calls.clone();

    let config = RetryConfig::standard()
        .max_retries(1)
        .base_delay(Duration::from_millis(1))
        .jitter(false);

    let start = std::time::Instant::now();
    let result = with_retry(&config, "test", move || {
        let calls = calls_inner.clone();
        async move {
            if calls.fetch_add(1, Ordering::Relaxed) == 0 {
                Err(HoldfastError::RateLimited {
                    retry_after: Some(Duration::from_millis(50)),
                })
            } else {
                Ok(())
            }
        }
    })
    .await;
    let elapsed = start.elapsed();

    assert!(result.is_ok());
    // Should have waited the hinted 50ms, not the 1ms backoff
    assert!(elapsed >= Duration::from_millis(40)); // some tolerance
}

// ============================================================================
// Preset sanity
// ============================================================================

#[test]
fn presets_scale_from_fast_to_aggressive() {
    let fast = RetryConfig::fast();
    let standard = RetryConfig::standard();
    let aggressive = RetryConfig::aggressive();

    assert!(fast.max_retries < aggressive.max_retries);
    assert!(fast.max_delay < standard.max_delay);
    assert!(standard.max_delay < aggressive.max_delay);
    assert!(standard.base_delay >= Duration::from_millis(1));
}
