//! Tests for metrics emission.
//!
//! Uses `metrics_util::debugging::DebuggingRecorder` to capture and assert
//! on emitted metrics without needing a real exporter.

use std::sync::Arc;
use std::time::Duration;

use metrics_util::MetricKind;
use metrics_util::debugging::{DebugValue, DebuggingRecorder};

use holdfast::{
    CacheConfig, HoldfastError, MemoryStore, ResponseCache, RetryConfig, telemetry, with_retry,
    with_timeout,
};

// ============================================================================
// Snapshot type alias for readability
// ============================================================================

type SnapshotVec = Vec<(
    metrics_util::CompositeKey,
    Option<metrics::Unit>,
    Option<metrics::SharedString>,
    DebugValue,
)>;

// ============================================================================
// Helpers
// ============================================================================

/// Sum all counter values matching a given metric name.
fn counter_total(snapshot: &SnapshotVec, name: &str) -> u64 {
    snapshot
        .iter()
        .filter(|(key, _, _, _)| key.kind() == MetricKind::Counter && key.key().name() == name)
        .map(|(_, _, _, value)| match value {
            DebugValue::Counter(v) => *v,
            _ => 0,
        })
        .sum()
}

/// Sum counter values matching a metric name and a label pair.
fn counter_with_label(snapshot: &SnapshotVec, name: &str, label: &str, value: &str) -> u64 {
    snapshot
        .iter()
        .filter(|(key, _, _, _)| {
            key.kind() == MetricKind::Counter
                && key.key().name() == name
                && key
                    .key()
                    .labels()
                    .any(|l| l.key() == label && l.value() == value)
        })
        .map(|(_, _, _, v)| match v {
            DebugValue::Counter(c) => *c,
            _ => 0,
        })
        .sum()
}

// ============================================================================
// Tests
// ============================================================================

/// Runs async code within a local recorder scope on the multi-thread runtime.
///
/// `block_in_place` ensures the sync `with_local_recorder` closure stays
/// on the current thread while `block_on` drives the inner async work.
#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn retries_are_counted() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    let result = metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let config = RetryConfig::standard()
                    .max_retries(2)
                    .base_delay(Duration::from_millis(1))
                    .jitter(false);
                with_retry(&config, "flaky_op", || async {
                    Err::<(), _>(HoldfastError::RateLimited { retry_after: None })
                })
                .await
            })
        })
    });
    assert!(result.is_err());

    let snapshot = snapshotter.snapshot().into_vec();
    let count = counter_total(&snapshot, telemetry::RETRIES_TOTAL);
    assert_eq!(count, 3, "expected one increment per retryable failure");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn timeouts_are_counted() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    let result = metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                with_timeout::<_, ()>(
                    std::future::pending(),
                    Duration::from_millis(10),
                    "stalled_op",
                )
                .await
            })
        })
    });
    assert!(result.is_err());

    let snapshot = snapshotter.snapshot().into_vec();
    let count = counter_total(&snapshot, telemetry::TIMEOUTS_TOTAL);
    assert_eq!(count, 1, "expected 1 timeout counter");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn cache_hits_and_misses_are_labelled() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let cache = ResponseCache::new(Arc::new(MemoryStore::new()), CacheConfig::new());
                cache
                    .set("8kW shower cable run", "10mm2.", serde_json::json!([]), 0.9, None)
                    .await;
                // exact hit, then a miss
                assert!(cache.get("8kW shower cable run", None).await.is_some());
                assert!(cache.get("completely unrelated topic", None).await.is_none());
            })
        })
    });

    let snapshot = snapshotter.snapshot().into_vec();
    assert_eq!(
        counter_with_label(&snapshot, telemetry::CACHE_HITS_TOTAL, "kind", "exact"),
        1
    );
    assert_eq!(counter_total(&snapshot, telemetry::CACHE_MISSES_TOTAL), 1);
}

#[tokio::test]
async fn metrics_are_noop_without_recorder() {
    // Verify no panics when no recorder is installed.
    let config = RetryConfig::disabled();
    let _result: holdfast::Result<()> = with_retry(&config, "noop", || async {
        Err(HoldfastError::EmptyResponse)
    })
    .await;
}
