//! Telemetry metric name constants.
//!
//! Centralised metric names for holdfast operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `holdfast_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `operation` — logical operation name (e.g. a model id or cache op)
//! - `status` — outcome: "ok" or "error"

/// Total retry attempts (not counting the initial request).
///
/// Labels: `operation`.
pub const RETRIES_TOTAL: &str = "holdfast_retries_total";

/// Total operations that hit their timeout budget.
///
/// Labels: `operation`.
pub const TIMEOUTS_TOTAL: &str = "holdfast_timeouts_total";

/// Total AI calls dispatched.
///
/// Labels: `model`, `status` ("ok" | "error").
pub const AI_CALLS_TOTAL: &str = "holdfast_ai_calls_total";

/// AI call duration in seconds, success and failure alike.
///
/// Labels: `model`.
pub const AI_CALL_DURATION_SECONDS: &str = "holdfast_ai_call_duration_seconds";

/// Total AI calls that degraded to the caller-supplied fallback.
///
/// Labels: `model`.
pub const AI_FALLBACKS_TOTAL: &str = "holdfast_ai_fallbacks_total";

/// Total response-cache hits.
///
/// Labels: `kind` ("exact" | "fuzzy").
pub const CACHE_HITS_TOTAL: &str = "holdfast_cache_hits_total";

/// Total response-cache misses.
pub const CACHE_MISSES_TOTAL: &str = "holdfast_cache_misses_total";

/// Total backing-store failures swallowed by the cache (best-effort policy).
///
/// Labels: `operation` ("get" | "set" | "cleanup").
pub const CACHE_ERRORS_TOTAL: &str = "holdfast_cache_errors_total";
