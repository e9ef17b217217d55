//! Deadline enforcement for arbitrary async operations.
//!
//! [`with_timeout`] races a future against a budget and fails with a typed
//! [`HoldfastError::Timeout`] when the budget elapses first. Budgets for
//! common call classes live in [`budget`].
//!
//! # Cancellation
//!
//! On timeout the raced future is dropped, which cancels it at its next
//! suspension point. A request already accepted by a remote service may
//! still complete there — side effects from such abandoned operations are
//! the caller's responsibility to tolerate (idempotent writes or harmless
//! duplication). The caller-observable contract is unconditional: the typed
//! timeout error is returned within the budget.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::{HoldfastError, Result};
use crate::telemetry;

/// Named timeout budgets for common call classes.
///
/// Values assume an edge-style execution environment with a hard platform
/// cap near the two-minute mark; `LONG` is deliberately held at 55s so an
/// AI call exhausts its own budget before the platform kills the handler.
pub mod budget {
    use std::time::Duration;

    /// Database RPC, cache lookups, quick third-party calls.
    pub const QUICK: Duration = Duration::from_secs(15);
    /// Ordinary external API calls.
    pub const STANDARD: Duration = Duration::from_secs(45);
    /// AI completions — the longest budget a single handler should spend.
    pub const LONG: Duration = Duration::from_secs(55);
    /// Background jobs with no interactive caller waiting.
    pub const CRITICAL: Duration = Duration::from_secs(120);
}

/// Race `operation` against `budget`.
///
/// Resolves with the operation's own outcome when it settles first. When
/// the budget elapses first, returns [`HoldfastError::Timeout`] carrying
/// `label` (so logs and boundary responses name the operation that stalled)
/// and drops the operation. The internal timer is cleaned up either way.
pub async fn with_timeout<Fut, T>(operation: Fut, budget: Duration, label: &str) -> Result<T>
where
    Fut: Future<Output = Result<T>>,
{
    match tokio::time::timeout(budget, operation).await {
        Ok(outcome) => outcome,
        Err(_elapsed) => {
            metrics::counter!(telemetry::TIMEOUTS_TOTAL, "operation" => label.to_owned())
                .increment(1);
            warn!(
                operation = label,
                budget_ms = budget.as_millis() as u64,
                "operation timed out"
            );
            Err(HoldfastError::Timeout {
                label: label.to_string(),
                budget,
            })
        }
    }
}
