//! Holdfast error types and the HTTP boundary mapper.
//!
//! [`HoldfastError`] is a closed taxonomy: every variant carries a stable
//! machine-readable code, an HTTP status for the transport boundary, and a
//! retryability classification consumed by [`with_retry`](crate::with_retry).
//!
//! [`handle_error`] is the single place an error becomes a response body.
//! It accepts any `std::error::Error` and never panics.

use std::time::Duration;

use serde_json::{Value, json};

/// Holdfast error types
#[derive(Debug, thiserror::Error)]
pub enum HoldfastError {
    /// Malformed or missing caller input. Never retried.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Missing or rejected credentials. Never retried.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Upstream throttling. Always retryable; `retry_after` (when the
    /// provider sent a `retry-after` header) takes precedence over backoff.
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    /// Upstream call failed or returned an error body. Retryability depends
    /// on the upstream status — see [`is_retryable`](Self::is_retryable).
    #[error("upstream API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Transport-level failure before any status code was available.
    /// Classified by the substring heuristic in `is_retryable`.
    #[error("HTTP error: {0}")]
    Http(String),

    /// An operation exceeded its budget under [`with_timeout`](crate::with_timeout).
    #[error("{label} timed out after {budget:?}")]
    Timeout { label: String, budget: Duration },

    /// The model returned no usable content. Transient upstream issue.
    #[error("empty response from model")]
    EmptyResponse,

    /// The caller required JSON output but the model produced something
    /// else. Retryable — model output is probabilistic and a re-invocation
    /// may yield valid JSON.
    #[error("model output is not valid JSON: {0}")]
    InvalidJson(String),

    /// Unclassified failure.
    #[error("runtime error: {0}")]
    Runtime(String),
}

impl HoldfastError {
    /// Stable machine-readable code, surfaced in boundary responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Authentication(_) => "AUTH_ERROR",
            Self::RateLimited { .. } => "RATE_LIMIT_EXCEEDED",
            Self::Api { .. } => "EXTERNAL_API_ERROR",
            Self::Http(_) => "EXTERNAL_API_ERROR",
            Self::Timeout { .. } => "TIMEOUT",
            Self::EmptyResponse => "EMPTY_RESPONSE",
            Self::InvalidJson(_) => "INVALID_JSON",
            Self::Runtime(_) => "RUNTIME_ERROR",
        }
    }

    /// HTTP status for the transport boundary.
    ///
    /// Upstream failures surface as 502 regardless of the upstream's own
    /// status (that status is carried in `details` instead). Timeout is
    /// generic-flavored and maps to 500.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::Authentication(_) => 401,
            Self::RateLimited { .. } => 429,
            Self::Api { .. } | Self::Http(_) | Self::EmptyResponse | Self::InvalidJson(_) => 502,
            Self::Timeout { .. } | Self::Runtime(_) => 500,
        }
    }

    /// Whether re-invoking the failed operation may succeed.
    ///
    /// Typed variants classify themselves; `Http` falls back to the
    /// substring heuristic since reqwest errors are free text.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited { .. } => true,
            Self::Timeout { .. } => true,
            Self::EmptyResponse => true,
            Self::InvalidJson(_) => true,
            // 402 means credits exhausted — retrying cannot help.
            Self::Api { status: 402, .. } => false,
            Self::Api { status, .. } => matches!(status, 429 | 500 | 502 | 503),
            Self::Http(msg) => message_looks_transient(msg),
            Self::Validation(_) | Self::Authentication(_) | Self::Runtime(_) => false,
        }
    }

    /// Provider-supplied wait hint, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }

    /// Classify an upstream HTTP status into a typed error.
    ///
    /// Used wherever a provider response's status code is interpreted, so
    /// that retry decisions flow through the typed `is_retryable` flag
    /// rather than message matching.
    pub fn from_upstream_status(
        status: u16,
        message: impl Into<String>,
        retry_after: Option<Duration>,
    ) -> Self {
        match status {
            401 | 403 => Self::Authentication(message.into()),
            429 => Self::RateLimited { retry_after },
            _ => Self::Api {
                status,
                message: message.into(),
            },
        }
    }
}

/// Last-resort transience heuristic for free-text error messages.
///
/// Used only when no typed classification exists (raw transport errors).
/// Typed errors carry their own `is_retryable` flag and never reach this.
pub(crate) fn message_looks_transient(message: &str) -> bool {
    let msg = message.to_lowercase();
    [
        "rate limit",
        "timeout",
        "timed out",
        "network",
        "connection reset",
        "429",
        "502",
        "503",
    ]
    .iter()
    .any(|needle| msg.contains(needle))
}

/// Result type alias for holdfast operations
pub type Result<T> = std::result::Result<T, HoldfastError>;

// ============================================================================
// HTTP boundary
// ============================================================================

/// Status + JSON body pair returned by the boundary mapper.
///
/// Transport-agnostic: callers serialize `body` into whatever response type
/// their platform uses, with `status` as the HTTP status code.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorResponse {
    pub status: u16,
    pub body: Value,
}

impl ErrorResponse {
    /// Build the `{success: true, ...}` body used by handlers on success.
    ///
    /// `extra` should be a JSON object; its fields are merged beside
    /// `success`. Non-object values are nested under a `data` key.
    pub fn success(extra: Value) -> Self {
        let body = match extra {
            Value::Object(map) => {
                let mut merged = serde_json::Map::with_capacity(map.len() + 1);
                merged.insert("success".into(), Value::Bool(true));
                merged.extend(map);
                Value::Object(merged)
            }
            other => json!({"success": true, "data": other}),
        };
        Self { status: 200, body }
    }
}

/// Map any error to a boundary response. Never panics.
///
/// Three shapes are handled: a typed [`HoldfastError`] (downcast, full
/// taxonomy mapping), any other `std::error::Error` (500 / `RUNTIME_ERROR`),
/// and — via [`handle_panic`] — a non-error payload (500 / `UNKNOWN_ERROR`).
pub fn handle_error(error: &(dyn std::error::Error + 'static)) -> ErrorResponse {
    match error.downcast_ref::<HoldfastError>() {
        Some(typed) => {
            let mut body = json!({
                "error": typed.to_string(),
                "code": typed.code(),
            });
            // The boundary status for upstream failures is always 502; the
            // upstream's own status travels as structured detail.
            if let HoldfastError::Api { status, .. } = typed {
                body["details"] = json!({"upstream_status": status});
            }
            ErrorResponse {
                status: typed.http_status(),
                body,
            }
        }
        None => ErrorResponse {
            status: 500,
            body: json!({
                "error": error.to_string(),
                "code": "RUNTIME_ERROR",
            }),
        },
    }
}

/// Map a panic payload (or any other non-error thrown value) to a boundary
/// response. Extracts the message when the payload is a string; anything
/// else gets a generic body. Never panics.
pub fn handle_panic(payload: &(dyn std::any::Any + Send)) -> ErrorResponse {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown error".to_string());

    ErrorResponse {
        status: 500,
        body: json!({
            "error": message,
            "code": "UNKNOWN_ERROR",
        }),
    }
}
