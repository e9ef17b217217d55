//! Holdfast — resilient remote-call toolkit.
//!
//! This crate provides the shared resilience layer for handlers that talk
//! to unreliable external services: a timeout guard, a retry policy with
//! exponential backoff and jitter, a typed error taxonomy with an HTTP
//! boundary mapper, a model-agnostic AI call wrapper, and a canonicalizing
//! response cache that short-circuits expensive calls.
//!
//! # AI call example
//!
//! ```rust,no_run
//! use holdfast::{AiCallOptions, AiClient, ResponseFormat};
//!
//! #[tokio::main]
//! async fn main() -> holdfast::Result<()> {
//!     let client = AiClient::new();
//!
//!     let options = AiCallOptions::new(
//!         "google/gemini-2.5-flash",
//!         "What cable size suits an 8.5kW shower on an 8m run?",
//!     )
//!     .system_prompt("You are an electrical regulations assistant.")
//!     .temperature(0.2)
//!     .response_format(ResponseFormat::JsonObject)
//!     .require_json(true);
//!
//!     let result = client.call("sk-your-key", &options).await?;
//!     println!("{}", result.content);
//!     Ok(())
//! }
//! ```
//!
//! # Retry + timeout example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use holdfast::{RetryConfig, budget, with_retry, with_timeout};
//!
//! # async fn fetch_rates() -> holdfast::Result<f64> { Ok(1.0) }
//! #[tokio::main]
//! async fn main() -> holdfast::Result<()> {
//!     let config = RetryConfig::fast().max_retries(2);
//!     let rates = with_timeout(
//!         with_retry(&config, "fetch_rates", || fetch_rates()),
//!         budget::QUICK,
//!         "fetch_rates",
//!     )
//!     .await?;
//!     println!("{rates}");
//!     Ok(())
//! }
//! ```

pub mod ai;
pub mod cache;
pub mod error;
pub mod retry;
pub mod telemetry;
pub mod timeout;

// Re-export main types at crate root
pub use error::{ErrorResponse, HoldfastError, Result, handle_error, handle_panic};
pub use retry::{RetryConfig, default_should_retry, with_retry};
pub use timeout::{budget, with_timeout};

pub use ai::{
    AiCallOptions, AiCallResult, AiClient, CallSource, ResponseFormat, ToolCall, ToolChoice,
    ToolDefinition,
};

pub use cache::{
    CacheConfig, CacheEntry, CacheStore, MemoryStore, QueryContext, ResponseCache, cache_key,
};
