//! Model-agnostic AI call wrapper.
//!
//! [`AiClient`] invokes a chat-completion-style endpoint with the full
//! resilience stack applied: each network attempt is classified through the
//! error taxonomy, the attempt loop is driven by [`with_retry`], and the
//! whole loop is raced against the caller's budget by [`with_timeout`].
//!
//! Two upstream response shapes are normalized into one result: a plain
//! message-content response, and a tool-call response whose function
//! arguments become the content. Empty content is treated as a transient
//! upstream fault, not a hard error.
//!
//! [`AiClient::call_with_fallback`] is the opt-in degraded mode for
//! user-facing paths: it never fails, substituting the caller's templated
//! fallback for the response on any error.

mod options;
mod params;

use std::time::{Duration, Instant};

use serde::Deserialize;
use tracing::{info, warn};

use crate::error::{HoldfastError, Result};
use crate::retry::with_retry;
use crate::telemetry;
use crate::timeout::with_timeout;

pub use options::{
    AiCallOptions, AiCallResult, CallSource, ResponseFormat, ToolCall, ToolChoice, ToolDefinition,
};

/// Default gateway endpoint for vendor-qualified model names.
const DEFAULT_GATEWAY_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

/// Default direct endpoint for bare model names.
const DEFAULT_DIRECT_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Client for chat-completion-style AI endpoints.
///
/// Holds a shared HTTP connection pool and the two endpoint URLs. The API
/// key and model are supplied per call, never read from the environment.
#[derive(Clone)]
pub struct AiClient {
    http: reqwest::Client,
    gateway_url: String,
    direct_url: String,
}

impl Default for AiClient {
    fn default() -> Self {
        Self::new()
    }
}

impl AiClient {
    /// Create a client with the default gateway and direct endpoints.
    pub fn new() -> Self {
        Self::with_base_urls(DEFAULT_GATEWAY_URL, DEFAULT_DIRECT_URL)
    }

    /// Create a client with custom endpoints (for testing with wiremock).
    pub fn with_base_urls(
        gateway_url: impl Into<String>,
        direct_url: impl Into<String>,
    ) -> Self {
        // No client-level timeout: the whole-call budget is enforced by
        // with_timeout, including retries.
        let http = reqwest::Client::builder()
            .build()
            .expect("failed to build HTTP client");

        Self {
            http,
            gateway_url: gateway_url.into(),
            direct_url: direct_url.into(),
        }
    }

    /// Endpoint selection by model-name prefix convention: vendor-qualified
    /// names (`google/gemini-2.5-flash`) route through the gateway, bare
    /// names (`gpt-5-mini`) go to the direct provider endpoint.
    fn endpoint_for(&self, model: &str) -> &str {
        if model.contains('/') {
            &self.gateway_url
        } else {
            &self.direct_url
        }
    }

    /// Invoke the model described by `options`, with retry and timeout.
    ///
    /// # Errors
    ///
    /// Returns a typed error on unrecoverable failure: the last attempt's
    /// error once retries are exhausted, or [`HoldfastError::Timeout`] when
    /// the budget elapses first.
    pub async fn call(&self, api_key: &str, options: &AiCallOptions) -> Result<AiCallResult> {
        if options.model.is_empty() {
            return Err(HoldfastError::Validation("model must not be empty".into()));
        }
        if api_key.is_empty() {
            return Err(HoldfastError::Authentication("missing API key".into()));
        }

        let endpoint = self.endpoint_for(&options.model);
        info!(
            model = %options.model,
            endpoint,
            timeout_ms = options.timeout.as_millis() as u64,
            "starting AI call"
        );

        let started = Instant::now();
        let attempts = with_retry(&options.retry, &options.model, || {
            self.attempt(api_key, endpoint, options)
        });
        let outcome = with_timeout(attempts, options.timeout, &options.model).await;
        let duration = started.elapsed();

        metrics::histogram!(
            telemetry::AI_CALL_DURATION_SECONDS,
            "model" => options.model.clone()
        )
        .record(duration.as_secs_f64());

        match outcome {
            Ok((content, tool_calls)) => {
                metrics::counter!(
                    telemetry::AI_CALLS_TOTAL,
                    "model" => options.model.clone(),
                    "status" => "ok"
                )
                .increment(1);
                info!(
                    model = %options.model,
                    duration_ms = duration.as_millis() as u64,
                    "AI call succeeded"
                );
                Ok(AiCallResult {
                    content,
                    model: options.model.clone(),
                    source: CallSource::Ai,
                    duration_ms: duration.as_millis() as u64,
                    tool_calls,
                })
            }
            Err(e) => {
                metrics::counter!(
                    telemetry::AI_CALLS_TOTAL,
                    "model" => options.model.clone(),
                    "status" => "error"
                )
                .increment(1);
                warn!(
                    model = %options.model,
                    duration_ms = duration.as_millis() as u64,
                    error = %e,
                    "AI call failed"
                );
                Err(e)
            }
        }
    }

    /// Degraded-mode entry point: never fails.
    ///
    /// On any failure the error is logged and a synthesized result is
    /// returned with `source = Fallback` and `fallback()` as the content.
    /// Intended for user-facing features where a templated response beats
    /// an error screen.
    pub async fn call_with_fallback<F>(
        &self,
        api_key: &str,
        options: &AiCallOptions,
        fallback: F,
    ) -> AiCallResult
    where
        F: FnOnce() -> String,
    {
        let started = Instant::now();
        match self.call(api_key, options).await {
            Ok(result) => result,
            Err(e) => {
                metrics::counter!(
                    telemetry::AI_FALLBACKS_TOTAL,
                    "model" => options.model.clone()
                )
                .increment(1);
                warn!(
                    model = %options.model,
                    error = %e,
                    "AI call failed, serving fallback content"
                );
                AiCallResult {
                    content: fallback(),
                    model: options.model.clone(),
                    source: CallSource::Fallback,
                    duration_ms: started.elapsed().as_millis() as u64,
                    tool_calls: vec![],
                }
            }
        }
    }

    /// One network attempt: POST, classify the status, normalize the body.
    async fn attempt(
        &self,
        api_key: &str,
        endpoint: &str,
        options: &AiCallOptions,
    ) -> Result<(String, Vec<ToolCall>)> {
        let body = params::build_request_body(options);

        let response = self
            .http
            .post(endpoint)
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&body)
            .send()
            .await
            .map_err(|e| HoldfastError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .map(Duration::from_secs);
            let message = response.text().await.unwrap_or_default();
            return Err(HoldfastError::from_upstream_status(
                status.as_u16(),
                message,
                retry_after,
            ));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| HoldfastError::Http(e.to_string()))?;

        let (content, tool_calls) = normalize_completion(completion)?;

        if options.require_json
            && let Err(e) = serde_json::from_str::<serde_json::Value>(&content)
        {
            return Err(HoldfastError::InvalidJson(e.to_string()));
        }

        Ok((content, tool_calls))
    }
}

/// Collapse the two upstream response shapes into `(content, tool_calls)`.
///
/// A tool-call response contributes its first function's arguments as the
/// content; a plain message response contributes its text. Either way an
/// empty result is a transient failure.
fn normalize_completion(completion: ChatCompletionResponse) -> Result<(String, Vec<ToolCall>)> {
    let message = completion
        .choices
        .into_iter()
        .next()
        .map(|c| c.message)
        .ok_or(HoldfastError::EmptyResponse)?;

    let tool_calls: Vec<ToolCall> = message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|tc| ToolCall {
            id: tc.id.unwrap_or_default(),
            name: tc.function.name,
            arguments: tc.function.arguments,
        })
        .collect();

    let content = if let Some(first) = tool_calls.first() {
        first.arguments.clone()
    } else {
        message.content.unwrap_or_default()
    };

    if content.trim().is_empty() {
        return Err(HoldfastError::EmptyResponse);
    }

    Ok((content, tool_calls))
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<WireToolCall>>,
}

#[derive(Debug, Deserialize)]
struct WireToolCall {
    #[serde(default)]
    id: Option<String>,
    function: WireFunction,
}

#[derive(Debug, Deserialize)]
struct WireFunction {
    name: String,
    arguments: String,
}
