//! AI call options, results, and tool types.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::retry::RetryConfig;
use crate::timeout::budget;

/// Options for a single AI invocation (provider-agnostic).
///
/// Constructed by the caller, read-only for the duration of the call.
///
/// ```rust
/// # use holdfast::{AiCallOptions, ResponseFormat};
/// let options = AiCallOptions::new("google/gemini-2.5-flash", "Summarise BS 7671 chapter 41")
///     .system_prompt("You are an electrical regulations assistant.")
///     .temperature(0.2)
///     .max_tokens(2048)
///     .response_format(ResponseFormat::JsonObject)
///     .require_json(true);
/// ```
#[derive(Debug, Clone)]
pub struct AiCallOptions {
    pub model: String,
    pub user_prompt: String,
    pub system_prompt: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: u32,
    pub response_format: ResponseFormat,
    /// Whole-call budget, retry loop included. Default: [`budget::LONG`].
    pub timeout: Duration,
    /// Require the returned content to parse as JSON; a parse failure is a
    /// retryable error.
    pub require_json: bool,
    pub tools: Option<Vec<ToolDefinition>>,
    pub tool_choice: Option<ToolChoice>,
    /// Retry behaviour for this call. Default: [`RetryConfig::standard`].
    pub retry: RetryConfig,
}

impl AiCallOptions {
    pub fn new(model: impl Into<String>, user_prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            user_prompt: user_prompt.into(),
            system_prompt: None,
            temperature: None,
            max_tokens: 1024,
            response_format: ResponseFormat::Text,
            timeout: budget::LONG,
            require_json: false,
            tools: None,
            tool_choice: None,
            retry: RetryConfig::standard(),
        }
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = max;
        self
    }

    pub fn response_format(mut self, format: ResponseFormat) -> Self {
        self.response_format = format;
        self
    }

    pub fn timeout(mut self, budget: Duration) -> Self {
        self.timeout = budget;
        self
    }

    pub fn require_json(mut self, required: bool) -> Self {
        self.require_json = required;
        self
    }

    pub fn tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = Some(tools);
        self
    }

    pub fn tool_choice(mut self, choice: ToolChoice) -> Self {
        self.tool_choice = Some(choice);
        self
    }

    pub fn retry(mut self, config: RetryConfig) -> Self {
        self.retry = config;
        self
    }
}

/// Desired response format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    #[default]
    Text,
    JsonObject,
}

/// Where a result came from: a real model response or the caller's
/// degraded fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallSource {
    Ai,
    Fallback,
}

/// Result of one AI invocation. Produced once, immutable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiCallResult {
    pub content: String,
    pub model: String,
    pub source: CallSource,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
}

/// Tool definition for function calling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// A tool call made by the model
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: String, // JSON string
}

impl ToolCall {
    /// Parse the arguments as JSON
    pub fn parse_arguments<T: serde::de::DeserializeOwned>(
        &self,
    ) -> std::result::Result<T, serde_json::Error> {
        serde_json::from_str(&self.arguments)
    }
}

/// Tool choice configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum ToolChoice {
    #[default]
    Auto,
    None,
    Required,
    Function {
        name: String,
    },
}
