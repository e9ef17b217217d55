//! Model-family translation layer for request parameters.
//!
//! All "this model family needs it *this* way" logic lives here and nowhere
//! else. The two request shapes are keyed on a model-name predicate, not
//! hard-coded per model, so new members of a family need no code change.

use serde_json::{Map, Value, json};

use crate::ai::options::{AiCallOptions, ResponseFormat, ToolChoice};

/// Token-limit parameter shape expected by a model family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenParam {
    /// Standard chat models: `max_tokens`, `temperature` honoured.
    MaxTokens,
    /// Reasoning-family models: `max_completion_tokens`, `temperature`
    /// rejected by the API and therefore omitted.
    MaxCompletionTokens,
}

/// Classify a model name into its request shape.
///
/// Reasoning-family models (o-series and gpt-5-series) reject `temperature`
/// and use `max_completion_tokens`. The check runs on the bare model name,
/// after stripping any `vendor/` routing prefix.
pub(crate) fn token_param_for(model: &str) -> TokenParam {
    let bare = model.rsplit('/').next().unwrap_or(model);
    let reasoning_family = ["o1", "o3", "o4", "gpt-5"]
        .iter()
        .any(|prefix| bare.starts_with(prefix));
    if reasoning_family {
        TokenParam::MaxCompletionTokens
    } else {
        TokenParam::MaxTokens
    }
}

/// Build the chat-completion request body for the given options.
///
/// Handles the model-family branch, message assembly, response format,
/// and tool pass-through.
pub(crate) fn build_request_body(options: &AiCallOptions) -> Value {
    let mut messages = Vec::with_capacity(2);
    if let Some(system) = &options.system_prompt {
        messages.push(json!({"role": "system", "content": system}));
    }
    messages.push(json!({"role": "user", "content": options.user_prompt}));

    let mut body = Map::new();
    body.insert("model".into(), json!(options.model));
    body.insert("messages".into(), Value::Array(messages));

    match token_param_for(&options.model) {
        TokenParam::MaxTokens => {
            body.insert("max_tokens".into(), json!(options.max_tokens));
            if let Some(temp) = options.temperature {
                body.insert("temperature".into(), json!(temp));
            }
        }
        TokenParam::MaxCompletionTokens => {
            body.insert("max_completion_tokens".into(), json!(options.max_tokens));
        }
    }

    // JSON mode is requested explicitly or implied by strict validation.
    if options.response_format == ResponseFormat::JsonObject || options.require_json {
        body.insert("response_format".into(), json!({"type": "json_object"}));
    }

    if let Some(tools) = &options.tools {
        let wire_tools: Vec<Value> = tools
            .iter()
            .map(|t| {
                json!({
                    "type": "function",
                    "function": {
                        "name": t.name,
                        "description": t.description,
                        "parameters": t.parameters,
                    }
                })
            })
            .collect();
        body.insert("tools".into(), Value::Array(wire_tools));

        let choice = match options.tool_choice.clone().unwrap_or_default() {
            ToolChoice::Auto => json!("auto"),
            ToolChoice::None => json!("none"),
            ToolChoice::Required => json!("required"),
            ToolChoice::Function { name } => {
                json!({"type": "function", "function": {"name": name}})
            }
        };
        body.insert("tool_choice".into(), choice);
    }

    Value::Object(body)
}
