//! HTTP generation client
//!
//! Async client for an OpenAI-compatible chat-completion backend with tool
//! calling.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::core::error::{DriftwatchError, Result};
use crate::core::types::{ToolCall, ToolSchema, Turn};
use crate::core::Config;
use crate::llm::traits::{Generation, GenerationClient, TokenUsage};

/// Chat-completion API client
#[derive(Clone)]
pub struct HttpGenerationClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

/// Chat request body
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<WireTool<'a>>>,
    /// Advisory budget hint so the backend can plan to wrap up
    step_hint: u32,
}

/// Wire message format
#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

/// Wire tool call format
#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type", default = "call_type")]
    call_type: String,
    function: WireFunction,
}

fn call_type() -> String {
    "function".to_string()
}

/// Function in a wire tool call
#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireFunction {
    name: String,
    arguments: serde_json::Value,
}

/// Tool schema in the request
#[derive(Debug, Serialize)]
struct WireTool<'a> {
    #[serde(rename = "type")]
    tool_type: &'static str,
    function: &'a ToolSchema,
}

/// Chat response body
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    model: String,
    #[serde(default)]
    usage: Option<WireUsage>,
}

/// One completion choice
#[derive(Debug, Deserialize)]
struct Choice {
    message: WireMessage,
}

/// Token usage in the response
#[derive(Debug, Deserialize)]
struct WireUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

impl HttpGenerationClient {
    /// Create a new client from configuration
    pub fn from_config(config: &Config) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.backend.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: config.backend.endpoint.trim_end_matches('/').to_string(),
            api_key: config.backend.api_key.clone(),
            model: config.backend.model.clone(),
        }
    }

    /// Create a client with custom base URL and model
    pub fn with_base_url(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
            model: model.into(),
        }
    }

    /// Convert the accumulated context to wire messages
    fn to_wire_messages(context: &[Turn]) -> Vec<WireMessage> {
        context
            .iter()
            .map(|turn| match turn {
                Turn::System { text } => WireMessage {
                    role: "system".to_string(),
                    content: Some(text.clone()),
                    tool_calls: None,
                    tool_call_id: None,
                },
                Turn::User { text } => WireMessage {
                    role: "user".to_string(),
                    content: Some(text.clone()),
                    tool_calls: None,
                    tool_call_id: None,
                },
                Turn::Assistant { text, tool_calls } => WireMessage {
                    role: "assistant".to_string(),
                    content: text.clone(),
                    tool_calls: if tool_calls.is_empty() {
                        None
                    } else {
                        Some(
                            tool_calls
                                .iter()
                                .map(|tc| WireToolCall {
                                    id: tc.id.clone(),
                                    call_type: call_type(),
                                    function: WireFunction {
                                        name: tc.name.clone(),
                                        arguments: tc.arguments.clone(),
                                    },
                                })
                                .collect(),
                        )
                    },
                    tool_call_id: None,
                },
                Turn::ToolResult(record) => WireMessage {
                    role: "tool".to_string(),
                    content: Some(record.content_text()),
                    tool_calls: None,
                    tool_call_id: Some(record.call_id.clone()),
                },
            })
            .collect()
    }

    /// Convert a wire response to a Generation
    fn to_generation(response: ChatResponse) -> Result<Generation> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| DriftwatchError::backend("Response contained no choices"))?;

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| {
                // Some backends send arguments as a JSON-encoded string.
                let arguments = match tc.function.arguments {
                    serde_json::Value::String(s) => serde_json::from_str(&s)
                        .unwrap_or(serde_json::Value::String(s)),
                    other => other,
                };
                ToolCall {
                    id: tc.id,
                    name: tc.function.name,
                    arguments,
                }
            })
            .collect();

        // An explicitly-empty text field is still an answer; only an
        // absent one counts as textless.
        let text = choice.message.content;

        let usage = response.usage.map(|u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(Generation {
            text,
            tool_calls,
            model: response.model,
            usage,
        })
    }

    /// Map a failed send into the fatal taxonomy
    ///
    /// Connect failures and request timeouts both mean the backend did
    /// not answer; everything else passes through as an HTTP error.
    fn map_send_error(e: reqwest::Error, base_url: &str) -> DriftwatchError {
        if e.is_connect() {
            DriftwatchError::BackendUnreachable(format!(
                "Cannot connect to backend at {}. Is it running?",
                base_url
            ))
        } else if e.is_timeout() {
            DriftwatchError::BackendUnreachable(format!(
                "Backend at {} did not answer within the request timeout",
                base_url
            ))
        } else {
            DriftwatchError::from(e)
        }
    }
}

#[async_trait]
impl GenerationClient for HttpGenerationClient {
    async fn generate(
        &self,
        context: &[Turn],
        tools: &[ToolSchema],
        steps_remaining: u32,
    ) -> Result<Generation> {
        let messages = Self::to_wire_messages(context);

        let wire_tools = if tools.is_empty() {
            None
        } else {
            Some(
                tools
                    .iter()
                    .map(|t| WireTool {
                        tool_type: "function",
                        function: t,
                    })
                    .collect(),
            )
        };

        let request = ChatRequest {
            model: &self.model,
            messages,
            tools: wire_tools,
            step_hint: steps_remaining,
        };

        debug!(
            messages = request.messages.len(),
            step_hint = steps_remaining,
            "sending generation request"
        );

        let mut builder = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .json(&request);

        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Self::map_send_error(e, &self.base_url))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(DriftwatchError::backend(format!(
                "Backend API error ({}): {}",
                status, error_text
            )));
        }

        let response_text = response.text().await?;
        debug!(bytes = response_text.len(), "received generation response");

        let chat_response: ChatResponse = serde_json::from_str(&response_text)
            .map_err(|e| DriftwatchError::backend(format!("Failed to parse response: {}", e)))?;

        Self::to_generation(chat_response)
    }

    fn name(&self) -> &str {
        "http"
    }
}
