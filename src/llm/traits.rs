//! Generation backend abstraction

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::error::Result;
use crate::core::types::{ToolCall, ToolSchema, Turn};

/// One assistant turn as produced by the backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Generation {
    /// Free-form text, if the backend produced any
    pub text: Option<String>,
    /// Tool calls in emission order
    pub tool_calls: Vec<ToolCall>,
    /// Model that produced this generation
    pub model: String,
    /// Token accounting, if the backend reports it
    pub usage: Option<TokenUsage>,
}

impl Generation {
    /// True if this generation carries no tool calls
    pub fn is_final(&self) -> bool {
        self.tool_calls.is_empty()
    }
}

/// Token usage reported by the backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Trait for generation backends
///
/// Implementations take the full accumulated context plus the tool
/// schemas discovered for this run, and return one assistant turn.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Request the next assistant turn
    ///
    /// `steps_remaining` is advisory: it tells the backend how many
    /// generation calls are left in the budget so it can plan to wrap up.
    async fn generate(
        &self,
        context: &[Turn],
        tools: &[ToolSchema],
        steps_remaining: u32,
    ) -> Result<Generation>;

    /// Backend name for logging
    fn name(&self) -> &str;
}
