//! Shared types used across driftwatch modules
//!
//! Contains the conversation turn model, tool call/result structures, and
//! the schemas advertised to the generation backend.

use serde::{Deserialize, Serialize};

/// One entry in the conversation context.
///
/// The ordered sequence of turns is replayed verbatim to the generation
/// backend on every iteration, so insertion order is load-bearing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Turn {
    /// Fixed system prompt. Exactly one, always at index 0.
    System { text: String },
    /// The user's utterance for this run.
    User { text: String },
    /// One generation step: optional text plus zero or more tool calls.
    Assistant {
        text: Option<String>,
        tool_calls: Vec<ToolCall>,
    },
    /// The normalized outcome of one tool call.
    ToolResult(ToolRecord),
}

impl Turn {
    /// Create a system turn
    pub fn system(text: impl Into<String>) -> Self {
        Self::System { text: text.into() }
    }

    /// Create a user turn
    pub fn user(text: impl Into<String>) -> Self {
        Self::User { text: text.into() }
    }

    /// Create an assistant turn
    pub fn assistant(text: Option<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self::Assistant { text, tool_calls }
    }

    /// The text of this turn, if it is an assistant turn that carried any.
    pub fn assistant_text(&self) -> Option<&str> {
        match self {
            Self::Assistant { text, .. } => text.as_deref(),
            _ => None,
        }
    }
}

/// A tool call requested by the generation backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Correlation id, unique within one assistant turn
    pub id: String,
    /// Name of the tool to invoke
    pub name: String,
    /// JSON arguments for the tool
    pub arguments: serde_json::Value,
}

impl ToolCall {
    /// Create a new tool call
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: serde_json::Value,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// Why a tool call produced no payload.
///
/// All of these are recoverable: they are fed back to the model as data,
/// never surfaced as loop failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolErrorKind {
    /// The requested name is not in the registry snapshot for this run
    UnknownTool,
    /// The remote tool reported a failure or was unreachable
    InvocationFailed,
    /// The per-call timeout elapsed
    Timeout,
    /// Arguments were not the structured record the tool expects
    BadArguments,
    /// A second call in the same turn reused this call's id
    DuplicateCallId,
}

impl std::fmt::Display for ToolErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownTool => write!(f, "unknown_tool"),
            Self::InvocationFailed => write!(f, "invocation_failed"),
            Self::Timeout => write!(f, "timeout"),
            Self::BadArguments => write!(f, "bad_arguments"),
            Self::DuplicateCallId => write!(f, "duplicate_call_id"),
        }
    }
}

/// What one tool call produced
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolOutput {
    /// The tool's response payload
    Payload(serde_json::Value),
    /// A normalized failure, fed back to the model
    Error {
        kind: ToolErrorKind,
        message: String,
    },
}

/// The eventual result of exactly one tool call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolRecord {
    /// The id of the call this result answers
    pub call_id: String,
    pub output: ToolOutput,
}

impl ToolRecord {
    /// Create a successful record
    pub fn payload(call_id: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            call_id: call_id.into(),
            output: ToolOutput::Payload(payload),
        }
    }

    /// Create an error record
    pub fn error(
        call_id: impl Into<String>,
        kind: ToolErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            call_id: call_id.into(),
            output: ToolOutput::Error {
                kind,
                message: message.into(),
            },
        }
    }

    /// Whether this record carries an error instead of a payload
    pub fn is_error(&self) -> bool {
        matches!(self.output, ToolOutput::Error { .. })
    }

    /// Serialize the output for the wire
    ///
    /// Payloads go back verbatim; errors go back as a small JSON object
    /// the model can read.
    pub fn content_text(&self) -> String {
        match &self.output {
            ToolOutput::Payload(value) => value.to_string(),
            ToolOutput::Error { kind, message } => serde_json::json!({
                "error": kind.to_string(),
                "message": message,
            })
            .to_string(),
        }
    }

    /// The error kind, if this record carries one
    pub fn error_kind(&self) -> Option<ToolErrorKind> {
        match &self.output {
            ToolOutput::Error { kind, .. } => Some(*kind),
            ToolOutput::Payload(_) => None,
        }
    }
}

/// A tool description advertised to the generation backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Name of the tool
    pub name: String,
    /// Description of what the tool does
    pub description: String,
    /// JSON Schema for the arguments
    pub parameters: serde_json::Value,
}
