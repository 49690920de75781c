//! Accumulated context for one run
//!
//! Every run starts from a system turn and the user's utterance and
//! grows strictly append-only: assistant turns as the backend produces
//! them, then one result turn per tool call, in emission order.

use crate::core::types::{ToolRecord, Turn};

/// Append-only turn sequence for one run
#[derive(Debug, Clone)]
pub struct TurnAggregator {
    turns: Vec<Turn>,
}

impl TurnAggregator {
    /// Seed the context with the system prompt and the user's utterance
    pub fn new(system_prompt: impl Into<String>, user_text: impl Into<String>) -> Self {
        Self {
            turns: vec![Turn::system(system_prompt), Turn::user(user_text)],
        }
    }

    /// Append an assistant turn
    pub fn push_assistant(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// Append one tool result
    pub fn push_tool_record(&mut self, record: ToolRecord) {
        self.turns.push(Turn::ToolResult(record));
    }

    /// The full context in order
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Text of the most recent assistant turn that carried any
    pub fn last_assistant_text(&self) -> Option<String> {
        self.turns
            .iter()
            .rev()
            .find_map(|turn| turn.assistant_text().map(str::to_string))
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
