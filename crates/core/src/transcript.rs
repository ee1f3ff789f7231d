//! Conversation transcript types
//!
//! A transcript is the ordered, append-only record of turns for one run,
//! together with the run's metadata. Turns are immutable once written and
//! `turn_count` always equals the number of turns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::run_types::RunMetadata;

/// Who produced a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// System prompt
    System,
    /// User (or orchestrator) message
    User,
    /// Model response
    Assistant,
    /// Output of a tool invocation fed back to the model
    ToolResult,
}

impl Role {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::ToolResult => "tool_result",
        }
    }
}

/// A tool invocation made during an assistant turn
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ToolCall {
    /// Tool name
    pub name: String,
    /// Raw tool input
    #[serde(default)]
    pub input: String,
    /// Raw tool output
    #[serde(default)]
    pub output: String,
    /// Error reported by the tool, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolCall {
    /// Successful tool call
    pub fn new(name: impl Into<String>, input: impl Into<String>, output: impl Into<String>) -> Self {
        ToolCall {
            name: name.into(),
            input: input.into(),
            output: output.into(),
            error: None,
        }
    }

    /// Attach an error
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// One step of a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Turn {
    /// 1-based sequence number, assigned when the turn is recorded
    #[serde(default)]
    pub id: u64,
    /// Who produced the turn
    pub role: Role,
    /// Text payload
    #[serde(default)]
    pub content: String,
    /// Input tokens reported for this turn
    #[serde(default)]
    pub tokens_in: u64,
    /// Output tokens reported for this turn
    #[serde(default)]
    pub tokens_out: u64,
    /// Time of recording (stamped on append when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Tool invocations made during this turn
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
}

impl Turn {
    /// New unrecorded turn
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Turn {
            id: 0,
            role,
            content: content.into(),
            tokens_in: 0,
            tokens_out: 0,
            timestamp: None,
            tool_calls: Vec::new(),
        }
    }

    /// System turn
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// User turn
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Assistant turn
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Tool result turn
    pub fn tool_result(content: impl Into<String>) -> Self {
        Self::new(Role::ToolResult, content)
    }

    /// Set input tokens
    pub fn with_tokens_in(mut self, tokens: u64) -> Self {
        self.tokens_in = tokens;
        self
    }

    /// Set output tokens
    pub fn with_tokens_out(mut self, tokens: u64) -> Self {
        self.tokens_out = tokens;
        self
    }

    /// Set an explicit timestamp
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Attach a tool call
    pub fn with_tool_call(mut self, call: ToolCall) -> Self {
        self.tool_calls.push(call);
        self
    }

    /// Tokens this turn contributes to the run's `(tokens_in, tokens_out)`
    ///
    /// User and system turns count toward tokens in, assistant turns toward
    /// tokens out. Tool results are not attributed.
    pub fn attributed_tokens(&self) -> (u64, u64) {
        match self.role {
            Role::User | Role::System => (self.tokens_in, 0),
            Role::Assistant => (0, self.tokens_out),
            Role::ToolResult => (0, 0),
        }
    }
}

/// Full conversation record for a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    /// Run metadata (flattened into the top-level object on disk)
    #[serde(flatten)]
    pub metadata: RunMetadata,
    /// Recorded turns in sequence order
    #[serde(default)]
    pub turns: Vec<Turn>,
}

impl Transcript {
    /// Empty transcript for a newly started run
    pub fn new(metadata: RunMetadata) -> Self {
        Transcript {
            metadata,
            turns: Vec::new(),
        }
    }

    /// Run id
    pub fn run_id(&self) -> &str {
        &self.metadata.run_id
    }

    /// Append a turn, assigning its sequence id and attributing its tokens
    ///
    /// Returns the assigned id.
    pub fn append(&mut self, mut turn: Turn, now: DateTime<Utc>) -> u64 {
        let id = self.turns.len() as u64 + 1;
        turn.id = id;
        if turn.timestamp.is_none() {
            turn.timestamp = Some(now);
        }

        let (tokens_in, tokens_out) = turn.attributed_tokens();
        self.metadata.total_tokens_in = self.metadata.total_tokens_in.saturating_add(tokens_in);
        self.metadata.total_tokens_out = self.metadata.total_tokens_out.saturating_add(tokens_out);

        self.turns.push(turn);
        self.metadata.turn_count = self.turns.len() as u64;
        id
    }

    /// Most recent assistant turn, if any
    pub fn last_assistant_turn_mut(&mut self) -> Option<&mut Turn> {
        self.turns.iter_mut().rev().find(|t| t.role == Role::Assistant)
    }
}
