//! Agent-level streaming events.
//!
//! `AgentStreamEvent` wraps provider-level stream events into the events a
//! front end renders: live text, tool progress and a final summary.

use serde::{Deserialize, Serialize};

/// Events emitted by the agent during a streaming exchange.
///
/// - `chunk`       partial text from the model
/// - `tool_call`   a tool is about to run
/// - `tool_result` the tool finished
/// - `done`        the exchange is over
/// - `error`       the exchange was aborted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentStreamEvent {
    /// Partial text token from the model.
    Chunk { content: String },

    /// The agent is calling a tool.
    ToolCall {
        id: String,
        name: String,
        input: serde_json::Value,
    },

    /// Tool execution completed. `output` is exactly what the model sees.
    ToolResult {
        id: String,
        name: String,
        output: String,
        success: bool,
    },

    /// The exchange is complete.
    Done {
        /// Final reply, or the iteration-limit sentinel
        text: String,
        iterations: u32,
        tool_calls_made: usize,
        /// False when the iteration ceiling stopped the loop
        completed: bool,
    },

    /// A provider failure aborted the exchange. History was not saved.
    Error { message: String },
}

impl AgentStreamEvent {
    /// Wire name of this event type.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Chunk { .. } => "chunk",
            Self::ToolCall { .. } => "tool_call",
            Self::ToolResult { .. } => "tool_result",
            Self::Done { .. } => "done",
            Self::Error { .. } => "error",
        }
    }

    /// True for the events that end an exchange.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done { .. } | Self::Error { .. })
    }
}
