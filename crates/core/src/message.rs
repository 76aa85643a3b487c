//! Message and conversation domain types.
//!
//! This is the canonical, vendor-neutral shape of a conversation. Provider
//! adapters translate it to and from their wire formats; the conversation
//! store persists it verbatim.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::tool::ToolCall;

/// Unique identifier for a conversation (session).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub String);

impl ConversationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from(s: &str) -> Self {
        Self(s.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ConversationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The role of a message sender in a conversation.
///
/// Tool results travel in a `User` message whose content is a list of
/// [`ContentBlock::ToolResult`] blocks (see [`Message::is_tool_result_carrier`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One typed block inside a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        #[serde(default)]
        arguments: serde_json::Map<String, serde_json::Value>,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
    },
}

/// Message body: either plain text or an ordered list of blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

/// A single message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Who sent this message
    pub role: Role,

    /// The content, replayed to the provider in this exact order
    pub content: MessageContent,

    /// When the message was created
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a new plain-text user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Text(content.into()),
            timestamp: Utc::now(),
        }
    }

    /// Create a new plain-text assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: MessageContent::Text(content.into()),
            timestamp: Utc::now(),
        }
    }

    /// An assistant turn that requested tools: optional text first, then one
    /// `ToolUse` block per call in the order the model issued them.
    pub fn assistant_with_tool_calls(text: Option<&str>, calls: &[ToolCall]) -> Self {
        let mut blocks = Vec::with_capacity(calls.len() + 1);
        if let Some(text) = text.filter(|t| !t.is_empty()) {
            blocks.push(ContentBlock::Text {
                text: text.to_string(),
            });
        }
        blocks.extend(calls.iter().map(|c| ContentBlock::ToolUse {
            id: c.id.clone(),
            name: c.name.clone(),
            arguments: c.arguments.clone(),
        }));
        Self {
            role: Role::Assistant,
            content: MessageContent::Blocks(blocks),
            timestamp: Utc::now(),
        }
    }

    /// The user-role turn answering a tool-using assistant turn.
    pub fn tool_results<I, S>(results: I) -> Self
    where
        I: IntoIterator<Item = (S, String)>,
        S: Into<String>,
    {
        let blocks = results
            .into_iter()
            .map(|(id, content)| ContentBlock::ToolResult {
                tool_use_id: id.into(),
                content,
            })
            .collect();
        Self {
            role: Role::User,
            content: MessageContent::Blocks(blocks),
            timestamp: Utc::now(),
        }
    }

    /// The blocks of this message, with plain text presented as one block.
    pub fn blocks(&self) -> Vec<ContentBlock> {
        match &self.content {
            MessageContent::Text(text) => vec![ContentBlock::Text { text: text.clone() }],
            MessageContent::Blocks(blocks) => blocks.clone(),
        }
    }

    /// Text of all text blocks, concatenated without a separator, the same
    /// way provider responses and streamed deltas are joined.
    pub fn text(&self) -> String {
        match &self.content {
            MessageContent::Text(text) => text.clone(),
            MessageContent::Blocks(blocks) => blocks
                .iter()
                .filter_map(|b| match b {
                    ContentBlock::Text { text } => Some(text.as_str()),
                    _ => None,
                })
                .collect(),
        }
    }

    /// `(id, name)` of every tool use block, in order.
    pub fn tool_uses(&self) -> Vec<(&str, &str)> {
        match &self.content {
            MessageContent::Text(_) => Vec::new(),
            MessageContent::Blocks(blocks) => blocks
                .iter()
                .filter_map(|b| match b {
                    ContentBlock::ToolUse { id, name, .. } => Some((id.as_str(), name.as_str())),
                    _ => None,
                })
                .collect(),
        }
    }

    /// `(tool_use_id, content)` of every tool result block, in order.
    pub fn tool_results_iter(&self) -> Vec<(&str, &str)> {
        match &self.content {
            MessageContent::Text(_) => Vec::new(),
            MessageContent::Blocks(blocks) => blocks
                .iter()
                .filter_map(|b| match b {
                    ContentBlock::ToolResult {
                        tool_use_id,
                        content,
                    } => Some((tool_use_id.as_str(), content.as_str())),
                    _ => None,
                })
                .collect(),
        }
    }

    /// A user message made only of tool results.
    pub fn is_tool_result_carrier(&self) -> bool {
        self.role == Role::User
            && matches!(&self.content, MessageContent::Blocks(blocks)
                if !blocks.is_empty()
                    && blocks.iter().all(|b| matches!(b, ContentBlock::ToolResult { .. })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(id: &str, name: &str, args: serde_json::Value) -> ToolCall {
        ToolCall::new(id, name, args.as_object().cloned().unwrap_or_default())
    }

    #[test]
    fn create_user_message() {
        let msg = Message::user("Hello, agent!");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.text(), "Hello, agent!");
        assert!(msg.tool_uses().is_empty());
        assert!(!msg.is_tool_result_carrier());
    }

    #[test]
    fn assistant_turn_keeps_text_before_tool_uses() {
        let calls = vec![
            call("t1", "read_file", serde_json::json!({"path": "a.txt"})),
            call("t2", "list_directory", serde_json::json!({})),
        ];
        let msg = Message::assistant_with_tool_calls(Some("Looking"), &calls);
        let blocks = msg.blocks();
        assert_eq!(blocks.len(), 3);
        assert!(matches!(&blocks[0], ContentBlock::Text { text } if text == "Looking"));
        assert_eq!(msg.tool_uses(), vec![("t1", "read_file"), ("t2", "list_directory")]);
    }

    #[test]
    fn assistant_turn_without_text_has_only_tool_uses() {
        let calls = vec![call("t1", "x", serde_json::json!({}))];
        let msg = Message::assistant_with_tool_calls(Some(""), &calls);
        assert_eq!(msg.blocks().len(), 1);
    }

    #[test]
    fn tool_result_carrier() {
        let msg = Message::tool_results(vec![("t1", "ok".to_string()), ("t2", "fine".to_string())]);
        assert!(msg.is_tool_result_carrier());
        assert_eq!(msg.tool_results_iter(), vec![("t1", "ok"), ("t2", "fine")]);
    }

    #[test]
    fn message_serialization_roundtrip() {
        let calls = vec![call("t1", "read_file", serde_json::json!({"path": "a"}))];
        let msg = Message::assistant_with_tool_calls(Some("hi"), &calls);
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""type":"tool_use""#));
        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(back.role, Role::Assistant);
        assert_eq!(back.content, msg.content);
    }

    #[test]
    fn plain_text_serializes_as_string() {
        let json = serde_json::to_value(Message::user("hey")).unwrap();
        assert_eq!(json["content"], "hey");
        assert_eq!(json["role"], "user");
    }

    #[test]
    fn text_blocks_concatenate_without_separator() {
        let msg = Message {
            role: Role::Assistant,
            content: MessageContent::Blocks(vec![
                ContentBlock::Text { text: "Hello ".into() },
                ContentBlock::ToolUse {
                    id: "t1".into(),
                    name: "x".into(),
                    arguments: Default::default(),
                },
                ContentBlock::Text { text: "world".into() },
            ]),
            timestamp: Utc::now(),
        };
        assert_eq!(msg.text(), "Hello world");
    }

    #[test]
    fn missing_timestamp_defaults() {
        let msg: Message = serde_json::from_str(r#"{"role":"assistant","content":"x"}"#).unwrap();
        assert_eq!(msg.text(), "x");
    }
}
