//! Provider trait: the abstraction over LLM backends.
//!
//! A Provider knows how to send a conversation to an LLM and get a response
//! back, either as a complete message or as a stream of events.
//!
//! Implementations: the HTTP connector (block-style and delta-style wire
//! families) plus scripted mocks in tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::ProviderError;
use crate::message::Message;
use crate::tool::{ToolCall, ToolDefinition};

/// Opaque token accounting, passed through from the vendor untouched.
pub type Usage = serde_json::Map<String, serde_json::Value>;

/// One model call: everything the provider needs besides its own settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    /// System prompt
    pub system: String,

    /// The conversation so far, replayed verbatim
    pub messages: Vec<Message>,

    /// Available tools the model can call
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,
}

/// A complete (non-streaming) response from a provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmResponse {
    /// Generated text; `None` when the model produced none
    pub text: Option<String>,

    /// Requested tool calls, in the order the model issued them
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,

    #[serde(default)]
    pub usage: Usage,
}

impl LlmResponse {
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// A single event in a streaming response.
///
/// Per turn: zero or more `TextDelta`, then at most one `ToolCallsReady`,
/// then exactly one `Done`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    TextDelta { text: String },
    ToolCallsReady { calls: Vec<ToolCall> },
    Done { full_text: String },
}

/// Receiving half of a provider stream.
pub type EventStream = mpsc::Receiver<std::result::Result<StreamEvent, ProviderError>>;

/// The core Provider trait.
///
/// The agent loop calls `chat()` or `chat_stream()` without knowing which
/// wire family is behind it.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "anthropic", "groq").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn chat(&self, request: ChatRequest) -> std::result::Result<LlmResponse, ProviderError>;

    /// Send a request and get a stream of events.
    ///
    /// Default implementation calls `chat()` and replays the result as a
    /// well-formed event sequence.
    async fn chat_stream(
        &self,
        request: ChatRequest,
    ) -> std::result::Result<EventStream, ProviderError> {
        let response = self.chat(request).await?;
        let full_text = response.text.unwrap_or_default();

        let mut events = Vec::with_capacity(3);
        if !full_text.is_empty() {
            events.push(StreamEvent::TextDelta {
                text: full_text.clone(),
            });
        }
        if !response.tool_calls.is_empty() {
            events.push(StreamEvent::ToolCallsReady {
                calls: response.tool_calls,
            });
        }
        events.push(StreamEvent::Done { full_text });

        let (tx, rx) = mpsc::channel(events.len());
        for event in events {
            let _ = tx.send(Ok(event)).await;
        }
        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedProvider(LlmResponse);

    #[async_trait]
    impl Provider for FixedProvider {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn chat(&self, _request: ChatRequest) -> std::result::Result<LlmResponse, ProviderError> {
            Ok(self.0.clone())
        }
    }

    async fn drain(mut rx: EventStream) -> Vec<StreamEvent> {
        let mut out = Vec::new();
        while let Some(event) = rx.recv().await {
            out.push(event.unwrap());
        }
        out
    }

    #[tokio::test]
    async fn default_stream_replays_text_then_done() {
        let provider = FixedProvider(LlmResponse {
            text: Some("hello".into()),
            ..Default::default()
        });
        let events = drain(provider.chat_stream(ChatRequest::default()).await.unwrap()).await;
        assert_eq!(
            events,
            vec![
                StreamEvent::TextDelta { text: "hello".into() },
                StreamEvent::Done { full_text: "hello".into() },
            ]
        );
    }

    #[tokio::test]
    async fn default_stream_replays_tool_calls() {
        let call = ToolCall::new("t1", "list_directory", Default::default());
        let provider = FixedProvider(LlmResponse {
            text: None,
            tool_calls: vec![call.clone()],
            usage: Usage::new(),
        });
        let events = drain(provider.chat_stream(ChatRequest::default()).await.unwrap()).await;
        assert_eq!(
            events,
            vec![
                StreamEvent::ToolCallsReady { calls: vec![call] },
                StreamEvent::Done { full_text: String::new() },
            ]
        );
    }

    #[test]
    fn empty_tools_are_not_serialized() {
        let json = serde_json::to_value(ChatRequest {
            system: "S".into(),
            ..Default::default()
        })
        .unwrap();
        assert!(json.get("tools").is_none());
    }
}
