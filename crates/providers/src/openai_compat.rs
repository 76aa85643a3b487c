//! Delta-style wire adapter (OpenAI-compatible chat completions).
//!
//! Works with any OpenAI-compatible endpoint: OpenAI, DeepSeek, Groq,
//! Google's OpenAI shim, Ollama, OpenRouter.
//!
//! Canonical tool-result carriers are exploded into one `role: tool` message
//! per result; assistant tool-use blocks become a `tool_calls` array whose
//! arguments are JSON-encoded strings.

use std::collections::BTreeMap;

use pocketclaw_core::error::ProviderError;
use pocketclaw_core::message::{ContentBlock, Message, MessageContent, Role};
use pocketclaw_core::provider::{ChatRequest, LlmResponse, StreamEvent, Usage};
use pocketclaw_core::tool::{ToolCall, ToolDefinition};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::accumulator::{PendingToolCall, finish_turn};
use crate::schema::input_schema;
use crate::{RequestParams, StreamDecoder, WireAdapter, WireFamily, sse_data};

/// Terminal record of an OpenAI-style event stream.
const DONE_SENTINEL: &str = "[DONE]";

/// Adapter for the delta-indexed wire family.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenAiAdapter;

impl OpenAiAdapter {
    /// Convert messages to OpenAI API format, system prompt first.
    fn to_api_messages(system: &str, messages: &[Message]) -> Vec<ApiMessage> {
        let mut out = vec![ApiMessage::text("system", system)];

        for msg in messages {
            match (&msg.role, &msg.content) {
                (Role::User, MessageContent::Text(text)) => out.push(ApiMessage::text("user", text)),
                (Role::Assistant, MessageContent::Text(text)) => {
                    out.push(ApiMessage::text("assistant", text))
                }
                (Role::User, MessageContent::Blocks(blocks)) => {
                    // One wire message per block, in order.
                    for block in blocks {
                        match block {
                            ContentBlock::ToolResult {
                                tool_use_id,
                                content,
                            } => out.push(ApiMessage {
                                role: "tool",
                                content: Some(content.clone()),
                                tool_calls: None,
                                tool_call_id: Some(tool_use_id.clone()),
                            }),
                            ContentBlock::Text { text } => out.push(ApiMessage::text("user", text)),
                            ContentBlock::ToolUse { .. } => {}
                        }
                    }
                }
                (Role::Assistant, MessageContent::Blocks(blocks)) => {
                    let mut text_parts = Vec::new();
                    let mut tool_calls = Vec::new();
                    for block in blocks {
                        match block {
                            ContentBlock::Text { text } => text_parts.push(text.as_str()),
                            ContentBlock::ToolUse {
                                id,
                                name,
                                arguments,
                            } => tool_calls.push(ApiToolCall {
                                id: id.clone(),
                                r#type: "function".into(),
                                function: ApiFunction {
                                    name: name.clone(),
                                    arguments: serde_json::Value::String(
                                        serde_json::Value::Object(arguments.clone()).to_string(),
                                    ),
                                },
                            }),
                            ContentBlock::ToolResult { .. } => {}
                        }
                    }
                    let content = if text_parts.is_empty() && !tool_calls.is_empty() {
                        None
                    } else {
                        Some(text_parts.concat())
                    };
                    out.push(ApiMessage {
                        role: "assistant",
                        content,
                        tool_calls: (!tool_calls.is_empty()).then_some(tool_calls),
                        tool_call_id: None,
                    });
                }
            }
        }

        out
    }

    /// Convert tool definitions to OpenAI function format.
    fn to_api_tools(tools: &[ToolDefinition]) -> Vec<ApiToolDefinition> {
        tools
            .iter()
            .map(|t| ApiToolDefinition {
                r#type: "function".into(),
                function: ApiToolFunction {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: input_schema(t),
                },
            })
            .collect()
    }
}

impl WireAdapter for OpenAiAdapter {
    fn family(&self) -> WireFamily {
        WireFamily::Delta
    }

    fn endpoint(&self, base_url: &str) -> String {
        format!("{}/chat/completions", base_url.trim_end_matches('/'))
    }

    fn auth_headers(&self, api_key: &str) -> Vec<(&'static str, String)> {
        if api_key.is_empty() {
            // Local servers (ollama) take no key.
            return Vec::new();
        }
        vec![("Authorization", format!("Bearer {api_key}"))]
    }

    fn build_request(
        &self,
        params: &RequestParams,
        request: &ChatRequest,
        stream: bool,
    ) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": params.model,
            "max_tokens": params.max_tokens,
            "temperature": params.temperature,
            "messages": Self::to_api_messages(&request.system, &request.messages),
        });

        if !request.tools.is_empty() {
            body["tools"] = serde_json::json!(Self::to_api_tools(&request.tools));
        }
        if stream {
            body["stream"] = serde_json::Value::Bool(true);
        }
        body
    }

    fn parse_response(&self, body: &[u8]) -> Result<LlmResponse, ProviderError> {
        let resp: ApiResponse = serde_json::from_slice(body)
            .map_err(|e| ProviderError::Decode(format!("chat completion response: {e}")))?;

        let choice = resp
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::Decode("response has no choices".into()))?;

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(ApiToolCall::into_tool_call)
            .collect();

        Ok(LlmResponse {
            text: choice.message.content.filter(|t| !t.is_empty()),
            tool_calls,
            usage: resp.usage.unwrap_or_default(),
        })
    }

    fn stream_decoder(&self) -> Box<dyn StreamDecoder> {
        Box::new(DeltaStreamDecoder::default())
    }
}

/// Stream decoder for `choices[0].delta` chunks.
///
/// Tool-call slots are addressed by `index` and finalized in ascending
/// index order, regardless of arrival order.
#[derive(Debug, Default)]
pub struct DeltaStreamDecoder {
    slots: BTreeMap<u32, PendingToolCall>,
    full_text: String,
    finished: bool,
}

impl StreamDecoder for DeltaStreamDecoder {
    fn decode_line(&mut self, line: &str) -> Result<Vec<StreamEvent>, ProviderError> {
        let Some(data) = sse_data(line) else {
            return Ok(Vec::new());
        };
        if data == DONE_SENTINEL {
            self.finished = true;
            return Ok(Vec::new());
        }
        if data.is_empty() {
            return Ok(Vec::new());
        }

        let chunk: StreamResponse = match serde_json::from_str(data) {
            Ok(c) => c,
            Err(e) => {
                trace!(error = %e, data = %data, "Ignoring unparseable SSE chunk");
                return Ok(Vec::new());
            }
        };

        if let Some(error) = chunk.error {
            let message = error["message"]
                .as_str()
                .map(String::from)
                .unwrap_or_else(|| error.to_string());
            return Err(ProviderError::StreamInterrupted(message));
        }

        let mut events = Vec::new();
        let Some(delta) = chunk.choices.into_iter().next().map(|c| c.delta) else {
            return Ok(events);
        };

        if let Some(text) = delta.content.filter(|t| !t.is_empty()) {
            self.full_text.push_str(&text);
            events.push(StreamEvent::TextDelta { text });
        }

        for (position, tc) in delta.tool_calls.unwrap_or_default().into_iter().enumerate() {
            let index = tc.index.unwrap_or(position as u32);
            let slot = self.slots.entry(index).or_default();
            if let Some(id) = tc.id.filter(|id| !id.is_empty()) {
                slot.id = id;
            }
            if let Some(function) = tc.function {
                if let Some(name) = function.name.filter(|n| !n.is_empty()) {
                    slot.name = name;
                }
                if let Some(arguments) = function.arguments {
                    slot.push_fragment(&arguments);
                }
            }
        }

        Ok(events)
    }

    fn is_finished(&self) -> bool {
        self.finished
    }

    fn finish(&mut self) -> Vec<StreamEvent> {
        let calls = std::mem::take(&mut self.slots)
            .into_values()
            .map(PendingToolCall::finish)
            .collect();
        finish_turn(std::mem::take(&mut self.full_text), calls)
    }
}

// --- OpenAI API types (internal) ---

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ApiToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl ApiMessage {
    fn text(role: &'static str, content: &str) -> Self {
        Self {
            role,
            content: Some(content.to_string()),
            tool_calls: None,
            tool_call_id: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiToolCall {
    id: String,
    #[serde(default = "function_type")]
    r#type: String,
    function: ApiFunction,
}

fn function_type() -> String {
    "function".into()
}

impl ApiToolCall {
    /// `arguments` is normally a JSON-encoded string; some servers send the
    /// object itself.
    fn into_tool_call(self) -> ToolCall {
        match self.function.arguments {
            serde_json::Value::Object(map) => ToolCall::new(self.id, self.function.name, map),
            serde_json::Value::String(raw) => {
                ToolCall::from_raw_arguments(self.id, self.function.name, &raw)
            }
            _ => ToolCall::new(self.id, self.function.name, Default::default()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiFunction {
    name: String,
    #[serde(default)]
    arguments: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct ApiToolDefinition {
    r#type: String,
    function: ApiToolFunction,
}

#[derive(Debug, Serialize)]
struct ApiToolFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    choices: Vec<ApiChoice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ApiResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ApiToolCall>>,
}

// --- Streaming SSE types ---

/// A single SSE `data: {...}` chunk from a streaming response.
#[derive(Debug, Deserialize)]
struct StreamResponse {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Debug, Default, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<StreamToolCallDelta>>,
}

/// A tool call delta: arrives incrementally across chunks.
#[derive(Debug, Deserialize)]
struct StreamToolCallDelta {
    #[serde(default)]
    index: Option<u32>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    function: Option<StreamFunctionDelta>,
}

#[derive(Debug, Deserialize)]
struct StreamFunctionDelta {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    arguments: Option<String>,
}
