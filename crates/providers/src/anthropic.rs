//! Block-style wire adapter (Anthropic Messages API).
//!
//! Features:
//! - `x-api-key` header authentication (not Bearer)
//! - `anthropic-version` header
//! - System prompt as top-level field
//! - Native tool use with `tool_use` / `tool_result` content blocks
//! - Streaming via SSE with `content_block_*` events, accumulators keyed by
//!   block index

use std::collections::HashMap;

use pocketclaw_core::error::ProviderError;
use pocketclaw_core::message::{ContentBlock, Message, MessageContent, Role};
use pocketclaw_core::provider::{ChatRequest, LlmResponse, StreamEvent, Usage};
use pocketclaw_core::tool::{ToolCall, ToolDefinition};
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::accumulator::{PendingToolCall, finish_turn};
use crate::schema::input_schema;
use crate::{RequestParams, StreamDecoder, WireAdapter, WireFamily, sse_data};

pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Adapter for the block-oriented wire family.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnthropicAdapter;

impl AnthropicAdapter {
    /// Convert messages to Anthropic API format with content blocks.
    fn to_api_messages(messages: &[Message]) -> Vec<AnthropicMessage> {
        messages
            .iter()
            .map(|msg| AnthropicMessage {
                role: match msg.role {
                    Role::User => "user",
                    Role::Assistant => "assistant",
                },
                content: match &msg.content {
                    MessageContent::Text(text) => AnthropicContent::Text(text.clone()),
                    MessageContent::Blocks(blocks) => {
                        AnthropicContent::Blocks(blocks.iter().map(WireBlock::from).collect())
                    }
                },
            })
            .collect()
    }

    /// Convert tool definitions to Anthropic format.
    fn to_api_tools(tools: &[ToolDefinition]) -> Vec<AnthropicTool> {
        tools
            .iter()
            .map(|t| AnthropicTool {
                name: t.name.clone(),
                description: t.description.clone(),
                input_schema: input_schema(t),
            })
            .collect()
    }

    /// Convert an Anthropic API response to the canonical form.
    fn to_llm_response(resp: AnthropicResponse) -> LlmResponse {
        let mut text = String::new();
        let mut tool_calls = Vec::new();

        for block in resp.content {
            match block {
                // Joined without a separator so the result matches the streamed full text.
                ResponseContentBlock::Text { text: t } => text.push_str(&t),
                ResponseContentBlock::ToolUse { id, name, input } => {
                    let arguments = match input {
                        serde_json::Value::Object(map) => map,
                        _ => Default::default(),
                    };
                    tool_calls.push(ToolCall::new(id, name, arguments));
                }
                ResponseContentBlock::Other => {}
            }
        }

        LlmResponse {
            text: (!text.is_empty()).then_some(text),
            tool_calls,
            usage: resp.usage,
        }
    }
}

impl WireAdapter for AnthropicAdapter {
    fn family(&self) -> WireFamily {
        WireFamily::Block
    }

    fn endpoint(&self, base_url: &str) -> String {
        format!("{}/v1/messages", base_url.trim_end_matches('/'))
    }

    fn auth_headers(&self, api_key: &str) -> Vec<(&'static str, String)> {
        vec![
            ("x-api-key", api_key.to_string()),
            ("anthropic-version", ANTHROPIC_VERSION.to_string()),
        ]
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
            "system": request.system,
            "messages": Self::to_api_messages(&request.messages),
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
        let resp: AnthropicResponse = serde_json::from_slice(body)
            .map_err(|e| ProviderError::Decode(format!("Anthropic response: {e}")))?;
        Ok(Self::to_llm_response(resp))
    }

    fn stream_decoder(&self) -> Box<dyn StreamDecoder> {
        Box::new(BlockStreamDecoder::default())
    }
}

/// Stream decoder for `content_block_*` events.
#[derive(Debug, Default)]
pub struct BlockStreamDecoder {
    open: HashMap<u64, PendingToolCall>,
    calls: Vec<ToolCall>,
    full_text: String,
    finished: bool,
}

impl StreamDecoder for BlockStreamDecoder {
    fn decode_line(&mut self, line: &str) -> Result<Vec<StreamEvent>, ProviderError> {
        // `event:` lines duplicate the payload's `type`; only data records matter.
        let Some(data) = sse_data(line) else {
            return Ok(Vec::new());
        };
        if data.is_empty() {
            return Ok(Vec::new());
        }

        let event: serde_json::Value = match serde_json::from_str(data) {
            Ok(v) => v,
            Err(e) => {
                trace!(error = %e, data = %data, "Ignoring unparseable Anthropic SSE");
                return Ok(Vec::new());
            }
        };

        let index = event["index"].as_u64().unwrap_or(0);
        let mut events = Vec::new();

        match event["type"].as_str().unwrap_or("") {
            "content_block_start" => {
                let block = &event["content_block"];
                match block["type"].as_str() {
                    Some("tool_use") => {
                        let pending = PendingToolCall::new(
                            block["id"].as_str().unwrap_or(""),
                            block["name"].as_str().unwrap_or(""),
                        );
                        self.open.insert(index, pending);
                    }
                    Some("text") => {
                        if let Some(text) = block["text"].as_str().filter(|t| !t.is_empty()) {
                            self.full_text.push_str(text);
                            events.push(StreamEvent::TextDelta { text: text.into() });
                        }
                    }
                    _ => {}
                }
            }
            "content_block_delta" => {
                let delta = &event["delta"];
                match delta["type"].as_str().unwrap_or("") {
                    "text_delta" => {
                        if let Some(text) = delta["text"].as_str() {
                            self.full_text.push_str(text);
                            events.push(StreamEvent::TextDelta { text: text.into() });
                        }
                    }
                    "input_json_delta" => {
                        if let (Some(pending), Some(partial)) =
                            (self.open.get_mut(&index), delta["partial_json"].as_str())
                        {
                            pending.push_fragment(partial);
                        }
                    }
                    _ => {}
                }
            }
            "content_block_stop" => {
                if let Some(pending) = self.open.remove(&index) {
                    self.calls.push(pending.finish());
                }
            }
            "message_stop" => self.finished = true,
            "error" => {
                let message = event["error"]["message"]
                    .as_str()
                    .unwrap_or("provider reported an error")
                    .to_string();
                return Err(ProviderError::StreamInterrupted(message));
            }
            other => trace!(event_type = other, "Ignoring Anthropic SSE event"),
        }

        Ok(events)
    }

    fn is_finished(&self) -> bool {
        self.finished
    }

    fn finish(&mut self) -> Vec<StreamEvent> {
        if !self.open.is_empty() {
            warn!(count = self.open.len(), "Discarding tool calls whose blocks never closed");
            self.open.clear();
        }
        finish_turn(
            std::mem::take(&mut self.full_text),
            std::mem::take(&mut self.calls),
        )
    }
}

// --- Anthropic API types ---

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: &'static str,
    content: AnthropicContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum AnthropicContent {
    Text(String),
    Blocks(Vec<WireBlock>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Map<String, serde_json::Value>,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
    },
}

impl From<&ContentBlock> for WireBlock {
    fn from(block: &ContentBlock) -> Self {
        match block {
            ContentBlock::Text { text } => Self::Text { text: text.clone() },
            ContentBlock::ToolUse {
                id,
                name,
                arguments,
            } => Self::ToolUse {
                id: id.clone(),
                name: name.clone(),
                input: arguments.clone(),
            },
            ContentBlock::ToolResult {
                tool_use_id,
                content,
            } => Self::ToolResult {
                tool_use_id: tool_use_id.clone(),
                content: content.clone(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct AnthropicTool {
    name: String,
    description: String,
    input_schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<ResponseContentBlock>,
    #[serde(default)]
    usage: Usage,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponseContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        #[serde(default)]
        input: serde_json::Value,
    },
    #[serde(other)]
    Other,
}
