//! LLM provider plumbing for PocketClaw.
//!
//! One [`LlmConnector`] speaks HTTP; a [`WireAdapter`] chosen once at
//! construction translates between the canonical model and one of two wire
//! families. The router maps a provider name to its endpoint and family.

pub mod accumulator;
pub mod anthropic;
pub mod connector;
pub mod openai_compat;
pub mod router;
pub mod schema;
pub mod sse;

use pocketclaw_core::error::ProviderError;
use pocketclaw_core::provider::{ChatRequest, LlmResponse, StreamEvent};

pub use anthropic::AnthropicAdapter;
pub use connector::LlmConnector;
pub use openai_compat::OpenAiAdapter;
pub use router::{PROVIDERS, ProviderSpec, build_from_config};

/// The two wire protocol families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireFamily {
    /// Typed content blocks, top-level `system` (Anthropic Messages API)
    Block,
    /// Index-addressed deltas, `system` as the first message (OpenAI chat completions)
    Delta,
}

impl std::fmt::Display for WireFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Block => f.pad("block"),
            Self::Delta => f.pad("delta"),
        }
    }
}

/// Per-connector generation settings sent with every request.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestParams {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Translation between the canonical model and one wire family.
pub trait WireAdapter: Send + Sync {
    fn family(&self) -> WireFamily;

    /// Full request URL for the given endpoint root.
    fn endpoint(&self, base_url: &str) -> String;

    /// Authentication headers for `api_key`.
    fn auth_headers(&self, api_key: &str) -> Vec<(&'static str, String)>;

    /// Wire request body. The `tools` field is omitted when no tools are declared.
    fn build_request(
        &self,
        params: &RequestParams,
        request: &ChatRequest,
        stream: bool,
    ) -> serde_json::Value;

    /// Decode a complete (non-streaming) response body.
    fn parse_response(&self, body: &[u8]) -> Result<LlmResponse, ProviderError>;

    /// A fresh decoder for one streamed response.
    fn stream_decoder(&self) -> Box<dyn StreamDecoder>;
}

/// Incremental decoder for one streamed response, fed one SSE line at a time.
pub trait StreamDecoder: Send {
    /// Decode a single line (without its line terminator). Lines that are
    /// not data records, or whose payload is not understood, yield nothing.
    fn decode_line(&mut self, line: &str) -> Result<Vec<StreamEvent>, ProviderError>;

    /// True once the vendor's end-of-stream marker has been seen.
    fn is_finished(&self) -> bool;

    /// Close the turn: `ToolCallsReady` if any calls completed, then `Done`.
    fn finish(&mut self) -> Vec<StreamEvent>;
}

/// Payload of an SSE `data:` line, if this is one.
pub(crate) fn sse_data(line: &str) -> Option<&str> {
    line.strip_prefix("data:").map(str::trim)
}
