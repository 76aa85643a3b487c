//! HTTP request tool backed by `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use pocketclaw_core::error::ToolError;
use pocketclaw_core::tool::{Arguments, ParamType, Tool, ToolDefinition};
use reqwest::Method;
use tracing::{debug, warn};

use crate::{optional_str, optional_u64, required_str};

const DEFAULT_TIMEOUT_SECS: u64 = 15;
/// Response bodies are cut to this many characters.
const MAX_BODY_CHARS: usize = 5000;

/// Sends one HTTP request and returns `HTTP <status>` followed by the body.
pub struct HttpRequestTool {
    client: reqwest::Client,
}

impl HttpRequestTool {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpRequestTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for HttpRequestTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "http_request",
            "Make an HTTP request to a URL. Returns the status code and the response body.",
        )
        .param("url", ParamType::String, "The URL to send the request to", true)
        .param("method", ParamType::String, "HTTP method, defaults to GET", false)
        .param("headers", ParamType::Object, "HTTP headers as key-value pairs", false)
        .param("body", ParamType::String, "Request body", false)
        .param("timeout", ParamType::Number, "Seconds before the request is abandoned", false)
    }

    async fn execute(&self, arguments: Arguments) -> Result<String, ToolError> {
        let url = required_str(&arguments, "url")?;
        let method = optional_str(&arguments, "method").unwrap_or("GET").to_uppercase();
        let method = Method::from_bytes(method.as_bytes())
            .map_err(|_| ToolError::InvalidArguments(format!("invalid HTTP method: {method}")))?;
        let timeout_secs = optional_u64(&arguments, "timeout").unwrap_or(DEFAULT_TIMEOUT_SECS);

        debug!(%method, url, "Sending HTTP request");

        let mut request = self
            .client
            .request(method, url)
            .timeout(Duration::from_secs(timeout_secs.max(1)));
        if let Some(headers) = arguments.get("headers").and_then(|h| h.as_object()) {
            for (name, value) in headers {
                let value = match value {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                request = request.header(name.as_str(), value);
            }
        }
        if let Some(body) = optional_str(&arguments, "body") {
            request = request.body(body.to_string());
        }

        let response = request.send().await.map_err(|e| {
            warn!(url, error = %e, "HTTP request failed");
            ToolError::Failed(format!("request failed: {e}"))
        })?;
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| ToolError::Failed(format!("failed to read response body: {e}")))?;

        let body: String = text.chars().take(MAX_BODY_CHARS).collect();
        Ok(format!("HTTP {status}\n{body}"))
    }
}
