//! The HTTP connector: the single network-facing `Provider`.
//!
//! Holds one [`WireAdapter`] chosen at construction and a pooled
//! `reqwest::Client`. No retries happen here; a failed call surfaces to the
//! caller as a `ProviderError`.

use async_trait::async_trait;
use pocketclaw_core::error::ProviderError;
use pocketclaw_core::provider::{ChatRequest, EventStream, LlmResponse, Provider};
use tracing::{debug, warn};

use crate::{RequestParams, WireAdapter, sse};

const REQUEST_TIMEOUT_SECS: u64 = 120;
const DEFAULT_RETRY_AFTER_SECS: u64 = 5;
const STREAM_BUFFER: usize = 64;

pub struct LlmConnector {
    name: String,
    adapter: Box<dyn WireAdapter>,
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    params: RequestParams,
}

impl LlmConnector {
    /// Create a connector. `api_key` may be empty for servers that need none.
    pub fn new(
        name: impl Into<String>,
        adapter: Box<dyn WireAdapter>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        params: RequestParams,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {e}")))?;

        Ok(Self {
            name: name.into(),
            adapter,
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            params,
        })
    }

    /// POST the request and map non-2xx statuses to errors.
    async fn send(
        &self,
        request: &ChatRequest,
        stream: bool,
    ) -> Result<reqwest::Response, ProviderError> {
        let url = self.adapter.endpoint(&self.base_url);
        let body = self.adapter.build_request(&self.params, request, stream);

        debug!(
            provider = %self.name,
            model = %self.params.model,
            family = %self.adapter.family(),
            messages = request.messages.len(),
            tools = request.tools.len(),
            stream,
            "Sending request"
        );

        let mut builder = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&body);
        if stream {
            builder = builder.header("Accept", "text/event-stream");
        }
        for (name, value) in self.adapter.auth_headers(&self.api_key) {
            builder = builder.header(name, value);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        check_status(&self.name, response).await
    }
}

async fn check_status(
    provider: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, ProviderError> {
    let status = response.status().as_u16();
    if response.status().is_success() {
        return Ok(response);
    }

    if status == 429 {
        let retry_after_secs = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
        return Err(ProviderError::RateLimited { retry_after_secs });
    }

    let error_body = response.text().await.unwrap_or_default();
    warn!(provider, status, body = %error_body, "Provider API error");

    if status == 401 || status == 403 {
        return Err(ProviderError::AuthenticationFailed(format!(
            "{provider} rejected the API key (status {status})"
        )));
    }
    Err(ProviderError::ApiError {
        status_code: status,
        message: error_body,
    })
}

#[async_trait]
impl Provider for LlmConnector {
    fn name(&self) -> &str {
        &self.name
    }

    async fn chat(&self, request: ChatRequest) -> Result<LlmResponse, ProviderError> {
        let response = self.send(&request, false).await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;
        self.adapter.parse_response(&body)
    }

    async fn chat_stream(&self, request: ChatRequest) -> Result<EventStream, ProviderError> {
        let response = self.send(&request, true).await?;
        let decoder = self.adapter.stream_decoder();
        let (tx, rx) = tokio::sync::mpsc::channel(STREAM_BUFFER);

        tokio::spawn(sse::pump(response.bytes_stream(), decoder, tx));
        Ok(rx)
    }
}
