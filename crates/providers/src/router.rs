//! Provider table: maps a provider name to its endpoint root and wire family.
//!
//! A provider missing from the table speaks the delta-style family at the
//! `openai` endpoint unless `llm.base_url` says otherwise.

use std::sync::Arc;

use pocketclaw_config::AppConfig;
use pocketclaw_core::error::ProviderError;
use pocketclaw_core::provider::Provider;
use tracing::debug;

use crate::anthropic::AnthropicAdapter;
use crate::connector::LlmConnector;
use crate::openai_compat::OpenAiAdapter;
use crate::{RequestParams, WireAdapter, WireFamily};

/// One row of the provider table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderSpec {
    pub name: &'static str,
    pub base_url: &'static str,
    pub family: WireFamily,
    /// Whether requests need an API key
    pub needs_key: bool,
}

pub const PROVIDERS: &[ProviderSpec] = &[
    ProviderSpec {
        name: "anthropic",
        base_url: "https://api.anthropic.com",
        family: WireFamily::Block,
        needs_key: true,
    },
    ProviderSpec {
        name: "openai",
        base_url: "https://api.openai.com/v1",
        family: WireFamily::Delta,
        needs_key: true,
    },
    ProviderSpec {
        name: "deepseek",
        base_url: "https://api.deepseek.com/v1",
        family: WireFamily::Delta,
        needs_key: true,
    },
    ProviderSpec {
        name: "google",
        base_url: "https://generativelanguage.googleapis.com/v1beta/openai",
        family: WireFamily::Delta,
        needs_key: true,
    },
    ProviderSpec {
        name: "groq",
        base_url: "https://api.groq.com/openai/v1",
        family: WireFamily::Delta,
        needs_key: true,
    },
    ProviderSpec {
        name: "ollama",
        base_url: "http://localhost:11434/v1",
        family: WireFamily::Delta,
        needs_key: false,
    },
    ProviderSpec {
        name: "openrouter",
        base_url: "https://openrouter.ai/api/v1",
        family: WireFamily::Delta,
        needs_key: true,
    },
];

/// Look up a provider, falling back to the `openai` row for unknown names.
pub fn resolve(name: &str) -> ProviderSpec {
    PROVIDERS
        .iter()
        .find(|p| p.name == name)
        .or_else(|| PROVIDERS.iter().find(|p| p.name == "openai"))
        .copied()
        .unwrap_or(ProviderSpec {
            name: "openai",
            base_url: "https://api.openai.com/v1",
            family: WireFamily::Delta,
            needs_key: true,
        })
}

/// The adapter for a wire family.
pub fn adapter_for(family: WireFamily) -> Box<dyn WireAdapter> {
    match family {
        WireFamily::Block => Box::new(AnthropicAdapter),
        WireFamily::Delta => Box::new(OpenAiAdapter),
    }
}

/// Build the configured provider.
pub fn build_from_config(config: &AppConfig) -> Result<Arc<dyn Provider>, ProviderError> {
    let llm = &config.llm;
    let spec = resolve(&llm.provider);
    let base_url = llm.base_url.clone().unwrap_or_else(|| spec.base_url.into());
    let api_key = llm.api_key.clone().unwrap_or_default();

    // A custom base URL usually means a local or proxy server; let it decide.
    if api_key.is_empty() && spec.needs_key && llm.base_url.is_none() {
        return Err(ProviderError::NotConfigured(format!(
            "no API key for '{}'; set llm.api_key or one of ANTHROPIC_API_KEY, OPENAI_API_KEY, \
             DEEPSEEK_API_KEY, GROQ_API_KEY, GOOGLE_API_KEY",
            llm.provider
        )));
    }

    debug!(provider = %llm.provider, family = %spec.family, %base_url, "Building provider");

    let connector = LlmConnector::new(
        llm.provider.clone(),
        adapter_for(spec.family),
        base_url,
        api_key,
        RequestParams {
            model: llm.model.clone(),
            max_tokens: llm.max_tokens,
            temperature: llm.temperature,
        },
    )?;
    Ok(Arc::new(connector))
}
