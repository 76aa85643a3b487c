//! Subcommand implementations.

pub mod ask;
pub mod chat;
pub mod config_cmd;
pub mod providers;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use pocketclaw_agent::AgentLoop;
use pocketclaw_config::AppConfig;
use pocketclaw_memory::FileStore;

/// Load the config and wire provider, tools and store into an agent.
pub fn build_agent(config_path: &Path) -> anyhow::Result<(AppConfig, AgentLoop)> {
    let config = AppConfig::load_with_env(config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    let provider = pocketclaw_providers::build_from_config(&config)?;
    let tools = Arc::new(pocketclaw_tools::default_registry(&config));
    let store = Arc::new(FileStore::new(
        config.memory.resolved_path(),
        config.memory.max_conversation_messages,
    ));

    tracing::debug!(
        provider = %config.llm.provider,
        model = %config.llm.model,
        tools = tools.len(),
        "Agent ready"
    );
    let agent = AgentLoop::new(provider, tools, store)
        .with_max_iterations(config.agent.max_tool_iterations)
        .with_tool_timeout(Duration::from_secs(config.agent.tool_timeout_secs));
    Ok((config, agent))
}
