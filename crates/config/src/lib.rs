//! Configuration loading, validation, and management for PocketClaw.
//!
//! Loads configuration from `~/.pocketclaw/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Vendor API key variables checked when no key is configured, in priority
/// order, with the provider and model each one selects.
pub const ENV_KEYS: &[(&str, &str, &str)] = &[
    ("ANTHROPIC_API_KEY", "anthropic", "claude-sonnet-4-20250514"),
    ("OPENAI_API_KEY", "openai", "gpt-4o"),
    ("DEEPSEEK_API_KEY", "deepseek", "deepseek-chat"),
    ("GROQ_API_KEY", "groq", "llama-3.3-70b-versatile"),
    ("GOOGLE_API_KEY", "google", "gemini-2.0-flash"),
];

const DEFAULT_SYSTEM_PROMPT: &str = "You are PocketClaw, a personal AI assistant running in a terminal.\n\
Use the available tools to act on the user's machine: run shell commands, read, write and edit files, list directories.\n\
Be concise. Execute tasks directly. If a tool fails, try an alternative approach. \
Show command output unless excessively long.";

/// The root configuration structure.
///
/// Maps directly to `~/.pocketclaw/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Model backend settings
    #[serde(default)]
    pub llm: LlmConfig,

    /// Conversation storage
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Agent loop bounds and prompt
    #[serde(default)]
    pub agent: AgentSettings,

    /// Terminal output preferences
    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Key into the provider table (e.g. "anthropic", "groq")
    #[serde(default = "default_provider")]
    pub provider: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Max tokens per model response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Overrides the provider table's endpoint root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

fn default_provider() -> String {
    "anthropic".into()
}
fn default_model() -> String {
    "claude-sonnet-4-20250514".into()
}
fn default_max_tokens() -> u32 {
    4096
}
fn default_temperature() -> f32 {
    0.3
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            api_key: None,
            base_url: None,
        }
    }
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Root directory for stored conversations (`~` is expanded)
    #[serde(default = "default_memory_path")]
    pub path: String,

    /// How many trailing messages are replayed to the model
    #[serde(default = "default_max_conversation_messages")]
    pub max_conversation_messages: usize,
}

fn default_memory_path() -> String {
    "~/.pocketclaw/memory".into()
}
fn default_max_conversation_messages() -> usize {
    50
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            path: default_memory_path(),
            max_conversation_messages: default_max_conversation_messages(),
        }
    }
}

impl MemoryConfig {
    pub fn resolved_path(&self) -> PathBuf {
        expand_home(&self.path)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSettings {
    /// Model calls allowed per user message
    #[serde(default = "default_max_tool_iterations")]
    pub max_tool_iterations: u32,

    /// Per-tool execution timeout
    #[serde(default = "default_tool_timeout_secs")]
    pub tool_timeout_secs: u64,

    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

fn default_max_tool_iterations() -> u32 {
    50
}
fn default_tool_timeout_secs() -> u64 {
    30
}
fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.into()
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_tool_iterations: default_max_tool_iterations(),
            tool_timeout_secs: default_tool_timeout_secs(),
            system_prompt: default_system_prompt(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_true")]
    pub streaming: bool,

    #[serde(default = "default_true")]
    pub show_tool_calls: bool,
}

fn default_true() -> bool {
    true
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            streaming: true,
            show_tool_calls: true,
        }
    }
}

impl AppConfig {
    /// Default config file location, `~/.pocketclaw/config.toml`.
    pub fn default_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load from `path`, then apply environment overrides.
    ///
    /// Priority (highest first):
    /// 1. `POCKETCLAW_*` environment variables
    /// 2. Config file
    /// 3. Vendor `*_API_KEY` detection when no key is configured
    /// 4. Built-in defaults
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_env(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path, without consulting
    /// the environment.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment-derived settings using `lookup` to read variables.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if self.llm.api_key.is_none() {
            if let Some(key) = lookup("POCKETCLAW_API_KEY") {
                self.llm.api_key = Some(key);
            } else if let Some((var, key, provider, model)) = ENV_KEYS
                .iter()
                .find_map(|(var, p, m)| lookup(var).map(|k| (*var, k, *p, *m)))
            {
                tracing::debug!(var, provider, "Detected API key from environment");
                self.llm.api_key = Some(key);
                self.llm.provider = provider.into();
                self.llm.model = model.into();
            }
        }

        if let Some(provider) = lookup("POCKETCLAW_PROVIDER") {
            self.llm.provider = provider;
        }
        if let Some(model) = lookup("POCKETCLAW_MODEL") {
            self.llm.model = model;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".pocketclaw")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ConfigError::ValidationError(
                "llm.temperature must be between 0.0 and 2.0".into(),
            ));
        }
        if self.llm.max_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "llm.max_tokens must be at least 1".into(),
            ));
        }
        if self.agent.max_tool_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_tool_iterations must be at least 1".into(),
            ));
        }
        if self.agent.tool_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "agent.tool_timeout_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Generate a default config TOML string (for `config init`).
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if path == "~" {
        return dirs_home();
    }
    match path.strip_prefix("~/") {
        Some(rest) => dirs_home().join(rest),
        None => PathBuf::from(path),
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.llm.provider, "anthropic");
        assert_eq!(config.llm.max_tokens, 4096);
        assert_eq!(config.agent.max_tool_iterations, 50);
        assert_eq!(config.agent.tool_timeout_secs, 30);
        assert_eq!(config.memory.max_conversation_messages, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.llm.model, config.llm.model);
        assert_eq!(parsed.agent.system_prompt, config.agent.system_prompt);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let mut config = AppConfig::default();
        config.llm.temperature = 5.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_iterations_rejected() {
        let mut config = AppConfig::default();
        config.agent.max_tool_iterations = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.llm.provider, "anthropic");
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[llm]\nprovider = \"groq\"\n\n[agent]\nmax_tool_iterations = 3\n")
            .unwrap();
        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.llm.provider, "groq");
        assert_eq!(config.llm.max_tokens, 4096);
        assert_eq!(config.agent.max_tool_iterations, 3);
        assert_eq!(config.agent.tool_timeout_secs, 30);
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[llm\nprovider = ").unwrap();
        assert!(matches!(
            AppConfig::load_from(&path),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn env_key_detection_follows_priority() {
        let mut config = AppConfig::default();
        config.apply_env(env(&[("GROQ_API_KEY", "gk"), ("OPENAI_API_KEY", "ok")]));
        assert_eq!(config.llm.api_key.as_deref(), Some("ok"));
        assert_eq!(config.llm.provider, "openai");
        assert_eq!(config.llm.model, "gpt-4o");
    }

    #[test]
    fn configured_key_is_not_replaced() {
        let mut config = AppConfig::default();
        config.llm.api_key = Some("from-file".into());
        config.apply_env(env(&[("DEEPSEEK_API_KEY", "dk")]));
        assert_eq!(config.llm.api_key.as_deref(), Some("from-file"));
        assert_eq!(config.llm.provider, "anthropic");
    }

    #[test]
    fn explicit_overrides_win() {
        let mut config = AppConfig::default();
        config.apply_env(env(&[
            ("GOOGLE_API_KEY", "g"),
            ("POCKETCLAW_PROVIDER", "openrouter"),
            ("POCKETCLAW_MODEL", "meta/llama"),
        ]));
        assert_eq!(config.llm.api_key.as_deref(), Some("g"));
        assert_eq!(config.llm.provider, "openrouter");
        assert_eq!(config.llm.model, "meta/llama");
    }

    #[test]
    fn api_key_is_redacted_in_debug() {
        let mut config = AppConfig::default();
        config.llm.api_key = Some("sk-secret".into());
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("[llm]"));
        assert!(toml_str.contains("claude-sonnet-4-20250514"));
        assert!(!toml_str.contains("api_key"));
    }

    #[test]
    fn home_expansion() {
        assert_eq!(expand_home("/abs/path"), PathBuf::from("/abs/path"));
        assert!(expand_home("~/x").ends_with("x"));
    }

    #[test]
    fn default_path_is_under_config_dir() {
        let path = AppConfig::default_path();
        assert!(path.ends_with(".pocketclaw/config.toml"));
        assert!(path.starts_with(AppConfig::config_dir()));
    }
}
