//! `pocketclaw config`: Configuration management commands.

use std::path::Path;

use anyhow::Context;
use pocketclaw_config::AppConfig;

pub fn show(config_path: &Path) -> anyhow::Result<()> {
    let mut config = AppConfig::load_with_env(config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;
    if config.llm.api_key.is_some() {
        config.llm.api_key = Some("[REDACTED]".into());
    }
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

pub fn path(config_path: &Path) {
    println!("{}", config_path.display());
}

pub fn init(config_path: &Path) -> anyhow::Result<()> {
    if config_path.exists() {
        println!("Config already exists at {}", config_path.display());
        return Ok(());
    }
    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(config_path, AppConfig::default_toml())
        .with_context(|| format!("failed to write {}", config_path.display()))?;
    println!("Wrote default config to {}", config_path.display());
    Ok(())
}
