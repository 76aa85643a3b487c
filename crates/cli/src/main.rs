//! PocketClaw CLI: the main entry point.
//!
//! Commands:
//! - `ask`: send one message and print the reply
//! - `chat`: interactive conversation
//! - `providers`: list supported LLM providers
//! - `config`: show, locate or initialize the config file

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "pocketclaw",
    about = "PocketClaw — a personal assistant agent for the terminal",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the config file (default: ~/.pocketclaw/config.toml)
    #[arg(long, global = true, env = "POCKETCLAW_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a single message and print the reply
    Ask {
        /// The message to send
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,

        /// Continue a stored conversation
        #[arg(short, long, default_value = "default")]
        conversation: String,
    },

    /// Chat with the agent interactively
    Chat {
        /// Conversation to resume
        #[arg(short, long, default_value = "default")]
        conversation: String,

        /// Wait for complete replies instead of streaming
        #[arg(long)]
        no_stream: bool,
    },

    /// List supported LLM providers
    Providers,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration (API key redacted)
    Show,
    /// Print the config file path
    Path,
    /// Write a default config file if none exists
    Init,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so replies on stdout stay pipeable.
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config_path = cli
        .config
        .unwrap_or_else(pocketclaw_config::AppConfig::default_path);

    match cli.command {
        Commands::Ask {
            message,
            conversation,
        } => commands::ask::run(&config_path, &message.join(" "), &conversation).await?,
        Commands::Chat {
            conversation,
            no_stream,
        } => commands::chat::run(&config_path, &conversation, no_stream).await?,
        Commands::Providers => commands::providers::run(),
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show(&config_path)?,
            ConfigAction::Path => commands::config_cmd::path(&config_path),
            ConfigAction::Init => commands::config_cmd::init(&config_path)?,
        },
    }

    Ok(())
}
