//! `pocketclaw ask`: single-shot mode.

use std::path::Path;

use pocketclaw_core::message::ConversationId;

pub async fn run(config_path: &Path, message: &str, conversation: &str) -> anyhow::Result<()> {
    let (config, agent) = super::build_agent(config_path)?;
    let id = ConversationId::from(conversation);

    let reply = agent
        .handle_message(&id, &config.agent.system_prompt, message)
        .await?;
    println!("{reply}");
    Ok(())
}
