//! `pocketclaw chat`: interactive REPL.

use std::io::Write;
use std::path::Path;

use pocketclaw_agent::{AgentLoop, AgentStreamEvent};
use pocketclaw_config::AppConfig;
use pocketclaw_core::message::ConversationId;
use tokio::io::{AsyncBufReadExt, BufReader};

pub async fn run(config_path: &Path, conversation: &str, no_stream: bool) -> anyhow::Result<()> {
    let (config, agent) = super::build_agent(config_path)?;
    let id = ConversationId::from(conversation);
    let streaming = config.display.streaming && !no_stream;

    println!();
    println!("  PocketClaw — {} / {}", config.llm.provider, config.llm.model);
    println!("  Conversation: {id}");
    println!("  Type 'exit' or Ctrl+D to quit.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if matches!(input, "exit" | "quit") {
            break;
        }

        if streaming {
            stream_turn(&agent, &config, &id, input).await?;
        } else {
            match agent
                .handle_message(&id, &config.agent.system_prompt, input)
                .await
            {
                Ok(reply) => {
                    println!();
                    for line in reply.lines() {
                        println!("  Assistant > {line}");
                    }
                    println!();
                }
                Err(e) => eprintln!("  [Error] {e}\n"),
            }
        }
    }

    println!();
    println!("  Goodbye!");
    Ok(())
}

async fn stream_turn(
    agent: &AgentLoop,
    config: &AppConfig,
    id: &ConversationId,
    input: &str,
) -> anyhow::Result<()> {
    let mut rx = agent.handle_message_stream(
        id.clone(),
        config.agent.system_prompt.clone(),
        input.to_string(),
    );

    print!("\n  Assistant > ");
    std::io::stdout().flush()?;
    while let Some(event) = rx.recv().await {
        let terminal = event.is_terminal();
        match event {
            AgentStreamEvent::Chunk { content } => {
                print!("{content}");
                std::io::stdout().flush()?;
            }
            AgentStreamEvent::ToolCall { name, input, .. } if config.display.show_tool_calls => {
                println!("\n  [tool] {name} {input}");
            }
            AgentStreamEvent::ToolResult { name, success, .. } if config.display.show_tool_calls => {
                let status = if success { "ok" } else { "failed" };
                print!("  [tool] {name} {status}\n  Assistant > ");
                std::io::stdout().flush()?;
            }
            AgentStreamEvent::Done { text, completed, .. } => {
                if !completed {
                    print!("{text}");
                }
                println!("\n");
            }
            AgentStreamEvent::Error { message } => {
                eprintln!("\n  [Error] {message}\n");
            }
            _ => {}
        }
        if terminal {
            break;
        }
    }
    Ok(())
}
