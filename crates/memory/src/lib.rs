//! Conversation store implementations for PocketClaw.

pub mod file_store;
pub mod in_memory;

pub use file_store::FileStore;
pub use in_memory::InMemoryStore;

use pocketclaw_core::message::{Message, Role};

/// Keep at most `max` trailing messages, then drop leading messages until
/// the window starts at a plain user message.
///
/// A window must never begin with an assistant turn or a tool-result
/// carrier: the model would see results with no matching tool use.
pub fn trim_history(mut messages: Vec<Message>, max: usize) -> Vec<Message> {
    if messages.len() > max {
        messages.drain(..messages.len() - max);
    }
    let start = messages
        .iter()
        .position(|m| m.role == Role::User && !m.is_tool_result_carrier())
        .unwrap_or(messages.len());
    messages.drain(..start);
    messages
}
