//! Conversation store trait: where message history lives between turns.

use async_trait::async_trait;

use crate::error::MemoryError;
use crate::message::{ConversationId, Message};

/// Supplies and persists the message history of a conversation.
///
/// The agent loop treats this as an opaque append point: it loads the
/// history, works on its own copy, and saves the whole sequence back.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Ordered history of a conversation; empty if the id is unknown.
    async fn get(&self, id: &ConversationId) -> std::result::Result<Vec<Message>, MemoryError>;

    /// Replace the stored history of a conversation.
    async fn save(
        &self,
        id: &ConversationId,
        messages: &[Message],
    ) -> std::result::Result<(), MemoryError>;
}
