//! In-memory store: useful for testing and ephemeral sessions.

use async_trait::async_trait;
use pocketclaw_core::error::MemoryError;
use pocketclaw_core::message::{ConversationId, Message};
use pocketclaw_core::store::ConversationStore;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Keeps every conversation in a map. Nothing is trimmed or persisted.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    conversations: Arc<RwLock<HashMap<ConversationId, Vec<Message>>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationStore for InMemoryStore {
    async fn get(&self, id: &ConversationId) -> Result<Vec<Message>, MemoryError> {
        Ok(self
            .conversations
            .read()
            .await
            .get(id)
            .cloned()
            .unwrap_or_default())
    }

    async fn save(&self, id: &ConversationId, messages: &[Message]) -> Result<(), MemoryError> {
        self.conversations
            .write()
            .await
            .insert(id.clone(), messages.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_conversation_is_empty() {
        let store = InMemoryStore::new();
        assert!(store.get(&ConversationId::from("nope")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn save_replaces_history() {
        let store = InMemoryStore::new();
        let id = ConversationId::from("c1");
        store.save(&id, &[Message::user("one")]).await.unwrap();
        store
            .save(&id, &[Message::user("one"), Message::assistant("two")])
            .await
            .unwrap();

        let history = store.get(&id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].text(), "two");
    }

    #[tokio::test]
    async fn clones_share_state() {
        let store = InMemoryStore::new();
        let other = store.clone();
        let id = ConversationId::from("c");
        store.save(&id, &[Message::user("hi")]).await.unwrap();
        assert_eq!(other.get(&id).await.unwrap().len(), 1);
    }
}
