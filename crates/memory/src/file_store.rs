//! File-based conversation store: one JSON file per conversation.
//!
//! Storage location: `<root>/conversations/<id>.json`, pretty-printed so the
//! history stays human-inspectable.

use async_trait::async_trait;
use pocketclaw_core::error::MemoryError;
use pocketclaw_core::message::{ConversationId, Message};
use pocketclaw_core::store::ConversationStore;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::trim_history;

pub struct FileStore {
    dir: PathBuf,
    max_messages: usize,
}

impl FileStore {
    /// Store rooted at `root`; `get` replays at most `max_messages` messages.
    pub fn new(root: impl AsRef<Path>, max_messages: usize) -> Self {
        Self {
            dir: root.as_ref().join("conversations"),
            max_messages: max_messages.max(1),
        }
    }

    /// Path of a conversation's file. Ids are reduced to a safe file name.
    pub fn path_for(&self, id: &ConversationId) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize(id.as_str())))
    }
}

fn sanitize(id: &str) -> String {
    let name: String = id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if name.is_empty() { "_".into() } else { name }
}

#[async_trait]
impl ConversationStore for FileStore {
    async fn get(&self, id: &ConversationId) -> Result<Vec<Message>, MemoryError> {
        let path = self.path_for(id);
        let content = match tokio::fs::read(&path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(MemoryError::Storage(format!(
                    "Failed to read {}: {e}",
                    path.display()
                )));
            }
        };

        let messages: Vec<Message> = serde_json::from_slice(&content).map_err(|e| {
            MemoryError::Serialization(format!("Corrupted conversation {}: {e}", path.display()))
        })?;
        let total = messages.len();
        let messages = trim_history(messages, self.max_messages);
        debug!(conversation = %id, total, replayed = messages.len(), "Loaded conversation");
        Ok(messages)
    }

    async fn save(&self, id: &ConversationId, messages: &[Message]) -> Result<(), MemoryError> {
        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            MemoryError::Storage(format!("Failed to create conversation directory: {e}"))
        })?;

        let content = serde_json::to_vec_pretty(messages)
            .map_err(|e| MemoryError::Serialization(e.to_string()))?;

        // Write-then-rename so a crash never leaves a truncated file.
        let path = self.path_for(id);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &content)
            .await
            .map_err(|e| MemoryError::Storage(format!("Failed to write conversation: {e}")))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| MemoryError::Storage(format!("Failed to write conversation: {e}")))?;

        debug!(conversation = %id, count = messages.len(), "Saved conversation");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pocketclaw_core::message::ContentBlock;
    use pocketclaw_core::tool::ToolCall;

    #[tokio::test]
    async fn roundtrip_preserves_blocks() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path(), 50);
        let id = ConversationId::from("chat-1");

        let mut args = serde_json::Map::new();
        args.insert("path".into(), ".".into());
        let call = ToolCall::new("t1", "list_directory", args);
        let history = vec![
            Message::user("list files"),
            Message::assistant_with_tool_calls(Some("Looking"), &[call]),
            Message::tool_results(vec![("t1", "a.txt\nb.txt".to_string())]),
            Message::assistant("Found 2 files."),
        ];
        store.save(&id, &history).await.unwrap();
        assert!(dir.path().join("conversations/chat-1.json").exists());

        let loaded = store.get(&id).await.unwrap();
        assert_eq!(loaded.len(), 4);
        assert_eq!(loaded[1].content, history[1].content);
        assert!(matches!(
            &loaded[2].blocks()[0],
            ContentBlock::ToolResult { tool_use_id, .. } if tool_use_id == "t1"
        ));
    }

    #[tokio::test]
    async fn unknown_conversation_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path(), 50);
        assert!(store.get(&ConversationId::from("missing")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn get_trims_to_max_messages() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path(), 3);
        let id = ConversationId::from("long");
        let history: Vec<Message> = (0..5)
            .flat_map(|i| [Message::user(format!("q{i}")), Message::assistant(format!("a{i}"))])
            .collect();
        store.save(&id, &history).await.unwrap();

        // Last three are a3, q4, a4; the window starts at q4.
        let loaded = store.get(&id).await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].text(), "q4");
    }

    #[tokio::test]
    async fn corrupted_file_is_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path(), 50);
        let id = ConversationId::from("bad");
        std::fs::create_dir_all(dir.path().join("conversations")).unwrap();
        std::fs::write(store.path_for(&id), "[{not json").unwrap();
        assert!(matches!(
            store.get(&id).await,
            Err(MemoryError::Serialization(_))
        ));
    }

    #[test]
    fn ids_are_sanitized() {
        let store = FileStore::new("/tmp/pc", 10);
        let path = store.path_for(&ConversationId::from("../../etc/passwd"));
        assert_eq!(path, PathBuf::from("/tmp/pc/conversations/______etc_passwd.json"));
        assert_eq!(sanitize(""), "_");
    }
}
