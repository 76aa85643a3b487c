//! File write and in-place edit tools.

use async_trait::async_trait;
use pocketclaw_core::error::ToolError;
use pocketclaw_core::tool::{Arguments, ParamType, Tool, ToolDefinition};
use tracing::debug;

use crate::{expand, required_str};

pub struct FileWriteTool;

#[async_trait]
impl Tool for FileWriteTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "write_file",
            "Write content to a file, creating it and any parent directories. \
             Overwrites the file if it exists.",
        )
        .param("path", ParamType::String, "Path of the file to write", true)
        .param("content", ParamType::String, "Full content to write", true)
    }

    async fn execute(&self, arguments: Arguments) -> Result<String, ToolError> {
        let raw_path = required_str(&arguments, "path")?;
        let content = required_str(&arguments, "content")?;
        let path = expand(raw_path);

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                ToolError::Failed(format!("failed to create {}: {e}", parent.display()))
            })?;
        }

        tokio::fs::write(&path, content)
            .await
            .map_err(|e| ToolError::Failed(format!("failed to write {}: {e}", path.display())))?;

        debug!(path = %path.display(), bytes = content.len(), "Wrote file");
        Ok(format!("Written {} bytes to {raw_path}", content.len()))
    }
}

/// Replaces a unique snippet of a file.
pub struct EditFileTool;

#[async_trait]
impl Tool for EditFileTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "edit_file",
            "Edit a file by replacing one exact occurrence of old_str with new_str. \
             old_str must appear exactly once in the file.",
        )
        .param("path", ParamType::String, "Path of the file to edit", true)
        .param("old_str", ParamType::String, "Exact text to replace", true)
        .param("new_str", ParamType::String, "Replacement text", true)
    }

    async fn execute(&self, arguments: Arguments) -> Result<String, ToolError> {
        let path = expand(required_str(&arguments, "path")?);
        let old_str = required_str(&arguments, "old_str")?;
        let new_str = required_str(&arguments, "new_str")?;

        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| ToolError::Failed(format!("failed to read {}: {e}", path.display())))?;

        match content.matches(old_str).count() {
            0 => return Err(ToolError::Failed("old_str not found in file".into())),
            1 => {}
            n => {
                return Err(ToolError::Failed(format!(
                    "old_str found {n} times (must be unique)"
                )));
            }
        }

        let updated = content.replacen(old_str, new_str, 1);
        tokio::fs::write(&path, updated)
            .await
            .map_err(|e| ToolError::Failed(format!("failed to write {}: {e}", path.display())))?;

        debug!(path = %path.display(), "Edited file");
        Ok("File edited successfully".into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(v: serde_json::Value) -> Arguments {
        v.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn write_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a/b/out.txt");
        let path = file.to_str().unwrap();

        let out = FileWriteTool
            .execute(args(json!({"path": path, "content": "hello"})))
            .await
            .unwrap();
        assert_eq!(out, format!("Written 5 bytes to {path}"));
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "hello");
    }

    #[tokio::test]
    async fn write_requires_content() {
        let err = FileWriteTool
            .execute(args(json!({"path": "/tmp/x"})))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[tokio::test]
    async fn edit_replaces_unique_occurrence() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("main.rs");
        std::fs::write(&file, "fn main() { old(); }").unwrap();

        let out = EditFileTool
            .execute(args(json!({
                "path": file.to_str().unwrap(),
                "old_str": "old()",
                "new_str": "new()"
            })))
            .await
            .unwrap();
        assert_eq!(out, "File edited successfully");
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "fn main() { new(); }");
    }

    #[tokio::test]
    async fn edit_rejects_missing_and_ambiguous() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("dup.txt");
        std::fs::write(&file, "x x").unwrap();
        let path = file.to_str().unwrap();

        let err = EditFileTool
            .execute(args(json!({"path": path, "old_str": "y", "new_str": "z"})))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "old_str not found in file");

        let err = EditFileTool
            .execute(args(json!({"path": path, "old_str": "x", "new_str": "z"})))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "old_str found 2 times (must be unique)");
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "x x");
    }
}
