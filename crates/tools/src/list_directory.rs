//! Directory listing tool.

use std::path::Path;

use async_trait::async_trait;
use pocketclaw_core::error::ToolError;
use pocketclaw_core::tool::{Arguments, ParamType, Tool, ToolDefinition};

use crate::{expand, optional_bool, optional_str, optional_u64};

pub struct ListDirectoryTool;

#[async_trait]
impl Tool for ListDirectoryTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "list_directory",
            "List the files and directories at a path. Directories end with '/'.",
        )
        .param("path", ParamType::String, "Directory to list (default: current)", false)
        .param("recursive", ParamType::Boolean, "Descend into subdirectories", false)
        .param("max_depth", ParamType::Number, "Depth limit when recursive (default: 2)", false)
    }

    async fn execute(&self, arguments: Arguments) -> Result<String, ToolError> {
        let path = expand(optional_str(&arguments, "path").unwrap_or("."));
        let recursive = optional_bool(&arguments, "recursive").unwrap_or(false);
        let max_depth = optional_u64(&arguments, "max_depth").unwrap_or(2) as usize;

        let meta = tokio::fs::metadata(&path)
            .await
            .map_err(|e| ToolError::Failed(format!("cannot access {}: {e}", path.display())))?;
        if !meta.is_dir() {
            return Err(ToolError::Failed(format!(
                "{} is not a directory",
                path.display()
            )));
        }

        let depth_limit = if recursive { max_depth.max(1) } else { 1 };
        let lines = walk(&path, depth_limit).await?;

        if lines.is_empty() {
            Ok("(empty directory)".into())
        } else {
            Ok(lines.join("\n"))
        }
    }
}

/// Depth-first listing, each directory's entries sorted and indented two
/// spaces per level. Descends while `depth + 1 < limit`.
async fn walk(root: &Path, limit: usize) -> Result<Vec<String>, ToolError> {
    let mut lines = Vec::new();
    let mut stack = vec![(root.to_path_buf(), 0, read_sorted(root).await?.into_iter())];

    while let Some((dir, depth, entries)) = stack.last_mut() {
        let Some((name, is_dir)) = entries.next() else {
            stack.pop();
            continue;
        };
        let indent = "  ".repeat(*depth);
        if !is_dir {
            lines.push(format!("{indent}{name}"));
            continue;
        }
        lines.push(format!("{indent}{name}/"));
        if *depth + 1 < limit {
            let child = dir.join(&name);
            let child_depth = *depth + 1;
            let child_entries = read_sorted(&child).await?.into_iter();
            stack.push((child, child_depth, child_entries));
        }
    }
    Ok(lines)
}

/// `(name, is_dir)` for every entry of `dir`, sorted by name.
async fn read_sorted(dir: &Path) -> Result<Vec<(String, bool)>, ToolError> {
    let read_error = |e: std::io::Error| ToolError::Failed(format!("cannot read {}: {e}", dir.display()));
    let mut reader = tokio::fs::read_dir(dir).await.map_err(read_error)?;

    let mut entries = Vec::new();
    while let Some(entry) = reader.next_entry().await.map_err(read_error)? {
        let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
        entries.push((entry.file_name().to_string_lossy().into_owned(), is_dir));
    }
    entries.sort();
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(v: serde_json::Value) -> Arguments {
        v.as_object().cloned().unwrap()
    }

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.txt"), "").unwrap();
        std::fs::write(dir.path().join("a.txt"), "").unwrap();
        std::fs::create_dir_all(dir.path().join("src/deep/deeper")).unwrap();
        std::fs::write(dir.path().join("src/lib.rs"), "").unwrap();
        dir
    }

    #[tokio::test]
    async fn flat_listing_is_sorted() {
        let dir = fixture();
        let out = ListDirectoryTool
            .execute(args(json!({"path": dir.path().to_str().unwrap()})))
            .await
            .unwrap();
        assert_eq!(out, "a.txt\nb.txt\nsrc/");
    }

    #[tokio::test]
    async fn recursive_listing_respects_depth() {
        let dir = fixture();
        let out = ListDirectoryTool
            .execute(args(json!({
                "path": dir.path().to_str().unwrap(),
                "recursive": true,
                "max_depth": 2
            })))
            .await
            .unwrap();
        assert_eq!(out, "a.txt\nb.txt\nsrc/\n  deep/\n  lib.rs");
    }

    #[tokio::test]
    async fn empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = ListDirectoryTool
            .execute(args(json!({"path": dir.path().to_str().unwrap()})))
            .await
            .unwrap();
        assert_eq!(out, "(empty directory)");
    }

    #[tokio::test]
    async fn file_path_is_rejected() {
        let dir = fixture();
        let file = dir.path().join("a.txt");
        let err = ListDirectoryTool
            .execute(args(json!({"path": file.to_str().unwrap()})))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("is not a directory"));
    }
}
