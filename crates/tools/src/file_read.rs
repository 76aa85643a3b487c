//! File read tool.

use async_trait::async_trait;
use pocketclaw_core::error::ToolError;
use pocketclaw_core::tool::{Arguments, ParamType, Tool, ToolDefinition};
use tracing::debug;

use crate::{expand, optional_u64, required_str};

pub struct FileReadTool;

#[async_trait]
impl Tool for FileReadTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "read_file",
            "Read the contents of a text file. Optionally limit to the first N lines.",
        )
        .param("path", ParamType::String, "Path of the file to read", true)
        .param("max_lines", ParamType::Number, "Only return the first N lines", false)
    }

    async fn execute(&self, arguments: Arguments) -> Result<String, ToolError> {
        let path = expand(required_str(&arguments, "path")?);
        debug!(path = %path.display(), "Reading file");

        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| ToolError::Failed(format!("failed to read {}: {e}", path.display())))?;

        let Some(limit) = optional_u64(&arguments, "max_lines") else {
            return Ok(content);
        };
        let limit = limit as usize;
        let total = content.lines().count();
        let mut out = content.lines().take(limit).collect::<Vec<_>>().join("\n");
        if total > limit {
            out.push_str(&format!("\n... ({} more lines)", total - limit));
        }
        Ok(out)
    }
}
