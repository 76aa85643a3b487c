//! Confirmation tool: lets the model flag a risky action to the user.

use async_trait::async_trait;
use pocketclaw_core::error::ToolError;
use pocketclaw_core::tool::{Arguments, ParamType, Tool, ToolDefinition};
use tracing::info;

use crate::{optional_str, required_str};

/// Surfaces the action in the transcript; the user answers in their next turn.
pub struct ConfirmTool;

#[async_trait]
impl Tool for ConfirmTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "confirm",
            "Ask user to confirm before destructive or sensitive actions.",
        )
        .param("action", ParamType::String, "What you are about to do", true)
        .param("risk_level", ParamType::String, "'low', 'medium', or 'high'", false)
    }

    async fn execute(&self, arguments: Arguments) -> Result<String, ToolError> {
        let action = required_str(&arguments, "action")?;
        let risk = optional_str(&arguments, "risk_level").unwrap_or("medium");
        info!(action, risk, "Confirmation requested");
        Ok(format!("Confirmation needed: {action} (risk: {risk})"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn risk_defaults_to_medium() {
        let args = json!({"action": "delete build/"}).as_object().cloned().unwrap();
        let out = ConfirmTool.execute(args).await.unwrap();
        assert_eq!(out, "Confirmation needed: delete build/ (risk: medium)");
    }

    #[tokio::test]
    async fn explicit_risk_is_echoed() {
        let args = json!({"action": "rm -rf ~", "risk_level": "high"})
            .as_object()
            .cloned()
            .unwrap();
        let out = ConfirmTool.execute(args).await.unwrap();
        assert_eq!(out, "Confirmation needed: rm -rf ~ (risk: high)");
    }
}
