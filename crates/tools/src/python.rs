//! Python tool: run a snippet with the system interpreter.

use async_trait::async_trait;
use pocketclaw_core::error::ToolError;
use pocketclaw_core::tool::{Arguments, ParamType, Tool, ToolDefinition};
use tokio::process::Command;
use tracing::debug;

use crate::shell::run_command;
use crate::{optional_u64, required_str};

const INTERPRETER: &str = "python3";

/// Runs Python code with `python3 -c` and reports it like a shell command.
pub struct PythonTool {
    default_timeout_secs: u64,
}

impl PythonTool {
    pub fn new(default_timeout_secs: u64) -> Self {
        Self {
            default_timeout_secs: default_timeout_secs.max(1),
        }
    }
}

#[async_trait]
impl Tool for PythonTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "run_python",
            "Execute Python code and return its output. Print anything you want to see.",
        )
        .param("code", ParamType::String, "Python source to run", true)
        .param("timeout", ParamType::Number, "Seconds before the interpreter is killed", false)
    }

    async fn execute(&self, arguments: Arguments) -> Result<String, ToolError> {
        let code = required_str(&arguments, "code")?;
        let timeout_secs = optional_u64(&arguments, "timeout").unwrap_or(self.default_timeout_secs);

        debug!(bytes = code.len(), "Executing python snippet");

        let mut cmd = Command::new(INTERPRETER);
        cmd.args(["-c", code]);
        run_command(cmd, INTERPRETER, timeout_secs).await
    }
}
