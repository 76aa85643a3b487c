//! Shell tool: execute system commands.

use std::time::Duration;

use async_trait::async_trait;
use pocketclaw_core::error::ToolError;
use pocketclaw_core::tool::{Arguments, ParamType, Tool, ToolDefinition};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::{expand, optional_str, optional_u64, required_str};

/// Runs a command through the platform shell and reports its output and
/// exit code.
pub struct ShellTool {
    default_timeout_secs: u64,
}

impl ShellTool {
    pub fn new(default_timeout_secs: u64) -> Self {
        Self {
            default_timeout_secs: default_timeout_secs.max(1),
        }
    }
}

#[async_trait]
impl Tool for ShellTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "run_shell",
            "Execute a shell command and return stdout, stderr and the exit code. \
             Use this for running programs, inspecting the system, git operations, etc.",
        )
        .param("command", ParamType::String, "The shell command to execute", true)
        .param("working_dir", ParamType::String, "Directory to run the command in", false)
        .param("timeout", ParamType::Number, "Seconds before the command is killed", false)
    }

    async fn execute(&self, arguments: Arguments) -> Result<String, ToolError> {
        let command = required_str(&arguments, "command")?;
        let timeout_secs = optional_u64(&arguments, "timeout").unwrap_or(self.default_timeout_secs);

        debug!(command = %command, "Executing shell command");

        let mut cmd = if cfg!(target_os = "windows") {
            let mut c = Command::new("cmd");
            c.args(["/C", command]);
            c
        } else {
            let mut c = Command::new("sh");
            c.args(["-c", command]);
            c
        };
        if let Some(dir) = optional_str(&arguments, "working_dir") {
            cmd.current_dir(expand(dir));
        }

        run_command(cmd, command, timeout_secs).await
    }
}

/// Run `cmd` to completion and render stdout, stderr and the exit code the
/// way the command tools report them. `label` only appears in logs.
pub(crate) async fn run_command(
    mut cmd: Command,
    label: &str,
    timeout_secs: u64,
) -> Result<String, ToolError> {
    // The child dies with the future, including when the agent times out.
    cmd.kill_on_drop(true);

    let output = match tokio::time::timeout(Duration::from_secs(timeout_secs), cmd.output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => return Err(ToolError::Failed(format!("failed to run command: {e}"))),
        Err(_) => {
            warn!(command = %label, timeout_secs, "Command timed out");
            return Err(ToolError::Failed(format!(
                "command timed out after {timeout_secs}s"
            )));
        }
    };

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let code = output.status.code().unwrap_or(-1);
    if !output.status.success() {
        warn!(command = %label, exit_code = code, "Command failed");
    }

    let mut result = stdout.trim_end().to_string();
    if !stderr.trim().is_empty() {
        result.push_str("\nSTDERR:\n");
        result.push_str(stderr.trim_end());
    }
    result.push_str(&format!("\n[exit code: {code}]"));
    Ok(result.trim_start().to_string())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(v: serde_json::Value) -> Arguments {
        v.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn execute_echo() {
        let tool = ShellTool::new(30);
        let out = tool.execute(args(json!({"command": "echo hello"}))).await.unwrap();
        assert_eq!(out, "hello\n[exit code: 0]");
    }

    #[tokio::test]
    async fn stderr_and_exit_code_are_reported() {
        let tool = ShellTool::new(30);
        let out = tool
            .execute(args(json!({"command": "echo oops >&2; exit 3"})))
            .await
            .unwrap();
        assert!(out.contains("STDERR:\noops"));
        assert!(out.ends_with("[exit code: 3]"));
    }

    #[tokio::test]
    async fn working_dir_is_honored() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "").unwrap();
        let tool = ShellTool::new(30);
        let out = tool
            .execute(args(json!({"command": "ls", "working_dir": dir.path().to_str().unwrap()})))
            .await
            .unwrap();
        assert!(out.contains("marker.txt"));
    }

    #[tokio::test]
    async fn timeout_kills_command() {
        let tool = ShellTool::new(30);
        let err = tool
            .execute(args(json!({"command": "sleep 5", "timeout": 1})))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("timed out after 1s"));
    }

    #[tokio::test]
    async fn missing_command_is_invalid_arguments() {
        let tool = ShellTool::new(30);
        let err = tool.execute(Arguments::new()).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }
}
