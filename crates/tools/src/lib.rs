//! Built-in tool implementations for PocketClaw.
//!
//! Tools give the agent the ability to interact with the machine it runs
//! on and the network it can reach. `confirm` is the one tool with no side
//! effect; it lets the model put a risky step in front of the user.

pub mod confirm;
pub mod file_read;
pub mod file_write;
pub mod http_request;
pub mod list_directory;
pub mod python;
pub mod shell;

use std::path::PathBuf;
use std::sync::Arc;

use pocketclaw_config::AppConfig;
use pocketclaw_core::error::ToolError;
use pocketclaw_core::tool::{Arguments, ToolRegistry};

pub use confirm::ConfirmTool;
pub use file_read::FileReadTool;
pub use file_write::{EditFileTool, FileWriteTool};
pub use http_request::HttpRequestTool;
pub use list_directory::ListDirectoryTool;
pub use python::PythonTool;
pub use shell::ShellTool;

/// Create the default tool registry with all built-in tools.
pub fn default_registry(config: &AppConfig) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    let timeout_secs = config.agent.tool_timeout_secs;
    registry.register(Arc::new(ShellTool::new(timeout_secs)));
    registry.register(Arc::new(PythonTool::new(timeout_secs)));
    registry.register(Arc::new(FileReadTool));
    registry.register(Arc::new(FileWriteTool));
    registry.register(Arc::new(EditFileTool));
    registry.register(Arc::new(ListDirectoryTool));
    registry.register(Arc::new(HttpRequestTool::new()));
    registry.register(Arc::new(ConfirmTool));
    registry
}

// --- Argument helpers ---

pub(crate) fn required_str<'a>(args: &'a Arguments, key: &str) -> Result<&'a str, ToolError> {
    args.get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| ToolError::InvalidArguments(format!("missing '{key}' argument")))
}

pub(crate) fn optional_str<'a>(args: &'a Arguments, key: &str) -> Option<&'a str> {
    args.get(key).and_then(|v| v.as_str())
}

/// Models sometimes send numbers as strings; accept both.
pub(crate) fn optional_u64(args: &Arguments, key: &str) -> Option<u64> {
    match args.get(key)? {
        serde_json::Value::Number(n) => n.as_u64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub(crate) fn optional_bool(args: &Arguments, key: &str) -> Option<bool> {
    match args.get(key)? {
        serde_json::Value::Bool(b) => Some(*b),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub(crate) fn expand(path: &str) -> PathBuf {
    pocketclaw_config::expand_home(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_has_builtins_in_order() {
        let registry = default_registry(&AppConfig::default());
        assert_eq!(
            registry.names(),
            vec![
                "run_shell",
                "run_python",
                "read_file",
                "write_file",
                "edit_file",
                "list_directory",
                "http_request",
                "confirm",
            ]
        );
    }

    #[test]
    fn lenient_number_and_bool_arguments() {
        let args: Arguments = serde_json::from_str(
            r#"{"a": 3, "b": "7", "c": true, "d": "false", "e": [1]}"#,
        )
        .unwrap();
        assert_eq!(optional_u64(&args, "a"), Some(3));
        assert_eq!(optional_u64(&args, "b"), Some(7));
        assert_eq!(optional_u64(&args, "e"), None);
        assert_eq!(optional_bool(&args, "c"), Some(true));
        assert_eq!(optional_bool(&args, "d"), Some(false));
        assert!(required_str(&args, "zzz").is_err());
    }
}
