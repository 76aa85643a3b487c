//! Error types for the PocketClaw domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; [`Error`] wraps them all.

use std::time::Duration;

use thiserror::Error;

/// The top-level error type for all PocketClaw operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Conversation store errors ---
    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures of a single model call. None of these are retried internally.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Failed to decode provider response: {0}")]
    Decode(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}


#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown tool '{0}'")]
    NotFound(String),

    #[error("{0}")]
    Failed(String),

    #[error("tool '{tool_name}' timed out after {}", format_timeout(.timeout))]
    Timeout { tool_name: String, timeout: Duration },

    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
}

/// Whole seconds as `30s`, anything finer as milliseconds.
fn format_timeout(timeout: &Duration) -> String {
    if timeout.subsec_nanos() == 0 {
        format!("{}s", timeout.as_secs())
    } else {
        format!("{}ms", timeout.as_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = Error::Provider(ProviderError::ApiError {
            status_code: 529,
            message: "Overloaded".into(),
        });
        assert!(err.to_string().contains("529"));
        assert!(err.to_string().contains("Overloaded"));
    }

    #[test]
    fn tool_errors_read_as_tool_results() {
        assert_eq!(
            format!("Error: {}", ToolError::NotFound("foo".into())),
            "Error: unknown tool 'foo'"
        );
        assert_eq!(
            format!("Error: {}", ToolError::Failed("disk full".into())),
            "Error: disk full"
        );
        let timeout = ToolError::Timeout {
            tool_name: "run_shell".into(),
            timeout: Duration::from_secs(30),
        };
        assert_eq!(timeout.to_string(), "tool 'run_shell' timed out after 30s");
    }

    #[test]
    fn sub_second_timeout_is_not_rounded_to_zero() {
        let timeout = ToolError::Timeout {
            tool_name: "slow".into(),
            timeout: Duration::from_millis(250),
        };
        assert_eq!(timeout.to_string(), "tool 'slow' timed out after 250ms");
    }
}
