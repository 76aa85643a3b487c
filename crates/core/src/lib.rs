//! # PocketClaw Core
//!
//! Canonical conversation model, traits, and error definitions for the
//! PocketClaw assistant. This crate has **no HTTP or storage dependencies**:
//! it defines the vendor-neutral model that every other crate implements
//! against.
//!
//! ## Design Philosophy
//!
//! Each collaborator of the agent loop is a trait here (`Provider`, `Tool`,
//! `ConversationStore`). Implementations live in their own crates, so tests
//! can drive the loop with scripted mocks.

pub mod error;
pub mod message;
pub mod provider;
pub mod store;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{Error, MemoryError, ProviderError, Result, ToolError};
pub use message::{ContentBlock, ConversationId, Message, MessageContent, Role};
pub use provider::{ChatRequest, EventStream, LlmResponse, Provider, StreamEvent, Usage};
pub use store::ConversationStore;
pub use tool::{
    Arguments, ParamType, ParameterSpec, Tool, ToolCall, ToolDefinition, ToolRegistry,
};
