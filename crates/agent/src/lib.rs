//! The core agent loop: the heart of PocketClaw.
//!
//! The agent follows a **call → act → observe** cycle:
//!
//! 1. **Load** the conversation and append the user message
//! 2. **Send to LLM** via the configured provider
//! 3. **If tool calls**: execute them in order, append the results, go to 2
//! 4. **If text only**: save the conversation and return the text
//!
//! The loop stops early when the iteration ceiling is reached; that is a
//! defined outcome, not an error.

pub mod loop_runner;
pub mod stream_event;

pub use loop_runner::{AgentLoop, LoopOutcome, MAX_ITERATIONS_REPLY};
pub use stream_event::AgentStreamEvent;
