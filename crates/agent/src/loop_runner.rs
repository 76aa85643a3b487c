//! The agent reasoning loop implementation.

use std::sync::Arc;
use std::time::Duration;

use pocketclaw_core::error::{Error, ProviderError, ToolError};
use pocketclaw_core::message::{ConversationId, Message};
use pocketclaw_core::provider::{ChatRequest, LlmResponse, Provider, StreamEvent};
use pocketclaw_core::store::ConversationStore;
use pocketclaw_core::tool::{ToolCall, ToolRegistry};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::stream_event::AgentStreamEvent;

/// Reply returned when the iteration ceiling stops the loop.
pub const MAX_ITERATIONS_REPLY: &str = "[max tool iterations reached]";

const DEFAULT_MAX_ITERATIONS: u32 = 50;
const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(30);

/// How a run of the loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopOutcome {
    /// Final assistant text; empty when the model produced none
    pub text: String,
    /// Model calls made
    pub iterations: u32,
    /// Tool calls executed (including unknown or failed ones)
    pub tool_calls_made: usize,
    /// False when the iteration ceiling stopped the loop
    pub completed: bool,
}

impl LoopOutcome {
    /// What the user sees: the model's text, or the sentinel on the ceiling.
    pub fn reply(&self) -> &str {
        if self.completed {
            &self.text
        } else {
            MAX_ITERATIONS_REPLY
        }
    }
}

/// Why a run stopped early.
enum Abort {
    Provider(ProviderError),
    /// The stream consumer went away.
    Cancelled,
}

impl From<ProviderError> for Abort {
    fn from(e: ProviderError) -> Self {
        Self::Provider(e)
    }
}

/// The core agent loop that orchestrates LLM calls and tool execution.
#[derive(Clone)]
pub struct AgentLoop {
    /// The LLM provider to use
    provider: Arc<dyn Provider>,

    /// Tool registry
    tools: Arc<ToolRegistry>,

    /// Where conversations are loaded from and saved to
    store: Arc<dyn ConversationStore>,

    /// Maximum model calls per user turn
    max_iterations: u32,

    /// Upper bound on a single tool execution
    tool_timeout: Duration,
}

impl AgentLoop {
    /// Create a new agent loop.
    pub fn new(
        provider: Arc<dyn Provider>,
        tools: Arc<ToolRegistry>,
        store: Arc<dyn ConversationStore>,
    ) -> Self {
        Self {
            provider,
            tools,
            store,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tool_timeout: DEFAULT_TOOL_TIMEOUT,
        }
    }

    /// Set the maximum number of model calls per user turn.
    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max.max(1);
        self
    }

    /// Set the time limit for a single tool execution.
    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = timeout;
        self
    }

    /// Run the loop over an in-memory history until the model answers
    /// without tool calls or the iteration ceiling is hit.
    ///
    /// Nothing is persisted here. On error the history may hold the turns
    /// appended before the failing model call.
    pub async fn run(
        &self,
        system: &str,
        history: &mut Vec<Message>,
    ) -> Result<LoopOutcome, ProviderError> {
        match self.drive(system, history, None).await {
            Ok(outcome) => Ok(outcome),
            Err(Abort::Provider(e)) => Err(e),
            Err(Abort::Cancelled) => Err(ProviderError::StreamInterrupted(
                "exchange cancelled".into(),
            )),
        }
    }

    /// Process one user message in a stored conversation and return the reply.
    ///
    /// History is saved when the loop completes or hits the ceiling, and
    /// left untouched when a model call fails.
    pub async fn handle_message(
        &self,
        conversation_id: &ConversationId,
        system: &str,
        user_input: &str,
    ) -> Result<String, Error> {
        let mut history = self.store.get(conversation_id).await?;
        history.push(Message::user(user_input));
        info!(
            conversation_id = %conversation_id,
            messages = history.len(),
            "Processing message"
        );

        let outcome = self.run(system, &mut history).await?;
        self.store.save(conversation_id, &history).await?;
        Ok(outcome.reply().to_string())
    }

    /// Streaming variant of [`handle_message`](Self::handle_message).
    ///
    /// The exchange runs on a spawned task. The receiver yields zero or more
    /// progress events followed by exactly one `Done` or `Error`. Dropping
    /// the receiver cancels the task at its next send.
    pub fn handle_message_stream(
        &self,
        conversation_id: ConversationId,
        system: String,
        user_input: String,
    ) -> mpsc::Receiver<AgentStreamEvent> {
        let (tx, rx) = mpsc::channel(64);
        let agent = self.clone();

        tokio::spawn(async move {
            let terminal = match agent
                .stream_exchange(&conversation_id, &system, &user_input, &tx)
                .await
            {
                Ok(outcome) => AgentStreamEvent::Done {
                    text: outcome.reply().to_string(),
                    iterations: outcome.iterations,
                    tool_calls_made: outcome.tool_calls_made,
                    completed: outcome.completed,
                },
                Err(Some(message)) => {
                    warn!(conversation_id = %conversation_id, error = %message, "Streaming exchange failed");
                    AgentStreamEvent::Error { message }
                }
                Err(None) => {
                    debug!(conversation_id = %conversation_id, "Stream consumer dropped, exchange cancelled");
                    return;
                }
            };
            let _ = tx.send(terminal).await;
        });

        rx
    }

    /// `Err(None)` means cancelled; `Err(Some(msg))` is reported to the consumer.
    async fn stream_exchange(
        &self,
        conversation_id: &ConversationId,
        system: &str,
        user_input: &str,
        tx: &mpsc::Sender<AgentStreamEvent>,
    ) -> Result<LoopOutcome, Option<String>> {
        let mut history = self
            .store
            .get(conversation_id)
            .await
            .map_err(|e| Some(e.to_string()))?;
        history.push(Message::user(user_input));

        let outcome = match self.drive(system, &mut history, Some(tx)).await {
            Ok(outcome) => outcome,
            Err(Abort::Provider(e)) => return Err(Some(e.to_string())),
            Err(Abort::Cancelled) => return Err(None),
        };

        self.store
            .save(conversation_id, &history)
            .await
            .map_err(|e| Some(e.to_string()))?;
        Ok(outcome)
    }

    /// The state machine. With `events` set the model is called in streaming
    /// mode and progress is forwarded as it happens.
    async fn drive(
        &self,
        system: &str,
        history: &mut Vec<Message>,
        events: Option<&mpsc::Sender<AgentStreamEvent>>,
    ) -> Result<LoopOutcome, Abort> {
        let tool_definitions = self.tools.definitions();
        let mut tool_calls_made = 0;

        for iteration in 1..=self.max_iterations {
            debug!(iteration, messages = history.len(), "Agent loop iteration");

            let request = ChatRequest {
                system: system.to_string(),
                messages: history.clone(),
                tools: tool_definitions.clone(),
            };

            let response = match events {
                Some(tx) => self.stream_model_call(request, tx).await?,
                None => self.provider.chat(request).await?,
            };

            if !response.has_tool_calls() {
                let text = response.text.unwrap_or_default();
                if !text.is_empty() {
                    history.push(Message::assistant(text.clone()));
                }
                info!(iterations = iteration, tool_calls_made, "Agent loop completed");
                return Ok(LoopOutcome {
                    text,
                    iterations: iteration,
                    tool_calls_made,
                    completed: true,
                });
            }

            debug!(tool_count = response.tool_calls.len(), "Executing tool calls");
            history.push(Message::assistant_with_tool_calls(
                response.text.as_deref(),
                &response.tool_calls,
            ));

            // Strictly sequential, in the order the model issued them.
            let mut results = Vec::with_capacity(response.tool_calls.len());
            for call in &response.tool_calls {
                if let Some(tx) = events {
                    send(
                        tx,
                        AgentStreamEvent::ToolCall {
                            id: call.id.clone(),
                            name: call.name.clone(),
                            input: serde_json::Value::Object(call.arguments.clone()),
                        },
                    )
                    .await?;
                }

                let (output, success) = match self.execute_call(call).await {
                    Ok(output) => (output, true),
                    Err(output) => (output, false),
                };
                tool_calls_made += 1;

                if let Some(tx) = events {
                    send(
                        tx,
                        AgentStreamEvent::ToolResult {
                            id: call.id.clone(),
                            name: call.name.clone(),
                            output: output.clone(),
                            success,
                        },
                    )
                    .await?;
                }
                results.push((call.id.clone(), output));
            }
            history.push(Message::tool_results(results));
        }

        warn!(
            max_iterations = self.max_iterations,
            tool_calls_made, "Max tool iterations reached"
        );
        Ok(LoopOutcome {
            text: String::new(),
            iterations: self.max_iterations,
            tool_calls_made,
            completed: false,
        })
    }

    /// One streaming model call, folded back into a complete response.
    async fn stream_model_call(
        &self,
        request: ChatRequest,
        tx: &mpsc::Sender<AgentStreamEvent>,
    ) -> Result<LlmResponse, Abort> {
        let mut stream = self.provider.chat_stream(request).await?;
        let mut response = LlmResponse::default();

        loop {
            tokio::select! {
                biased;
                _ = tx.closed() => return Err(Abort::Cancelled),
                event = stream.recv() => match event {
                    Some(Ok(StreamEvent::TextDelta { text })) => {
                        send(tx, AgentStreamEvent::Chunk { content: text }).await?;
                    }
                    Some(Ok(StreamEvent::ToolCallsReady { calls })) => {
                        response.tool_calls = calls;
                    }
                    Some(Ok(StreamEvent::Done { full_text })) => {
                        response.text = Some(full_text).filter(|t| !t.is_empty());
                        return Ok(response);
                    }
                    Some(Err(e)) => return Err(e.into()),
                    None => {
                        return Err(ProviderError::StreamInterrupted(
                            "stream ended before completion".into(),
                        )
                        .into());
                    }
                },
            }
        }
    }

    /// Run one tool call. `Err` carries the error string the model sees.
    async fn execute_call(&self, call: &ToolCall) -> Result<String, String> {
        let Some(tool) = self.tools.lookup(&call.name) else {
            warn!(tool = %call.name, "Model requested an unknown tool");
            return Err(format!("Error: {}", ToolError::NotFound(call.name.clone())));
        };

        if let Some(reason) = &call.arguments_error {
            warn!(tool = %call.name, %reason, "Malformed tool arguments");
            return Err(format!(
                "Error: invalid arguments for tool '{}': {reason}",
                call.name
            ));
        }

        debug!(tool = %call.name, id = %call.id, "Executing tool");
        let start = std::time::Instant::now();
        let result = tokio::time::timeout(self.tool_timeout, tool.execute(call.arguments.clone()))
            .await
            .unwrap_or_else(|_| {
                Err(ToolError::Timeout {
                    tool_name: call.name.clone(),
                    timeout: self.tool_timeout,
                })
            });
        let duration_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(output) => {
                debug!(tool = %call.name, duration_ms, "Tool succeeded");
                Ok(output)
            }
            Err(e) => {
                warn!(tool = %call.name, duration_ms, error = %e, "Tool execution failed");
                Err(format!("Error: {e}"))
            }
        }
    }
}

async fn send(tx: &mpsc::Sender<AgentStreamEvent>, event: AgentStreamEvent) -> Result<(), Abort> {
    tx.send(event).await.map_err(|_| Abort::Cancelled)
}
