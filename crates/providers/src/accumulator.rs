//! Tool-call accumulation for streamed responses.
//!
//! Argument JSON arrives as raw fragments. A [`PendingToolCall`] only ever
//! appends them; the buffer is parsed exactly once, when the call is
//! finalized, so a partially received call is never exposed.

use pocketclaw_core::provider::StreamEvent;
use pocketclaw_core::tool::ToolCall;

/// An in-flight tool call.
#[derive(Debug, Default, Clone)]
pub struct PendingToolCall {
    pub id: String,
    pub name: String,
    raw_arguments: String,
}

impl PendingToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            raw_arguments: String::new(),
        }
    }

    /// Append a raw argument fragment, in arrival order.
    pub fn push_fragment(&mut self, fragment: &str) {
        self.raw_arguments.push_str(fragment);
    }

    /// Parse the accumulated buffer into a complete call.
    pub fn finish(self) -> ToolCall {
        let call = ToolCall::from_raw_arguments(self.id, self.name, &self.raw_arguments);
        if let Some(reason) = &call.arguments_error {
            tracing::warn!(tool = %call.name, id = %call.id, %reason, "Malformed tool arguments");
        }
        call
    }
}

/// The closing events of a turn.
pub fn finish_turn(full_text: String, calls: Vec<ToolCall>) -> Vec<StreamEvent> {
    let mut events = Vec::with_capacity(2);
    if !calls.is_empty() {
        events.push(StreamEvent::ToolCallsReady { calls });
    }
    events.push(StreamEvent::Done { full_text });
    events
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragments_are_joined_then_parsed_once() {
        let mut pending = PendingToolCall::new("t1", "read_file");
        for fragment in [r#"{"pa"#, r#"th": "#, r#""src/ma"#, r#"in.rs"}"#] {
            pending.push_fragment(fragment);
        }
        let call = pending.finish();
        assert_eq!(call.arguments["path"], "src/main.rs");
        assert!(call.arguments_error.is_none());
    }

    #[test]
    fn empty_buffer_is_empty_mapping() {
        let call = PendingToolCall::new("t1", "list_directory").finish();
        assert!(call.arguments.is_empty());
        assert!(call.arguments_error.is_none());
    }

    #[test]
    fn truncated_buffer_is_flagged_not_dropped() {
        let mut pending = PendingToolCall::new("t1", "write_file");
        pending.push_fragment(r#"{"path": "a.txt", "content": "#);
        let call = pending.finish();
        assert_eq!(call.id, "t1");
        assert!(call.arguments_error.is_some());
    }

    #[test]
    fn finish_turn_orders_events() {
        assert_eq!(
            finish_turn(String::new(), vec![]),
            vec![StreamEvent::Done {
                full_text: String::new()
            }]
        );
        let calls = vec![PendingToolCall::new("a", "x").finish()];
        let events = finish_turn("hi".into(), calls.clone());
        assert_eq!(events[0], StreamEvent::ToolCallsReady { calls });
        assert_eq!(
            events[1],
            StreamEvent::Done {
                full_text: "hi".into()
            }
        );
    }
}
