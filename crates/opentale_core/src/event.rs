//! Events forwarded to streaming consumers.

use serde::{Deserialize, Serialize};

/// Content of the terminal event of a stream.
pub const DONE_SENTINEL: &str = "[DONE]";

/// One server-sent event payload: `{"content": ...}`.
///
/// A stream opens with an empty heartbeat, carries one event per delta and
/// closes with [`DONE_SENTINEL`].
///
/// # Examples
///
/// ```
/// use opentale_core::StreamEvent;
///
/// assert_eq!(StreamEvent::heartbeat().to_sse_frame(), "data: {\"content\":\"\"}\n\n");
/// assert!(StreamEvent::done().is_done());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, derive_getters::Getters)]
pub struct StreamEvent {
    /// Delta text, empty for the heartbeat
    content: String,
}

impl StreamEvent {
    /// Liveness event sent as soon as the stream opens.
    pub fn heartbeat() -> Self {
        Self {
            content: String::new(),
        }
    }

    /// Event carrying one delta.
    pub fn delta(text: impl Into<String>) -> Self {
        Self {
            content: text.into(),
        }
    }

    /// Completion sentinel.
    pub fn done() -> Self {
        Self {
            content: DONE_SENTINEL.to_string(),
        }
    }

    /// Whether this is the completion sentinel.
    pub fn is_done(&self) -> bool {
        self.content == DONE_SENTINEL
    }

    /// Whether this is the heartbeat.
    pub fn is_heartbeat(&self) -> bool {
        self.content.is_empty()
    }

    /// Render as an SSE `data:` frame.
    pub fn to_sse_frame(&self) -> String {
        let payload = serde_json::json!({ "content": self.content });
        format!("data: {}\n\n", payload)
    }
}
