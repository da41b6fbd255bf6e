//! Core type definitions for the OpenTale interface.

use serde::{Deserialize, Serialize};

/// A single chunk from a streaming response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamChunk {
    /// Incremental text, possibly empty on the final chunk.
    pub text: String,
    /// Whether this is the end-of-stream signal.
    pub is_final: bool,
    /// Optional finish reason if final.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
}

impl StreamChunk {
    /// A non-final chunk carrying `text`.
    pub fn delta(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: false,
            finish_reason: None,
        }
    }

    /// The end-of-stream chunk.
    pub fn finished(reason: FinishReason) -> Self {
        Self {
            text: String::new(),
            is_final: true,
            finish_reason: Some(reason),
        }
    }
}

/// Why generation stopped.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    strum::EnumIter,
)]
pub enum FinishReason {
    /// Model completed naturally.
    Stop,
    /// Hit max_tokens limit.
    Length,
    /// Content was filtered.
    ContentFilter,
    /// Other/unknown reason.
    Other,
}

impl FinishReason {
    /// Map an OpenAI-style `finish_reason` string.
    ///
    /// # Examples
    ///
    /// ```
    /// use opentale_interface::FinishReason;
    ///
    /// assert_eq!(FinishReason::from_wire("stop"), FinishReason::Stop);
    /// assert_eq!(FinishReason::from_wire("length"), FinishReason::Length);
    /// assert_eq!(FinishReason::from_wire("tool_calls"), FinishReason::Other);
    /// ```
    pub fn from_wire(reason: &str) -> Self {
        match reason {
            "stop" | "eos" | "end_turn" => Self::Stop,
            "length" | "max_tokens" => Self::Length,
            "content_filter" => Self::ContentFilter,
            _ => Self::Other,
        }
    }
}
