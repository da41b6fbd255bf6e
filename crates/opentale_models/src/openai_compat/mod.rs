//! Generic OpenAI-compatible API client.
//!
//! This module provides a client for any API that follows the OpenAI chat
//! completions format, including its server-sent-event streaming mode.

mod client;
mod conversions;
mod dto;
mod sse;

pub use client::{CompatChunkStream, OpenAICompatibleClient};
pub use dto::{ChatMessage, ChatRequest, ChatResponse, OpenAICompatError};
pub use sse::{SseDecoder, SseEvent, decode_sse_stream};
