//! Chat-completion provider integration for OpenTale.
//!
//! OpenTale talks to any service that speaks the OpenAI chat completions
//! format (OpenRouter, OpenAI, Groq, local gateways). The
//! [`ChatCompletionsDriver`] implements both
//! [`GenerationService`](opentale_interface::GenerationService) and
//! [`Streaming`](opentale_interface::Streaming).
//!
//! # Example
//!
//! ```no_run
//! use opentale_core::{ChatMessage, GenerationParams};
//! use opentale_interface::GenerationService;
//! use opentale_models::ChatCompletionsDriver;
//! use std::time::Duration;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let driver = ChatCompletionsDriver::from_env(
//!     "OPENROUTER_API_KEY",
//!     "google/gemma-3-27b-it",
//!     "https://openrouter.ai/api/v1",
//!     Duration::from_secs(600),
//! )?;
//! let reply = driver
//!     .complete(
//!         "You are a worldbuilding assistant.",
//!         &[ChatMessage::user("Describe a port city.")],
//!         &GenerationParams::default(),
//!     )
//!     .await?;
//! println!("{}", reply);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod driver;
mod openai_compat;

pub use driver::ChatCompletionsDriver;
pub use openai_compat::{
    ChatRequest, ChatResponse, CompatChunkStream, OpenAICompatError, OpenAICompatibleClient, SseDecoder, SseEvent,
    decode_sse_stream,
};
