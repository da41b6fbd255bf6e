//! Trait definitions for generation backends.

use crate::StreamChunk;
use async_trait::async_trait;
use futures_util::stream::Stream;
use opentale_core::{ChatMessage, GenerationParams};
use opentale_error::OpentaleResult;
use std::pin::Pin;

/// Ordered sequence of chunks from a streaming call.
pub type ChunkStream = Pin<Box<dyn Stream<Item = OpentaleResult<StreamChunk>> + Send>>;

/// A single chat-style generation call.
///
/// Implementations report every failure as one `UpstreamGenerationError`
/// and never retry.
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Generate a complete reply.
    ///
    /// `messages` are the turns after the system prompt, in order.
    async fn complete(
        &self,
        system_prompt: &str,
        messages: &[ChatMessage],
        params: &GenerationParams,
    ) -> OpentaleResult<String>;

    /// Provider name (e.g., "openrouter", "openai").
    fn provider_name(&self) -> &'static str;

    /// Model identifier (e.g., "google/gemma-3-27b-it").
    fn model_name(&self) -> &str;
}

/// Generation services that can stream their reply.
#[async_trait]
pub trait Streaming: GenerationService {
    /// Generate a streaming reply.
    ///
    /// The stream yields deltas in arrival order and ends with a chunk whose
    /// `is_final` is set. A stream that ends without one was interrupted.
    async fn stream(
        &self,
        system_prompt: &str,
        messages: &[ChatMessage],
        params: &GenerationParams,
    ) -> OpentaleResult<ChunkStream>;
}
