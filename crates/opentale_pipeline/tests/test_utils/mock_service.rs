//! Scripted generation service for testing.

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use opentale_core::{ChatMessage, GenerationParams};
use opentale_error::{
    OpentaleError, OpentaleResult, UpstreamGenerationError, UpstreamGenerationErrorKind,
};
use opentale_interface::{ChunkStream, FinishReason, GenerationService, StreamChunk, Streaming};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// One scripted reply, consumed by the next call.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub enum MockResponse {
    /// Complete reply; streamed as a single delta
    Text(String),
    /// The call fails before producing anything
    Error(UpstreamGenerationErrorKind),
    /// Streamed deltas followed by the end-of-stream chunk
    Deltas(Vec<String>),
    /// Streamed deltas followed by a stream error
    DeltasThenError(Vec<String>, UpstreamGenerationErrorKind),
    /// Streamed deltas after which the stream never yields again
    DeltasThenHang(Vec<String>),
    /// Streamed deltas after which the stream ends with no end-of-stream chunk
    DeltasWithoutFinish(Vec<String>),
}

impl MockResponse {
    /// Deltas from string slices.
    #[allow(dead_code)]
    pub fn deltas(parts: &[&str]) -> Self {
        Self::Deltas(parts.iter().map(|s| s.to_string()).collect())
    }
}

/// What the service was asked.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct RecordedCall {
    pub system_prompt: String,
    pub messages: Vec<ChatMessage>,
    pub params: GenerationParams,
    pub streaming: bool,
}

/// Mock generation service.
///
/// Replies are consumed in order; a call with nothing scripted fails with
/// an empty-response error.
#[derive(Clone, Default)]
pub struct MockService {
    responses: Arc<Mutex<VecDeque<MockResponse>>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

#[allow(dead_code)]
impl MockService {
    /// Create a mock with a sequence of replies.
    pub fn new(responses: Vec<MockResponse>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses.into())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock whose only reply is `text`.
    pub fn replying(text: impl Into<String>) -> Self {
        Self::new(vec![MockResponse::Text(text.into())])
    }

    /// Queue another reply.
    pub fn push(&self, response: MockResponse) {
        self.responses.lock().unwrap().push_back(response);
    }

    /// Every call received so far.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// The most recent call.
    pub fn last_call(&self) -> RecordedCall {
        self.calls().last().cloned().expect("no calls recorded")
    }

    fn next(
        &self,
        system_prompt: &str,
        messages: &[ChatMessage],
        params: &GenerationParams,
        streaming: bool,
    ) -> OpentaleResult<MockResponse> {
        self.calls.lock().unwrap().push(RecordedCall {
            system_prompt: system_prompt.to_string(),
            messages: messages.to_vec(),
            params: params.clone(),
            streaming,
        });
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| upstream(UpstreamGenerationErrorKind::EmptyResponse))
    }
}

fn upstream(kind: UpstreamGenerationErrorKind) -> OpentaleError {
    OpentaleError::from(UpstreamGenerationError::new(kind))
}

fn delta_items(parts: Vec<String>) -> Vec<OpentaleResult<StreamChunk>> {
    parts.into_iter().map(|part| Ok(StreamChunk::delta(part))).collect()
}

#[async_trait]
impl GenerationService for MockService {
    async fn complete(
        &self,
        system_prompt: &str,
        messages: &[ChatMessage],
        params: &GenerationParams,
    ) -> OpentaleResult<String> {
        match self.next(system_prompt, messages, params, false)? {
            MockResponse::Text(text) => Ok(text),
            MockResponse::Error(kind) | MockResponse::DeltasThenError(_, kind) => {
                Err(upstream(kind))
            }
            MockResponse::Deltas(parts)
            | MockResponse::DeltasThenHang(parts)
            | MockResponse::DeltasWithoutFinish(parts) => Ok(parts.concat()),
        }
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}

#[async_trait]
impl Streaming for MockService {
    async fn stream(
        &self,
        system_prompt: &str,
        messages: &[ChatMessage],
        params: &GenerationParams,
    ) -> OpentaleResult<ChunkStream> {
        let finished =
            || -> OpentaleResult<StreamChunk> { Ok(StreamChunk::finished(FinishReason::Stop)) };
        let stream: ChunkStream = match self.next(system_prompt, messages, params, true)? {
            MockResponse::Text(text) => {
                Box::pin(stream::iter(vec![Ok(StreamChunk::delta(text)), finished()]))
            }
            MockResponse::Error(kind) => return Err(upstream(kind)),
            MockResponse::Deltas(parts) => {
                let mut items = delta_items(parts);
                items.push(finished());
                Box::pin(stream::iter(items))
            }
            MockResponse::DeltasThenError(parts, kind) => {
                let mut items = delta_items(parts);
                items.push(Err(upstream(kind)));
                Box::pin(stream::iter(items))
            }
            MockResponse::DeltasThenHang(parts) => {
                Box::pin(stream::iter(delta_items(parts)).chain(stream::pending()))
            }
            MockResponse::DeltasWithoutFinish(parts) => Box::pin(stream::iter(delta_items(parts))),
        };
        Ok(stream)
    }
}
