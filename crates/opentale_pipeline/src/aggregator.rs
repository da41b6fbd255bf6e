//! Streaming finalization: forward deltas, persist the whole text once.

use crate::context::{ContextStore, SlotTarget};
use crate::normalize::NewlinePolicy;
use futures_util::StreamExt;
use opentale_core::StreamEvent;
use opentale_error::{
    OpentaleResult, ParseFallbackWarning, UpstreamGenerationError, UpstreamGenerationErrorKind,
};
use opentale_interface::ChunkStream;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument};

/// Text a stage finalized, plus the outline parser's report if it fell back.
#[derive(Debug, Clone, PartialEq, Eq, derive_getters::Getters)]
pub struct StageOutput {
    /// Normalized text as persisted
    text: String,
    /// Present when an outline commit used placeholder chapters
    warning: Option<ParseFallbackWarning>,
}

impl StageOutput {
    /// Output with no warning.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            warning: None,
        }
    }

    /// Output carrying an optional parser warning.
    pub fn with_warning(text: impl Into<String>, warning: Option<ParseFallbackWarning>) -> Self {
        Self {
            text: text.into(),
            warning,
        }
    }
}

/// How a streaming stage ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamOutcome {
    /// The stream finished and its text was persisted
    Completed(StageOutput),
    /// The consumer went away first; nothing was persisted
    Cancelled,
}

impl StreamOutcome {
    /// The finalized output, if the stream completed.
    pub fn output(&self) -> Option<&StageOutput> {
        match self {
            Self::Completed(output) => Some(output),
            Self::Cancelled => None,
        }
    }
}

/// Turns a chunk stream into client events and, on completion, one durable write.
///
/// The sink receives an empty heartbeat before the upstream call is opened,
/// then every non-empty delta in arrival order, then [`StreamEvent::done`]
/// after the text is persisted. Cancellation, a closed sink, or a stream
/// error drops the stream, which aborts the underlying call, and discards
/// the buffer.
#[derive(Debug, Clone)]
pub struct StreamAggregator {
    store: Arc<ContextStore>,
}

impl StreamAggregator {
    /// Aggregator persisting into `store`.
    pub fn new(store: Arc<ContextStore>) -> Self {
        Self { store }
    }

    /// Await `opening`, forward its stream to `sink`, and finalize into `target`.
    ///
    /// # Errors
    ///
    /// The error from opening or reading the stream, or
    /// `UpstreamGenerationError` if the stream ends without an end-of-stream
    /// chunk. Either way nothing is persisted.
    #[instrument(skip_all, fields(slot = %target.slot()))]
    pub async fn run<F>(
        &self,
        opening: F,
        target: SlotTarget,
        sink: mpsc::Sender<StreamEvent>,
        cancel: CancellationToken,
    ) -> OpentaleResult<StreamOutcome>
    where
        F: Future<Output = OpentaleResult<ChunkStream>>,
    {
        if !forward(&sink, StreamEvent::heartbeat(), &cancel).await {
            return Ok(StreamOutcome::Cancelled);
        }

        let mut stream = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("Cancelled before the stream opened");
                return Ok(StreamOutcome::Cancelled);
            }
            _ = sink.closed() => {
                info!("Consumer disconnected before the stream opened");
                return Ok(StreamOutcome::Cancelled);
            }
            opened = opening => opened?,
        };

        let mut buffer = String::new();
        let mut deltas = 0usize;

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!(deltas, "Stream cancelled; discarding buffer");
                    return Ok(StreamOutcome::Cancelled);
                }
                _ = sink.closed() => {
                    info!(deltas, "Consumer disconnected; discarding buffer");
                    return Ok(StreamOutcome::Cancelled);
                }
                next = stream.next() => next,
            };

            match next {
                Some(Ok(chunk)) => {
                    if !chunk.text.is_empty() {
                        buffer.push_str(&chunk.text);
                        deltas += 1;
                        if !forward(&sink, StreamEvent::delta(chunk.text), &cancel).await {
                            info!(deltas, "Delta not delivered; discarding buffer");
                            return Ok(StreamOutcome::Cancelled);
                        }
                    }
                    if chunk.is_final {
                        debug!(deltas, reason = ?chunk.finish_reason, "Stream finished");
                        break;
                    }
                }
                Some(Err(e)) => {
                    error!(error = %e, deltas, "Stream failed; discarding buffer");
                    return Err(e);
                }
                None => {
                    error!(deltas, "Stream ended without a finish signal");
                    return Err(UpstreamGenerationError::new(
                        UpstreamGenerationErrorKind::StreamInterrupted(
                            "stream ended without a finish signal".to_string(),
                        ),
                    )
                    .into());
                }
            }
        }
        drop(stream);

        let text = NewlinePolicy::for_slot(target.slot()).apply(&buffer);
        let warning = self.store.commit(&target, &text).await?;

        if sink.send(StreamEvent::done()).await.is_err() {
            debug!("Consumer left before the completion event");
        }
        info!(deltas, len = text.len(), "Stream finalized");

        Ok(StreamOutcome::Completed(StageOutput::with_warning(text, warning)))
    }
}

/// Send one event unless the token fires first. False if it was not delivered.
async fn forward(
    sink: &mpsc::Sender<StreamEvent>,
    event: StreamEvent,
    cancel: &CancellationToken,
) -> bool {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        sent = sink.send(event) => sent.is_ok(),
    }
}
