//! Server-sent-event decoding for streaming chat completions.

use crate::openai_compat::OpenAICompatError;
use crate::openai_compat::dto::ChatStreamChunk;
use futures_util::stream::{self, Stream, StreamExt};
use opentale_interface::{FinishReason, StreamChunk};
use std::collections::VecDeque;
use tracing::{debug, error, trace};

/// A decoded event of a chat completion stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    /// Text appended to the reply
    Delta(String),
    /// The provider signalled the end of the reply
    Finished(FinishReason),
}

/// Incremental decoder for `text/event-stream` bodies.
///
/// Bytes may arrive split anywhere, including inside a UTF-8 sequence;
/// only complete lines are decoded.
///
/// # Examples
///
/// ```
/// use opentale_models::{SseDecoder, SseEvent};
///
/// let mut decoder = SseDecoder::default();
/// let events = decoder
///     .push(b"data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\ndata: [DO")
///     .unwrap();
/// assert_eq!(events, vec![SseEvent::Delta("Hel".to_string())]);
///
/// let events = decoder.push(b"NE]\n\n").unwrap();
/// assert_eq!(events.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    /// Feed raw body bytes, returning the events completed by them.
    ///
    /// # Errors
    ///
    /// Returns an error for undecodable payloads and in-band error objects.
    pub fn push(&mut self, bytes: &[u8]) -> Result<Vec<SseEvent>, OpenAICompatError> {
        self.buffer.extend_from_slice(bytes);

        let mut events = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            let line = String::from_utf8_lossy(&line);
            events.extend(Self::decode_line(line.trim_end_matches(['\r', '\n']))?);
        }
        Ok(events)
    }

    fn decode_line(line: &str) -> Result<Vec<SseEvent>, OpenAICompatError> {
        // Blank lines separate events; ':' starts a keep-alive comment.
        if line.is_empty() || line.starts_with(':') {
            return Ok(Vec::new());
        }
        let Some(payload) = line.strip_prefix("data:") else {
            trace!(line, "Ignoring non-data SSE field");
            return Ok(Vec::new());
        };
        let payload = payload.trim_start();

        if payload == "[DONE]" {
            return Ok(vec![SseEvent::Finished(FinishReason::Stop)]);
        }

        let chunk: ChatStreamChunk = serde_json::from_str(payload).map_err(|e| {
            OpenAICompatError::ResponseParsing(format!("Invalid stream payload: {}", e))
        })?;

        if let Some(err) = chunk.error {
            let status = err
                .code
                .as_ref()
                .and_then(serde_json::Value::as_u64)
                .and_then(|code| u16::try_from(code).ok())
                .unwrap_or(500);
            return Err(OpenAICompatError::Api {
                status,
                message: err.message,
            });
        }

        let mut events = Vec::new();
        if let Some(choice) = chunk.choices.into_iter().next() {
            if let Some(text) = choice.delta.content.filter(|text| !text.is_empty()) {
                events.push(SseEvent::Delta(text));
            }
            if let Some(reason) = choice.finish_reason {
                events.push(SseEvent::Finished(FinishReason::from_wire(&reason)));
            }
        }
        Ok(events)
    }
}

struct DecodeState<S> {
    body: S,
    decoder: SseDecoder,
    pending: VecDeque<SseEvent>,
    finished: bool,
}

/// Turn a streaming response body into stream chunks.
///
/// Emits one chunk per delta and a single final chunk on the first finish
/// signal, after which the body is no longer read. A body that ends
/// without a finish signal simply ends the stream, leaving the consumer to
/// notice that no final chunk arrived.
pub fn decode_sse_stream<S, B, E>(
    body: S,
) -> impl Stream<Item = Result<StreamChunk, OpenAICompatError>> + Send
where
    S: Stream<Item = Result<B, E>> + Send + Unpin + 'static,
    B: AsRef<[u8]> + Send,
    E: std::fmt::Display + Send,
{
    let state = DecodeState {
        body,
        decoder: SseDecoder::default(),
        pending: VecDeque::new(),
        finished: false,
    };

    stream::try_unfold(state, |mut state| async move {
        loop {
            if state.finished {
                return Ok(None);
            }

            match state.pending.pop_front() {
                Some(SseEvent::Delta(text)) => {
                    return Ok(Some((StreamChunk::delta(text), state)));
                }
                Some(SseEvent::Finished(reason)) => {
                    debug!(reason = %reason, "Stream finished");
                    state.finished = true;
                    return Ok(Some((StreamChunk::finished(reason), state)));
                }
                None => {}
            }

            match state.body.next().await {
                Some(Ok(bytes)) => {
                    let events = state.decoder.push(bytes.as_ref())?;
                    state.pending.extend(events);
                }
                Some(Err(e)) => {
                    error!(error = %e, "Error receiving stream body");
                    return Err(OpenAICompatError::StreamInterrupted(e.to_string()));
                }
                None => {
                    debug!("Stream body ended without finish signal");
                    return Ok(None);
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(text: &str) -> String {
        format!(
            "data: {}\n\n",
            serde_json::json!({ "choices": [{ "delta": { "content": text } }] })
        )
    }

    #[test]
    fn comments_and_blank_lines_are_ignored() {
        let mut decoder = SseDecoder::default();
        let events = decoder.push(b": OPENROUTER PROCESSING\n\n").unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn content_and_finish_in_one_chunk() {
        let mut decoder = SseDecoder::default();
        let events = decoder
            .push(b"data: {\"choices\":[{\"delta\":{\"content\":\"end\"},\"finish_reason\":\"length\"}]}\n")
            .unwrap();
        assert_eq!(
            events,
            vec![
                SseEvent::Delta("end".to_string()),
                SseEvent::Finished(FinishReason::Length)
            ]
        );
    }

    #[test]
    fn multibyte_split_across_pushes() {
        let mut decoder = SseDecoder::default();
        let bytes = frame("é").into_bytes();
        let split = bytes.iter().position(|b| *b >= 0x80).unwrap() + 1;
        assert!(decoder.push(&bytes[..split]).unwrap().is_empty());
        assert_eq!(
            decoder.push(&bytes[split..]).unwrap(),
            vec![SseEvent::Delta("é".to_string())]
        );
    }

    #[test]
    fn in_band_error_is_api_error() {
        let mut decoder = SseDecoder::default();
        let err = decoder
            .push(b"data: {\"error\":{\"code\":429,\"message\":\"slow down\"}}\n")
            .unwrap_err();
        assert!(matches!(err, OpenAICompatError::Api { status: 429, .. }));
    }

    #[tokio::test]
    async fn stream_stops_at_first_finish() {
        let body = vec![
            Ok::<_, String>(frame("Once ").into_bytes()),
            Ok(format!("{}data: [DONE]\n\n", frame("upon")).into_bytes()),
            Ok(frame("ignored").into_bytes()),
        ];
        let chunks: Vec<StreamChunk> = decode_sse_stream(stream::iter(body))
            .map(|chunk| chunk.unwrap())
            .collect()
            .await;

        let text: String = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(text, "Once upon");
        assert!(chunks.last().unwrap().is_final);
        assert_eq!(chunks.iter().filter(|c| c.is_final).count(), 1);
    }

    #[tokio::test]
    async fn body_error_interrupts() {
        let body = vec![
            Ok::<_, String>(frame("partial").into_bytes()),
            Err("connection reset".to_string()),
        ];
        let results: Vec<_> = decode_sse_stream(stream::iter(body)).collect().await;
        assert_eq!(results.len(), 2);
        assert!(matches!(
            results[1],
            Err(OpenAICompatError::StreamInterrupted(_))
        ));
    }

    #[tokio::test]
    async fn body_end_without_finish_has_no_final_chunk() {
        let body = vec![Ok::<_, String>(frame("cut").into_bytes())];
        let chunks: Vec<_> = decode_sse_stream(stream::iter(body)).collect().await;
        assert_eq!(chunks.len(), 1);
        assert!(!chunks[0].as_ref().unwrap().is_final);
    }
}
