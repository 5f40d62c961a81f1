pub mod lines;

pub use lines::LineDecoder;

use std::collections::VecDeque;
use std::fmt;
use std::pin::Pin;

use futures_util::{Stream, StreamExt};

use crate::error::{AdapterError, ChunkParseWarning};
use crate::protocol::openai_chat::StreamChunk;

/// Terminal sentinel line. Matched case-sensitively after trimming.
pub const DONE_LINE: &str = "data: [DONE]";
const DATA_PREFIX: &str = "data: ";

/// What a single streamed line decodes to.
#[derive(Debug, Clone, PartialEq)]
pub enum LineOutcome {
    /// Blank line or the `[DONE]` sentinel.
    Skip,
    Chunk(StreamChunk),
    Malformed(ChunkParseWarning),
}

/// Decode one complete line of a chat-completion stream.
#[must_use]
pub fn parse_chunk_line(line: &str) -> LineOutcome {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed == DONE_LINE {
        return LineOutcome::Skip;
    }

    let payload = trimmed.strip_prefix(DATA_PREFIX).unwrap_or(trimmed);
    match serde_json::from_str::<StreamChunk>(payload) {
        Ok(chunk) => LineOutcome::Chunk(chunk),
        Err(err) => LineOutcome::Malformed(ChunkParseWarning {
            line: payload.to_string(),
            message: err.to_string(),
        }),
    }
}

/// Owns the response byte source; dropping it releases the connection.
struct BodyGuard<S> {
    source: Pin<Box<S>>,
}

impl<S> Drop for BodyGuard<S> {
    fn drop(&mut self) {
        tracing::debug!("chat completion stream body released");
    }
}

struct DecoderState<S, F> {
    body: Option<BodyGuard<S>>,
    lines: LineDecoder,
    ready: VecDeque<String>,
    on_warning: F,
}

impl<S, F> DecoderState<S, F> {
    fn release(&mut self) {
        let discarded = self.lines.discard_pending();
        if discarded > 0 {
            tracing::debug!(discarded_bytes = discarded, "dropping incomplete trailing stream line");
        }
        self.body = None;
    }
}

/// Decode a chat-completion byte stream into chunk records, logging
/// malformed lines as warnings.
///
/// See [`decode_chunk_stream_with`].
pub fn decode_chunk_stream<S, E>(
    byte_stream: S,
) -> impl Stream<Item = Result<StreamChunk, AdapterError>> + Send + 'static
where
    S: Stream<Item = Result<bytes::Bytes, E>> + Send + 'static,
    E: fmt::Display + Send + 'static,
{
    decode_chunk_stream_with(byte_stream, |warning: ChunkParseWarning| {
        tracing::warn!(line = %warning.line, error = %warning.message, "error parsing stream chunk");
    })
}

/// Decode a chat-completion byte stream into chunk records.
///
/// The returned stream is lazy: bytes are only read when the consumer polls
/// for the next record. Lines that fail to parse are handed to `on_warning`
/// and skipped. A read error is yielded once as
/// [`AdapterError::Connection`] and ends the stream. An incomplete trailing
/// line at end of input is discarded without being parsed.
///
/// The byte source is dropped as soon as the input ends or fails, and in any
/// case when the returned stream itself is dropped.
pub fn decode_chunk_stream_with<S, E, F>(
    byte_stream: S,
    on_warning: F,
) -> impl Stream<Item = Result<StreamChunk, AdapterError>> + Send + 'static
where
    S: Stream<Item = Result<bytes::Bytes, E>> + Send + 'static,
    E: fmt::Display + Send + 'static,
    F: FnMut(ChunkParseWarning) + Send + 'static,
{
    let state = DecoderState {
        body: Some(BodyGuard {
            source: Box::pin(byte_stream),
        }),
        lines: LineDecoder::new(),
        ready: VecDeque::new(),
        on_warning,
    };

    futures_util::stream::unfold(state, |mut state| async move {
        loop {
            while let Some(line) = state.ready.pop_front() {
                match parse_chunk_line(&line) {
                    LineOutcome::Skip => {}
                    LineOutcome::Chunk(chunk) => return Some((Ok(chunk), state)),
                    LineOutcome::Malformed(warning) => (state.on_warning)(warning),
                }
            }

            let body = state.body.as_mut()?;
            match body.source.next().await {
                Some(Ok(bytes)) => state.lines.feed_into(&bytes, &mut state.ready),
                Some(Err(err)) => {
                    state.release();
                    return Some((Err(AdapterError::Connection(err.to_string())), state));
                }
                None => {
                    state.release();
                    return None;
                }
            }
        }
    })
}
