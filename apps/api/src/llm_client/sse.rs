//! Decoding of the Anthropic Messages SSE stream into plain text fragments.
//!
//! Only text deltas are surfaced. `message_stop` is the sole clean
//! terminator: a stream that closes without it is reported as truncated.

use std::fmt::Display;

use eventsource_stream::{Event, EventStreamError};
use futures::stream::{self, Stream};
use futures::StreamExt;
use serde::Deserialize;
use tracing::{error, trace};

use super::{ChatStream, LlmError};

#[derive(Debug, Deserialize)]
struct ContentBlockDelta {
    delta: Delta,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Delta {
    TextDelta {
        text: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct ErrorEvent {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(rename = "type")]
    kind: String,
    message: String,
}

#[derive(Debug, PartialEq)]
pub(crate) enum Frame {
    Text(String),
    Skip,
    Stop,
}

pub(crate) fn decode_event(event: &str, data: &str) -> Result<Frame, LlmError> {
    match event {
        "content_block_delta" => match serde_json::from_str::<ContentBlockDelta>(data) {
            Ok(ContentBlockDelta {
                delta: Delta::TextDelta { text },
            }) if !text.is_empty() => Ok(Frame::Text(text)),
            Ok(_) => Ok(Frame::Skip),
            Err(e) => {
                error!("Skipping unparseable content_block_delta: {e}, data: {data}");
                Ok(Frame::Skip)
            }
        },
        "error" => {
            let message = serde_json::from_str::<ErrorEvent>(data)
                .map(|e| format!("{}: {}", e.error.kind, e.error.message))
                .unwrap_or_else(|_| data.to_string());
            Err(LlmError::Upstream(message))
        }
        "message_stop" => Ok(Frame::Stop),
        // message_start, content_block_start/stop, message_delta, ping
        _ => Ok(Frame::Skip),
    }
}

/// Adapts a parsed SSE event stream into a `ChatStream`. The returned stream
/// ends after the first error.
pub(crate) fn text_fragments<S, E>(events: S) -> ChatStream
where
    S: Stream<Item = Result<Event, EventStreamError<E>>> + Send + 'static,
    E: Display + Send + 'static,
{
    let events = Box::pin(events);
    stream::unfold(Some(events), |state| async move {
        let mut events = state?;
        loop {
            let frame = match events.next().await {
                Some(Ok(event)) => {
                    trace!("Anthropic SSE: [{}] {}", event.event, event.data);
                    decode_event(&event.event, &event.data)
                }
                Some(Err(e)) => Err(LlmError::Stream(e.to_string())),
                None => Err(LlmError::Truncated),
            };

            match frame {
                Ok(Frame::Text(text)) => return Some((Ok(text), Some(events))),
                Ok(Frame::Skip) => continue,
                Ok(Frame::Stop) => return None,
                Err(e) => {
                    error!("Upstream stream failed: {e}");
                    return Some((Err(e), None));
                }
            }
        }
    })
    .boxed()
}
