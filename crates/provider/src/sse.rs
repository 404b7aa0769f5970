//! Server-sent event parsing for the Messages API stream.
//!
//! Events of interest: `content_block_delta` carrying incremental text, and
//! `message_stop` ending the sequence. Everything else (pings, block
//! boundaries, usage updates) is skipped.

use eventsource_stream::Eventsource as _;
use futures_util::{StreamExt as _, stream::try_unfold};
use maxline_types::{
    MaxlineError,
    traits::{ByteStream, TextStream},
};

/// Outcome of inspecting one SSE data payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Incremental text to yield to the caller.
    Delta(String),
    /// The stream is complete.
    Stop,
    /// Not text-bearing; skip.
    Ignored,
}

/// Inspect one SSE `data` payload.
#[must_use]
pub fn classify_event(data: &str) -> StreamEvent {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(data) else {
        return StreamEvent::Ignored;
    };

    match value.get("type").and_then(serde_json::Value::as_str) {
        Some("content_block_delta") => {
            let is_text = value
                .pointer("/delta/type")
                .and_then(serde_json::Value::as_str)
                == Some("text_delta");
            let text = value
                .pointer("/delta/text")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("");
            if is_text && !text.is_empty() {
                StreamEvent::Delta(text.to_string())
            } else {
                StreamEvent::Ignored
            }
        }
        Some("message_stop") => StreamEvent::Stop,
        _ => StreamEvent::Ignored,
    }
}

/// Turn a raw SSE byte stream into a lazy stream of text increments, in
/// strict arrival order.
///
/// A `message_stop` event or the end of the byte stream terminates the
/// sequence without error; a stream with no delta events yields nothing.
/// Dropping the returned stream drops the underlying connection.
pub fn delta_stream(bytes: ByteStream) -> TextStream {
    let events = bytes.eventsource();
    Box::pin(try_unfold(events, |mut events| async move {
        while let Some(next) = events.next().await {
            let event =
                next.map_err(|e| MaxlineError::Provider(format!("event stream error: {e}")))?;
            match classify_event(&event.data) {
                StreamEvent::Delta(text) => return Ok(Some((text, events))),
                StreamEvent::Stop => return Ok(None),
                StreamEvent::Ignored => {}
            }
        }
        Ok(None)
    }))
}
