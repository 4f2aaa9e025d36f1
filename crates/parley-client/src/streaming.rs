use futures::{Stream, StreamExt};
use parley_types::{DoneReason, StreamEvent};
use std::fmt::Display;
use std::pin::Pin;
use tokio_util::sync::CancellationToken;

use crate::buffer_utils::{parse_record, Frame, FrameBuffer};
use crate::error::StreamError;

/// Lazy, non-restartable sequence of reply events
///
/// Ends after the first `Done` event or the first `Err` item.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, StreamError>> + Send>>;

enum Read<T> {
    Cancelled,
    Chunk(T),
    Closed,
}

/// Events decoded from the buffered records, up to a `[DONE]` marker
struct Drained {
    events: Vec<StreamEvent>,
    done: bool,
}

/// Parse records in order, stopping at the first `[DONE]`
fn drain(records: impl Iterator<Item = String>) -> Drained {
    let mut events = Vec::new();

    for record in records {
        for frame in parse_record(&record) {
            match frame {
                Frame::Done => return Drained { events, done: true },
                Frame::Event(event) => events.push(event),
            }
        }
    }

    Drained { events, done: false }
}

/// Turn a raw response body into reply events
///
/// Reads race against `cancel`; once it fires the stream yields a single
/// `Done { reason: Cancelled }` and stops, even if decoded frames are still
/// buffered. A body that closes without `[DONE]` ends with
/// `Done { reason: EndOfStream }`.
pub fn parse_event_stream<S, B, E>(body: S, cancel: CancellationToken) -> EventStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    Box::pin(async_stream::stream! {
        let mut body = Box::pin(body);
        let mut buffer = FrameBuffer::with_capacity(8192);

        'read: loop {
            let read = tokio::select! {
                biased;

                () = cancel.cancelled() => Read::Cancelled,
                next = body.next() => match next {
                    Some(chunk) => Read::Chunk(chunk),
                    None => Read::Closed,
                },
            };

            let (drained, closed) = match read {
                Read::Cancelled => {
                    tracing::debug!("reply stream cancelled");
                    yield Ok(StreamEvent::done(DoneReason::Cancelled));
                    break 'read;
                }
                Read::Chunk(Err(e)) => {
                    tracing::debug!(error = %e, "reply stream failed");
                    yield Err(StreamError::Transport(e.to_string()));
                    break 'read;
                }
                Read::Chunk(Ok(bytes)) => {
                    buffer.extend(bytes.as_ref());
                    (drain(std::iter::from_fn(|| buffer.next_record())), false)
                }
                Read::Closed => (drain(buffer.finish().into_iter()), true),
            };

            for event in drained.events {
                if cancel.is_cancelled() {
                    yield Ok(StreamEvent::done(DoneReason::Cancelled));
                    break 'read;
                }
                yield Ok(event);
            }

            if drained.done || closed {
                let reason = if cancel.is_cancelled() {
                    DoneReason::Cancelled
                } else if drained.done {
                    DoneReason::Sentinel
                } else {
                    tracing::debug!("reply stream closed without [DONE]");
                    DoneReason::EndOfStream
                };
                yield Ok(StreamEvent::done(reason));
                break 'read;
            }
        }
    })
}

/// Stream for a turn that was cancelled before the request got a response
pub fn cancelled_stream() -> EventStream {
    Box::pin(futures::stream::once(async {
        Ok(StreamEvent::done(DoneReason::Cancelled))
    }))
}

/// Callback view of a reply stream
pub trait StreamHandler {
    /// Incremental text; `thread_id` is set when the backend created a thread
    fn on_chunk(&mut self, content: &str, thread_id: Option<&str>);

    /// Inline error frame or read failure
    fn on_error(&mut self, message: &str);

    /// Called once when the turn ends, including on cancellation
    fn on_done(&mut self);
}

/// Drive `stream` to completion through `handler`
///
/// `on_done` fires exactly once unless reading fails, in which case
/// `on_error` receives the failure and the error is returned.
pub async fn consume<H>(mut stream: EventStream, handler: &mut H) -> Result<DoneReason, StreamError>
where
    H: StreamHandler + ?Sized,
{
    while let Some(item) = stream.next().await {
        match item {
            Ok(StreamEvent::Chunk { content, thread_id }) => {
                handler.on_chunk(&content, thread_id.as_deref());
            }
            Ok(StreamEvent::Error { message }) => handler.on_error(&message),
            Ok(StreamEvent::Done { reason }) => {
                handler.on_done();
                return Ok(reason);
            }
            Err(e) => {
                handler.on_error(&e.to_string());
                return Err(e);
            }
        }
    }

    handler.on_done();
    Ok(DoneReason::EndOfStream)
}
