use parley_types::StreamEvent;
use serde_json::Value;

/// Payload that terminates a reply stream
pub const DONE_MARKER: &str = "[DONE]";

const DATA_PREFIX: &str = "data: ";

/// One decoded `data:` payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// The `[DONE]` sentinel
    Done,
    Event(StreamEvent),
}

/// Parse every `data: ` line of one record, skipping anything unusable
pub fn parse_record(record: &str) -> Vec<Frame> {
    record
        .lines()
        .filter_map(|line| line.strip_prefix(DATA_PREFIX))
        .filter_map(|data| parse_payload(data.trim()))
        .collect()
}

/// Interpret a single payload
///
/// `error` wins over `content` when both are present. Payloads that are not
/// JSON, or carry neither field as a non-empty string, yield `None`.
pub fn parse_payload(payload: &str) -> Option<Frame> {
    if payload == DONE_MARKER {
        return Some(Frame::Done);
    }

    let value: Value = match serde_json::from_str(payload) {
        Ok(value) => value,
        Err(e) => {
            tracing::trace!(error = %e, "skipping malformed frame");
            return None;
        }
    };

    if let Some(message) = non_empty_str(&value, "error") {
        return Some(Frame::Event(StreamEvent::error(message)));
    }

    let content = non_empty_str(&value, "content")?;
    Some(Frame::Event(StreamEvent::Chunk {
        content: content.to_string(),
        thread_id: non_empty_str(&value, "thread_id").map(str::to_string),
    }))
}

fn non_empty_str<'a>(value: &'a Value, field: &str) -> Option<&'a str> {
    value
        .get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}
