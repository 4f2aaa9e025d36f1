use serde::{Deserialize, Serialize};

/// Semantic events decoded from a reply stream
///
/// A stream is finite: zero or more `Chunk`/`Error` events followed by
/// exactly one `Done`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Incremental assistant text
    Chunk {
        content: String,
        /// Thread created server-side for a threadless turn
        #[serde(skip_serializing_if = "Option::is_none")]
        thread_id: Option<String>,
    },

    /// Inline error annotation; the stream keeps going
    Error {
        message: String,
    },

    /// Terminal marker
    Done {
        reason: DoneReason,
    },
}

impl StreamEvent {
    pub fn chunk(content: impl Into<String>) -> Self {
        Self::Chunk {
            content: content.into(),
            thread_id: None,
        }
    }

    pub fn chunk_with_thread(content: impl Into<String>, thread_id: impl Into<String>) -> Self {
        Self::Chunk {
            content: content.into(),
            thread_id: Some(thread_id.into()),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn done(reason: DoneReason) -> Self {
        Self::Done { reason }
    }
}

/// Why a reply stream ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoneReason {
    /// The backend sent `[DONE]`
    Sentinel,
    /// The body closed without `[DONE]`; still treated as success
    EndOfStream,
    /// The turn's cancellation token fired
    Cancelled,
}

impl DoneReason {
    /// Whether the turn finished on its own and should be reconciled
    pub fn is_completed(&self) -> bool {
        !matches!(self, Self::Cancelled)
    }
}
