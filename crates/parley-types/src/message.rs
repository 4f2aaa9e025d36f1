use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use uuid::Uuid;

/// Wire value of `chat_id` for messages whose thread does not exist yet
pub const TEMP_CHAT_ID: &str = "temp";

/// Message identifier
///
/// Optimistic entries get a `Local` id; everything read back from the
/// backend carries the server's `Persisted` id. Local ids never leave the
/// process, so reconciliation can tell the two apart without inspecting the
/// string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MessageId {
    Local(Uuid),
    Persisted(String),
}

impl MessageId {
    pub fn local() -> Self {
        Self::Local(Uuid::new_v4())
    }

    pub fn persisted(id: impl Into<String>) -> Self {
        Self::Persisted(id.into())
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Self::Local(_))
    }

    /// Server id, if the backend knows this message
    pub fn as_persisted(&self) -> Option<&str> {
        match self {
            Self::Persisted(id) => Some(id),
            Self::Local(_) => None,
        }
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(id) => write!(f, "local:{}", id),
            Self::Persisted(id) => f.write_str(id),
        }
    }
}

impl Serialize for MessageId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Local(id) => serializer.collect_str(id),
            Self::Persisted(id) => serializer.serialize_str(id),
        }
    }
}

impl<'de> Deserialize<'de> for MessageId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::Persisted)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One chat bubble
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    /// Owning thread; `None` until the backend assigns one
    #[serde(with = "chat_id")]
    pub chat_id: Option<String>,
    pub role: Role,
    pub content: String,
    #[serde(with = "crate::timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_summarized: bool,
}

impl Message {
    fn local(chat_id: Option<String>, role: Role, content: impl Into<String>) -> Self {
        Self {
            id: MessageId::local(),
            chat_id,
            role,
            content: content.into(),
            created_at: Utc::now(),
            is_summarized: false,
        }
    }

    /// Optimistic user message
    pub fn local_user(chat_id: Option<String>, content: impl Into<String>) -> Self {
        Self::local(chat_id, Role::User, content)
    }

    /// Empty assistant slot that streamed text is appended to
    pub fn placeholder(chat_id: Option<String>) -> Self {
        Self::local(chat_id, Role::Assistant, String::new())
    }

    /// Assistant bubble that renders an error inline
    pub fn error_notice(chat_id: Option<String>, error: &str) -> Self {
        Self::local(chat_id, Role::Assistant, format!("Error: {}", error))
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }

    pub fn is_assistant(&self) -> bool {
        self.role == Role::Assistant
    }
}

mod chat_id {
    use super::TEMP_CHAT_ID;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(value.as_deref().unwrap_or(TEMP_CHAT_ID))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.filter(|id| !id.is_empty() && id != TEMP_CHAT_ID))
    }
}
