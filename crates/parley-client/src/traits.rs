use async_trait::async_trait;
use parley_types::{
    AuthResponse, ChatSession, Message, ProfileUpdate, ThreadDeleted, ThreadRenamed, User,
};
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::streaming::EventStream;

/// Thread listing and authoritative history
#[async_trait]
pub trait HistoryClient: Send + Sync {
    /// Known threads, most recent first as the backend orders them
    async fn list_threads(&self) -> Result<Vec<ChatSession>>;

    /// Persisted messages of a thread, in chronological order
    async fn fetch_history(&self, thread_id: &str) -> Result<Vec<Message>>;

    async fn rename_thread(&self, thread_id: &str, title: &str) -> Result<ThreadRenamed>;

    async fn delete_thread(&self, thread_id: &str) -> Result<ThreadDeleted>;
}

/// Streaming replies
///
/// Both operations fail before streaming starts on a non-success response.
/// Cancelling the token aborts the request and ends the stream with
/// `Done { reason: Cancelled }`.
#[async_trait]
pub trait StreamingClient: Send + Sync {
    /// Send a new user message; `thread_id: None` lets the backend create a thread
    async fn start_stream(
        &self,
        prompt: &str,
        thread_id: Option<&str>,
        cancel: CancellationToken,
    ) -> Result<EventStream>;

    /// Replace a persisted user message and regenerate the reply to it
    async fn start_edit_stream(
        &self,
        message_id: &str,
        new_content: &str,
        cancel: CancellationToken,
    ) -> Result<EventStream>;
}

/// Authentication and profile
#[async_trait]
pub trait AccountClient: Send + Sync {
    /// Authenticate and keep the returned access token for later calls
    async fn login(&self, email: &str, password: &str) -> Result<AuthResponse>;

    async fn signup(&self, full_name: &str, email: &str, password: &str) -> Result<User>;

    /// Current user, or `None` when not authenticated
    async fn get_profile(&self) -> Result<Option<User>>;

    async fn update_profile(&self, update: ProfileUpdate) -> Result<User>;

    /// Forget the access token
    async fn logout(&self);
}

/// Convenience trait for clients that cover the whole backend
pub trait ChatBackend: HistoryClient + StreamingClient + AccountClient {}
