use std::sync::Arc;

use futures::StreamExt;
use parley_client::{CancellationToken, ChatBackend, Result, StreamError};
use parley_types::{ChatSession, DoneReason, MessageId, ProfileUpdate, StreamEvent, User};

use crate::state::{Applied, Conversation, Turn, TurnId, TurnRequest};
use crate::store::ThreadStore;

/// Receives rendering callbacks while a turn runs
pub trait TurnObserver: Send {
    /// Text appended to the reply
    fn on_delta(&mut self, _content: &str) {}

    /// Inline error frame or connection failure
    fn on_error(&mut self, _message: &str) {}

    /// The backend created a thread for this conversation
    fn on_thread_created(&mut self, _thread_id: &str) {}
}

/// Observer for callers that only look at the final message list
pub struct NoopObserver;

impl TurnObserver for NoopObserver {}

/// How a turn ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Stream ran to completion; `reconciled` is true when history was refetched
    Completed { reconciled: bool },
    /// Stopped, or superseded by a newer turn
    Cancelled,
    /// Could not connect, or the connection broke mid-stream
    Failed(String),
}

/// One signed-in client session: the open conversation plus cached threads
pub struct Workspace {
    backend: Arc<dyn ChatBackend>,
    store: ThreadStore,
    conversation: Conversation,
}

impl Workspace {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self {
            backend,
            store: ThreadStore::new(),
            conversation: Conversation::new(),
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn store(&self) -> &ThreadStore {
        &self.store
    }

    pub fn begin_send(&mut self, prompt: &str) -> Option<Turn> {
        self.conversation.begin_send(prompt)
    }

    pub fn begin_edit(&mut self, target: &MessageId, new_content: &str) -> Option<Turn> {
        self.conversation.begin_edit(target, new_content)
    }

    pub fn begin_regenerate(&mut self, target: &MessageId) -> Option<Turn> {
        self.conversation.begin_regenerate(target)
    }

    /// Send a prompt and stream the reply; `None` if the prompt was blank
    pub async fn send(
        &mut self,
        prompt: &str,
        observer: &mut dyn TurnObserver,
    ) -> Option<TurnOutcome> {
        let turn = self.begin_send(prompt)?;
        Some(self.run_turn(turn, observer).await)
    }

    /// Edit a user message and stream the regenerated reply
    pub async fn edit(
        &mut self,
        target: &MessageId,
        new_content: &str,
        observer: &mut dyn TurnObserver,
    ) -> Option<TurnOutcome> {
        let turn = self.begin_edit(target, new_content)?;
        Some(self.run_turn(turn, observer).await)
    }

    pub async fn regenerate(
        &mut self,
        target: &MessageId,
        observer: &mut dyn TurnObserver,
    ) -> Option<TurnOutcome> {
        let turn = self.begin_regenerate(target)?;
        Some(self.run_turn(turn, observer).await)
    }

    /// Drive a turn from request to reconciliation
    pub async fn run_turn(&mut self, turn: Turn, observer: &mut dyn TurnObserver) -> TurnOutcome {
        let id = turn.id();
        let cancel = turn.cancel_token();
        let opened = match turn.request() {
            TurnRequest::Send { prompt, thread_id } => {
                self.backend
                    .start_stream(prompt, thread_id.as_deref(), cancel.clone())
                    .await
            }
            TurnRequest::Edit {
                message_id,
                new_content,
            } => {
                self.backend
                    .start_edit_stream(message_id, new_content, cancel.clone())
                    .await
            }
        };

        let mut stream = match opened {
            Ok(stream) => stream,
            Err(e) => {
                let message = e.user_message();
                tracing::warn!(error = %e, "failed to open reply stream");
                return self.fail(id, message, observer);
            }
        };

        while let Some(item) = stream.next().await {
            let event = match item {
                Ok(event) => event,
                Err(StreamError::Transport(message)) => {
                    tracing::warn!(error = %message, "reply stream broke");
                    return self.fail(id, message, observer);
                }
            };

            match self.conversation.apply(id, &event) {
                Applied::Appended => {
                    if let StreamEvent::Chunk { content, .. } = &event {
                        observer.on_delta(content);
                    }
                }
                Applied::ThreadDiscovered(thread_id) => {
                    if let StreamEvent::Chunk { content, .. } = &event {
                        observer.on_delta(content);
                    }
                    observer.on_thread_created(&thread_id);
                    self.store.invalidate();
                    let refreshed = tokio::select! {
                        biased;

                        () = cancel.cancelled() => None,
                        result = self.store.refresh(self.backend.as_ref()) => Some(result.map(|_| ())),
                    };
                    match refreshed {
                        None => {
                            tracing::debug!("turn stopped during thread list refresh");
                            self.conversation.stop();
                            return TurnOutcome::Cancelled;
                        }
                        Some(Err(e)) => tracing::warn!(error = %e, "failed to refresh thread list"),
                        Some(Ok(())) => {}
                    }
                }
                Applied::ErrorNoted => {
                    if let StreamEvent::Error { message } = &event {
                        observer.on_error(message);
                    }
                }
                Applied::Finished { reason, reconcile } => {
                    return self.finish(id, reason, reconcile, &cancel).await;
                }
                Applied::Stale => return TurnOutcome::Cancelled,
            }
        }

        // Streams from parse_event_stream always end with Done; anything
        // else is treated like a close without the sentinel.
        match self
            .conversation
            .apply(id, &StreamEvent::done(DoneReason::EndOfStream))
        {
            Applied::Finished { reason, reconcile } => {
                self.finish(id, reason, reconcile, &cancel).await
            }
            _ => TurnOutcome::Cancelled,
        }
    }

    /// Settle a finished turn; stopping during the history fetch keeps the local list
    async fn finish(
        &mut self,
        id: TurnId,
        reason: DoneReason,
        reconcile: bool,
        cancel: &CancellationToken,
    ) -> TurnOutcome {
        if !reason.is_completed() {
            tracing::debug!("turn cancelled");
            return TurnOutcome::Cancelled;
        }
        if !reconcile {
            return TurnOutcome::Completed { reconciled: false };
        }

        let Some(thread_id) = self.conversation.thread_id().map(str::to_string) else {
            self.conversation.finish_reconcile(id, None);
            return TurnOutcome::Completed { reconciled: false };
        };

        let fetched = tokio::select! {
            biased;

            () = cancel.cancelled() => None,
            result = self.backend.fetch_history(&thread_id) => Some(result),
        };

        match fetched {
            None => {
                tracing::debug!(thread_id, "turn stopped during reconciliation");
                self.conversation.finish_reconcile(id, None);
                TurnOutcome::Cancelled
            }
            Some(Ok(history)) => {
                tracing::debug!(thread_id, count = history.len(), "reconciled with backend");
                self.conversation.finish_reconcile(id, Some(history));
                TurnOutcome::Completed { reconciled: true }
            }
            Some(Err(e)) => {
                tracing::warn!(thread_id, error = %e, "reconciliation failed; keeping local messages");
                self.conversation.finish_reconcile(id, None);
                TurnOutcome::Completed { reconciled: false }
            }
        }
    }

    fn fail(&mut self, id: TurnId, message: String, observer: &mut dyn TurnObserver) -> TurnOutcome {
        if !self.conversation.fail(id, &message) {
            return TurnOutcome::Cancelled;
        }
        observer.on_error(&message);
        TurnOutcome::Failed(message)
    }

    /// Abort the in-flight turn, keeping whatever text has arrived
    pub fn stop(&mut self) -> bool {
        self.conversation.stop()
    }

    pub fn new_chat(&mut self) {
        self.conversation.new_chat();
    }

    /// Switch to a thread and load its persisted history
    pub async fn open_thread(&mut self, thread_id: &str) -> Result<()> {
        self.conversation.open(thread_id);
        let history = self.backend.fetch_history(thread_id).await?;
        self.conversation.load_history(thread_id, history);
        Ok(())
    }

    /// Thread list, served from cache unless stale
    pub async fn threads(&mut self) -> Result<&[ChatSession]> {
        self.store.threads(self.backend.as_ref()).await
    }

    pub async fn refresh_threads(&mut self) -> Result<&[ChatSession]> {
        self.store.refresh(self.backend.as_ref()).await
    }

    /// Rename optimistically; on failure the cache is dropped and refetched later
    pub async fn rename_thread(&mut self, thread_id: &str, title: &str) -> Result<()> {
        self.store.rename(thread_id, title);
        match self.backend.rename_thread(thread_id, title).await {
            Ok(renamed) => {
                self.store.rename(&renamed.id, &renamed.title);
                Ok(())
            }
            Err(e) => {
                self.store.invalidate();
                Err(e)
            }
        }
    }

    /// Delete on the backend first, then drop it locally
    pub async fn delete_thread(&mut self, thread_id: &str) -> Result<()> {
        let deleted = self.backend.delete_thread(thread_id).await?;
        tracing::debug!(thread_id, status = %deleted.status, "thread deleted");
        self.store.remove(thread_id);
        if self.conversation.thread_id() == Some(thread_id) {
            self.conversation.new_chat();
        }
        Ok(())
    }

    pub async fn profile(&mut self) -> Result<Option<&User>> {
        self.store.profile(self.backend.as_ref()).await
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<User> {
        let auth = self.backend.login(email, password).await?;
        self.store.clear();
        self.store.set_profile(Some(auth.user.clone()));
        self.conversation.new_chat();
        Ok(auth.user)
    }

    pub async fn signup(&mut self, full_name: &str, email: &str, password: &str) -> Result<User> {
        self.backend.signup(full_name, email, password).await
    }

    pub async fn update_profile(&mut self, update: ProfileUpdate) -> Result<User> {
        let user = self.backend.update_profile(update).await?;
        self.store.set_profile(Some(user.clone()));
        Ok(user)
    }

    pub async fn logout(&mut self) {
        self.backend.logout().await;
        self.store.clear();
        self.store.set_profile(None);
        self.conversation.new_chat();
    }
}
