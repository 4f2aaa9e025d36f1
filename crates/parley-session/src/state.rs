use parley_types::{DoneReason, Message, MessageId, StreamEvent};
use tokio_util::sync::CancellationToken;

/// Where the active conversation is in its turn lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    Idle,
    /// Placeholder inserted, nothing received yet
    AwaitingFirstToken,
    /// Reply text is growing
    Streaming,
    /// Turn finished, authoritative history is being fetched
    Reconciling,
}

/// Monotonic turn identifier; events tagged with an older id are stale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TurnId(u64);

/// Network request a turn needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnRequest {
    Send {
        prompt: String,
        thread_id: Option<String>,
    },
    Edit {
        message_id: String,
        new_content: String,
    },
}

/// Handle for one in-flight turn
#[derive(Debug, Clone)]
pub struct Turn {
    id: TurnId,
    request: TurnRequest,
    cancel: CancellationToken,
}

impl Turn {
    pub fn id(&self) -> TurnId {
        self.id
    }

    pub fn request(&self) -> &TurnRequest {
        &self.request
    }

    /// Token bound to this turn; cancelling it stops the turn
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

/// Effect of folding one stream event into the conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    /// Text appended to the turn's reply
    Appended,
    /// Text appended and the backend created this thread
    ThreadDiscovered(String),
    /// Inline error rendered as its own bubble
    ErrorNoted,
    /// Turn is over; `reconcile` asks for an authoritative history fetch
    Finished { reason: DoneReason, reconcile: bool },
    /// Event from a superseded or stopped turn; nothing changed
    Stale,
}

struct ActiveTurn {
    id: TurnId,
    cancel: CancellationToken,
    /// Placeholder the reply streams into
    reply: MessageId,
}

/// Message list of the conversation on screen
///
/// All mutation goes through `&mut self`, so there is a single writer to the
/// trailing assistant slot. Starting any turn cancels the previous one first.
pub struct Conversation {
    thread_id: Option<String>,
    messages: Vec<Message>,
    phase: TurnPhase,
    active: Option<ActiveTurn>,
    next_turn: u64,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    /// Fresh "new chat" with no thread yet
    pub fn new() -> Self {
        Self {
            thread_id: None,
            messages: Vec::new(),
            phase: TurnPhase::Idle,
            active: None,
            next_turn: 0,
        }
    }

    /// Conversation over an existing thread's persisted history
    pub fn with_history(thread_id: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            thread_id: Some(thread_id.into()),
            messages,
            ..Self::new()
        }
    }

    pub fn thread_id(&self) -> Option<&str> {
        self.thread_id.as_deref()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    pub fn is_busy(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_turn(&self) -> Option<TurnId> {
        self.active.as_ref().map(|turn| turn.id)
    }

    /// Optimistically append a user message plus an empty reply slot
    ///
    /// Whitespace-only prompts are ignored.
    pub fn begin_send(&mut self, prompt: &str) -> Option<Turn> {
        if prompt.trim().is_empty() {
            return None;
        }

        self.cancel_active();

        let placeholder = Message::placeholder(self.thread_id.clone());
        let reply = placeholder.id.clone();
        self.messages
            .push(Message::local_user(self.thread_id.clone(), prompt));
        self.messages.push(placeholder);

        let request = TurnRequest::Send {
            prompt: prompt.to_string(),
            thread_id: self.thread_id.clone(),
        };
        Some(self.start_turn(request, reply))
    }

    /// Rewrite a persisted user message and regenerate everything after it
    ///
    /// The list becomes everything before the target, the edited target and a
    /// fresh placeholder. Unknown ids, assistant messages and messages the
    /// backend has not stored yet leave the conversation untouched.
    pub fn begin_edit(&mut self, target: &MessageId, new_content: &str) -> Option<Turn> {
        if new_content.trim().is_empty() {
            return None;
        }

        let index = self.messages.iter().position(|m| &m.id == target)?;
        let original = &self.messages[index];

        if !original.is_user() {
            tracing::debug!(message = %target, "only user messages can be edited");
            return None;
        }
        let Some(server_id) = original.id.as_persisted().map(str::to_string) else {
            tracing::warn!(message = %target, "message not stored by the backend yet; edit ignored");
            return None;
        };

        self.cancel_active();

        let mut edited = self.messages[index].clone();
        edited.content = new_content.to_string();

        self.messages.truncate(index);
        self.messages.push(edited);

        let placeholder = Message::placeholder(self.thread_id.clone());
        let reply = placeholder.id.clone();
        self.messages.push(placeholder);

        let request = TurnRequest::Edit {
            message_id: server_id,
            new_content: new_content.to_string(),
        };
        Some(self.start_turn(request, reply))
    }

    /// Ask again for an assistant reply, keeping the prompt that produced it
    pub fn begin_regenerate(&mut self, target: &MessageId) -> Option<Turn> {
        let index = self.messages.iter().position(|m| &m.id == target)?;
        if !self.messages[index].is_assistant() {
            return None;
        }

        let prompt = self.messages[..index].iter().rev().find(|m| m.is_user())?;
        let (prompt_id, content) = (prompt.id.clone(), prompt.content.clone());
        self.begin_edit(&prompt_id, &content)
    }

    /// Fold one stream event into the message list
    pub fn apply(&mut self, turn: TurnId, event: &StreamEvent) -> Applied {
        if self.active_turn() != Some(turn) {
            return Applied::Stale;
        }

        match event {
            StreamEvent::Chunk { content, thread_id } => {
                self.phase = TurnPhase::Streaming;
                self.reply_slot().content.push_str(content);

                match thread_id {
                    Some(id) if self.thread_id.is_none() => {
                        self.adopt_thread(id);
                        Applied::ThreadDiscovered(id.clone())
                    }
                    _ => Applied::Appended,
                }
            }
            StreamEvent::Error { message } => {
                self.messages
                    .push(Message::error_notice(self.thread_id.clone(), message));
                Applied::ErrorNoted
            }
            StreamEvent::Done { reason } => {
                let reconcile = reason.is_completed() && self.thread_id.is_some();
                if reconcile {
                    self.phase = TurnPhase::Reconciling;
                } else {
                    self.end_turn();
                }
                Applied::Finished {
                    reason: *reason,
                    reconcile,
                }
            }
        }
    }

    /// Connection failure: render it and end the turn without reconciling
    ///
    /// Returns false if `turn` is no longer the active one.
    pub fn fail(&mut self, turn: TurnId, error: &str) -> bool {
        if self.active_turn() != Some(turn) {
            return false;
        }

        if let Some(active) = &self.active {
            let reply = active.reply.clone();
            self.messages
                .retain(|m| m.id != reply || !m.content.is_empty());
        }
        self.messages
            .push(Message::error_notice(self.thread_id.clone(), error));
        self.end_turn();
        true
    }

    /// Finish reconciliation; `history` replaces local state when present
    ///
    /// `None` means the fetch failed and the optimistic list stays as is.
    pub fn finish_reconcile(&mut self, turn: TurnId, history: Option<Vec<Message>>) -> bool {
        if self.active_turn() != Some(turn) {
            return false;
        }

        if let Some(history) = history {
            self.messages = history;
        }
        self.end_turn();
        true
    }

    /// Pause/stop: abort the active turn and freeze what has been rendered
    pub fn stop(&mut self) -> bool {
        let stopped = self.cancel_active();
        self.phase = TurnPhase::Idle;
        stopped
    }

    /// Start over with no thread
    pub fn new_chat(&mut self) {
        self.cancel_active();
        self.phase = TurnPhase::Idle;
        self.thread_id = None;
        self.messages.clear();
    }

    /// Switch to another thread; its history arrives via `load_history`
    pub fn open(&mut self, thread_id: impl Into<String>) {
        self.cancel_active();
        self.phase = TurnPhase::Idle;
        self.thread_id = Some(thread_id.into());
        self.messages.clear();
    }

    /// Install persisted history for the open thread
    ///
    /// Ignored while a turn is running or if another thread was opened since.
    pub fn load_history(&mut self, thread_id: &str, messages: Vec<Message>) -> bool {
        if self.is_busy() || self.thread_id.as_deref() != Some(thread_id) {
            return false;
        }
        self.messages = messages;
        true
    }

    fn start_turn(&mut self, request: TurnRequest, reply: MessageId) -> Turn {
        self.next_turn += 1;
        let id = TurnId(self.next_turn);
        let cancel = CancellationToken::new();

        tracing::debug!(turn = id.0, "turn started");

        self.active = Some(ActiveTurn {
            id,
            cancel: cancel.clone(),
            reply,
        });
        self.phase = TurnPhase::AwaitingFirstToken;

        Turn { id, request, cancel }
    }

    fn cancel_active(&mut self) -> bool {
        match self.active.take() {
            Some(active) => {
                tracing::debug!(turn = active.id.0, "cancelling in-flight turn");
                active.cancel.cancel();
                true
            }
            None => false,
        }
    }

    fn end_turn(&mut self) {
        self.active = None;
        self.phase = TurnPhase::Idle;
    }

    /// Placeholder of the active turn, re-created if it went missing
    fn reply_slot(&mut self) -> &mut Message {
        let reply = self.active.as_ref().map(|turn| turn.reply.clone());
        let index = reply
            .and_then(|id| self.messages.iter().rposition(|m| m.id == id));

        match index {
            Some(index) => &mut self.messages[index],
            None => {
                let placeholder = Message::placeholder(self.thread_id.clone());
                if let Some(active) = self.active.as_mut() {
                    active.reply = placeholder.id.clone();
                }
                self.messages.push(placeholder);
                let last = self.messages.len() - 1;
                &mut self.messages[last]
            }
        }
    }

    fn adopt_thread(&mut self, thread_id: &str) {
        tracing::info!(thread_id, "backend created thread");
        self.thread_id = Some(thread_id.to_string());
        for message in self.messages.iter_mut().filter(|m| m.chat_id.is_none()) {
            message.chat_id = Some(thread_id.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_types::Role;

    fn persisted(id: &str, role: Role, content: &str) -> Message {
        let mut message = match role {
            Role::User => Message::local_user(Some("t1".to_string()), content),
            Role::Assistant => Message::placeholder(Some("t1".to_string())),
        };
        message.id = MessageId::persisted(id);
        message.content = content.to_string();
        message
    }

    fn contents(conversation: &Conversation) -> Vec<&str> {
        conversation
            .messages()
            .iter()
            .map(|m| m.content.as_str())
            .collect()
    }

    #[test]
    fn test_send_inserts_user_and_placeholder() {
        let mut conversation = Conversation::new();

        let turn = conversation.begin_send("Hello").unwrap();

        assert_eq!(conversation.phase(), TurnPhase::AwaitingFirstToken);
        assert_eq!(conversation.messages().len(), 2);
        assert!(conversation.messages()[0].is_user());
        assert!(conversation.messages()[1].is_assistant());
        assert!(conversation.messages()[1].content.is_empty());
        assert_eq!(
            turn.request(),
            &TurnRequest::Send {
                prompt: "Hello".to_string(),
                thread_id: None
            }
        );
    }

    #[test]
    fn test_blank_prompt_ignored() {
        let mut conversation = Conversation::new();
        assert!(conversation.begin_send("   \n").is_none());
        assert!(conversation.messages().is_empty());
        assert_eq!(conversation.phase(), TurnPhase::Idle);
    }

    #[test]
    fn test_chunks_append_to_placeholder() {
        let mut conversation = Conversation::new();
        let turn = conversation.begin_send("Hi").unwrap();

        assert_eq!(conversation.apply(turn.id(), &StreamEvent::chunk("Hel")), Applied::Appended);
        assert_eq!(conversation.phase(), TurnPhase::Streaming);
        conversation.apply(turn.id(), &StreamEvent::chunk("lo"));

        assert_eq!(contents(&conversation), vec!["Hi", "Hello"]);
    }

    #[test]
    fn test_thread_discovered_once() {
        let mut conversation = Conversation::new();
        let turn = conversation.begin_send("Hi").unwrap();

        let first = conversation.apply(turn.id(), &StreamEvent::chunk_with_thread("a", "t1"));
        let second = conversation.apply(turn.id(), &StreamEvent::chunk_with_thread("b", "t1"));

        assert_eq!(first, Applied::ThreadDiscovered("t1".to_string()));
        assert_eq!(second, Applied::Appended);
        assert_eq!(conversation.thread_id(), Some("t1"));
        assert!(conversation
            .messages()
            .iter()
            .all(|m| m.chat_id.as_deref() == Some("t1")));
    }

    #[test]
    fn test_thread_id_ignored_for_existing_thread() {
        let mut conversation = Conversation::with_history("t1", Vec::new());
        let turn = conversation.begin_send("Hi").unwrap();

        let applied = conversation.apply(turn.id(), &StreamEvent::chunk_with_thread("a", "t2"));

        assert_eq!(applied, Applied::Appended);
        assert_eq!(conversation.thread_id(), Some("t1"));
    }

    #[test]
    fn test_error_frame_adds_bubble_and_keeps_streaming() {
        let mut conversation = Conversation::new();
        let turn = conversation.begin_send("Hi").unwrap();

        conversation.apply(turn.id(), &StreamEvent::chunk("par"));
        assert_eq!(
            conversation.apply(turn.id(), &StreamEvent::error("tool failed")),
            Applied::ErrorNoted
        );
        conversation.apply(turn.id(), &StreamEvent::chunk("tial"));

        assert_eq!(contents(&conversation), vec!["Hi", "partial", "Error: tool failed"]);
        assert!(conversation.is_busy());
    }

    #[test]
    fn test_done_with_thread_requests_reconcile() {
        let mut conversation = Conversation::new();
        let turn = conversation.begin_send("Hi").unwrap();
        conversation.apply(turn.id(), &StreamEvent::chunk_with_thread("Yo", "t1"));

        let applied = conversation.apply(turn.id(), &StreamEvent::done(DoneReason::Sentinel));

        assert_eq!(
            applied,
            Applied::Finished {
                reason: DoneReason::Sentinel,
                reconcile: true
            }
        );
        assert_eq!(conversation.phase(), TurnPhase::Reconciling);

        let history = vec![
            persisted("m1", Role::User, "Hi"),
            persisted("m2", Role::Assistant, "Yo"),
        ];
        assert!(conversation.finish_reconcile(turn.id(), Some(history)));
        assert_eq!(conversation.phase(), TurnPhase::Idle);
        assert!(conversation.messages().iter().all(|m| !m.id.is_local()));
        assert_eq!(contents(&conversation), vec!["Hi", "Yo"]);
    }

    #[test]
    fn test_done_without_thread_goes_idle() {
        let mut conversation = Conversation::new();
        let turn = conversation.begin_send("Hi").unwrap();
        conversation.apply(turn.id(), &StreamEvent::chunk("Yo"));

        let applied = conversation.apply(turn.id(), &StreamEvent::done(DoneReason::EndOfStream));

        assert_eq!(
            applied,
            Applied::Finished {
                reason: DoneReason::EndOfStream,
                reconcile: false
            }
        );
        assert_eq!(conversation.phase(), TurnPhase::Idle);
        assert!(!conversation.is_busy());
    }

    #[test]
    fn test_failed_reconcile_keeps_local_state() {
        let mut conversation = Conversation::with_history("t1", Vec::new());
        let turn = conversation.begin_send("Hi").unwrap();
        conversation.apply(turn.id(), &StreamEvent::chunk("Yo"));
        conversation.apply(turn.id(), &StreamEvent::done(DoneReason::Sentinel));

        assert!(conversation.finish_reconcile(turn.id(), None));

        assert_eq!(contents(&conversation), vec!["Hi", "Yo"]);
        assert_eq!(conversation.phase(), TurnPhase::Idle);
    }

    #[test]
    fn test_new_turn_cancels_previous_token() {
        let mut conversation = Conversation::new();
        let first = conversation.begin_send("one").unwrap();
        let first_token = first.cancel_token();

        let second = conversation.begin_send("two").unwrap();

        assert!(first_token.is_cancelled());
        assert!(!second.cancel_token().is_cancelled());
        assert_eq!(conversation.active_turn(), Some(second.id()));
    }

    #[test]
    fn test_stale_events_ignored() {
        let mut conversation = Conversation::new();
        let first = conversation.begin_send("one").unwrap();
        let second = conversation.begin_send("two").unwrap();

        assert_eq!(conversation.apply(first.id(), &StreamEvent::chunk("late")), Applied::Stale);
        conversation.apply(second.id(), &StreamEvent::chunk("fresh"));

        assert_eq!(contents(&conversation), vec!["one", "", "two", "fresh"]);
    }

    #[test]
    fn test_stop_freezes_partial_reply() {
        let mut conversation = Conversation::new();
        let turn = conversation.begin_send("Hi").unwrap();
        conversation.apply(turn.id(), &StreamEvent::chunk("Par"));

        assert!(conversation.stop());

        assert!(turn.cancel_token().is_cancelled());
        assert_eq!(conversation.phase(), TurnPhase::Idle);
        assert_eq!(conversation.apply(turn.id(), &StreamEvent::chunk("tial")), Applied::Stale);
        assert_eq!(contents(&conversation), vec!["Hi", "Par"]);
        assert!(!conversation.stop());
    }

    #[test]
    fn test_cancelled_done_skips_reconcile() {
        let mut conversation = Conversation::with_history("t1", Vec::new());
        let turn = conversation.begin_send("Hi").unwrap();
        turn.cancel_token().cancel();

        let applied = conversation.apply(turn.id(), &StreamEvent::done(DoneReason::Cancelled));

        assert_eq!(
            applied,
            Applied::Finished {
                reason: DoneReason::Cancelled,
                reconcile: false
            }
        );
        assert_eq!(conversation.phase(), TurnPhase::Idle);
    }

    #[test]
    fn test_edit_truncates_after_target() {
        let history = vec![
            persisted("a", Role::User, "A"),
            persisted("m", Role::User, "M"),
            persisted("b", Role::Assistant, "B"),
            persisted("c", Role::User, "C"),
        ];
        let mut conversation = Conversation::with_history("t1", history);

        let turn = conversation
            .begin_edit(&MessageId::persisted("m"), "M'")
            .unwrap();

        assert_eq!(contents(&conversation), vec!["A", "M'", ""]);
        assert_eq!(conversation.messages()[1].id, MessageId::persisted("m"));
        assert!(conversation.messages()[2].is_assistant());
        assert_eq!(conversation.phase(), TurnPhase::AwaitingFirstToken);
        assert_eq!(
            turn.request(),
            &TurnRequest::Edit {
                message_id: "m".to_string(),
                new_content: "M'".to_string()
            }
        );
    }

    #[test]
    fn test_edit_unknown_target_is_noop() {
        let history = vec![persisted("a", Role::User, "A")];
        let mut conversation = Conversation::with_history("t1", history);
        let running = conversation.begin_send("B").unwrap();

        assert!(conversation
            .begin_edit(&MessageId::persisted("missing"), "x")
            .is_none());

        assert!(!running.cancel_token().is_cancelled());
        assert_eq!(contents(&conversation), vec!["A", "B", ""]);
    }

    #[test]
    fn test_edit_rejects_local_and_assistant_messages() {
        let history = vec![
            persisted("a", Role::User, "A"),
            persisted("b", Role::Assistant, "B"),
        ];
        let mut conversation = Conversation::with_history("t1", history);
        assert!(conversation
            .begin_edit(&MessageId::persisted("b"), "x")
            .is_none());

        let turn = conversation.begin_send("C").unwrap();
        conversation.apply(turn.id(), &StreamEvent::done(DoneReason::Cancelled));
        let local_id = conversation.messages()[2].id.clone();
        assert!(local_id.is_local());
        assert!(conversation.begin_edit(&local_id, "x").is_none());
    }

    #[test]
    fn test_regenerate_reissues_previous_prompt() {
        let history = vec![
            persisted("a", Role::User, "Question"),
            persisted("b", Role::Assistant, "Answer"),
        ];
        let mut conversation = Conversation::with_history("t1", history);

        let turn = conversation
            .begin_regenerate(&MessageId::persisted("b"))
            .unwrap();

        assert_eq!(contents(&conversation), vec!["Question", ""]);
        assert_eq!(
            turn.request(),
            &TurnRequest::Edit {
                message_id: "a".to_string(),
                new_content: "Question".to_string()
            }
        );
    }

    #[test]
    fn test_fail_replaces_empty_placeholder() {
        let mut conversation = Conversation::new();
        let turn = conversation.begin_send("Hi").unwrap();

        assert!(conversation.fail(turn.id(), "Stream connection failed"));

        assert_eq!(contents(&conversation), vec!["Hi", "Error: Stream connection failed"]);
        assert_eq!(conversation.phase(), TurnPhase::Idle);
        assert!(!conversation.fail(turn.id(), "again"));
    }

    #[test]
    fn test_new_chat_and_open() {
        let mut conversation = Conversation::with_history("t1", vec![persisted("a", Role::User, "A")]);
        let turn = conversation.begin_send("B").unwrap();

        conversation.new_chat();
        assert!(turn.cancel_token().is_cancelled());
        assert!(conversation.messages().is_empty());
        assert_eq!(conversation.thread_id(), None);

        conversation.open("t2");
        assert!(!conversation.load_history("t1", vec![persisted("x", Role::User, "X")]));
        assert!(conversation.load_history("t2", vec![persisted("y", Role::User, "Y")]));
        assert_eq!(contents(&conversation), vec!["Y"]);
    }
}
