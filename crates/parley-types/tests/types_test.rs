use parley_types::{
    ChatSession, DoneReason, Message, MessageId, ProfileUpdate, Role, StreamEvent, ThreadDeleted, User,
};

#[test]
fn test_message_from_backend_is_persisted() {
    let json = r#"{
        "id": "m-1",
        "chat_id": "t-1",
        "role": "assistant",
        "content": "Hi there",
        "created_at": "2024-05-01T10:00:00.000000",
        "is_summarized": false
    }"#;

    let message: Message = serde_json::from_str(json).unwrap();

    assert_eq!(message.id, MessageId::persisted("m-1"));
    assert_eq!(message.chat_id.as_deref(), Some("t-1"));
    assert_eq!(message.role, Role::Assistant);
    assert_eq!(message.content, "Hi there");
}

#[test]
fn test_message_temp_chat_id_maps_to_none() {
    let json = r#"{"id":"m-2","chat_id":"temp","role":"user","content":"x","created_at":"2024-05-01T10:00:00Z"}"#;

    let message: Message = serde_json::from_str(json).unwrap();

    assert_eq!(message.chat_id, None);
    assert!(!message.is_summarized);
}

#[test]
fn test_local_message_serializes_temp_chat_id() {
    let message = Message::local_user(None, "Hello");
    let json = serde_json::to_value(&message).unwrap();

    assert_eq!(json["chat_id"], "temp");
    assert_eq!(json["role"], "user");
    assert!(message.id.is_local());
}

#[test]
fn test_placeholder_and_error_notice() {
    let placeholder = Message::placeholder(Some("t-1".to_string()));
    assert!(placeholder.is_assistant());
    assert!(placeholder.content.is_empty());

    let notice = Message::error_notice(None, "boom");
    assert!(notice.is_assistant());
    assert_eq!(notice.content, "Error: boom");
}

#[test]
fn test_message_id_display() {
    assert_eq!(MessageId::persisted("abc").to_string(), "abc");
    assert!(MessageId::local().to_string().starts_with("local:"));
    assert_eq!(MessageId::persisted("abc").as_persisted(), Some("abc"));
    assert_eq!(MessageId::local().as_persisted(), None);
}

#[test]
fn test_chat_session_listing() {
    let json = r#"[
        {"id":"t-1","title":"First","created_at":"2024-05-01T10:00:00","message_count":4},
        {"id":"t-2","title":"Second"}
    ]"#;

    let sessions: Vec<ChatSession> = serde_json::from_str(json).unwrap();

    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0].message_count, 4);
    assert!(sessions[0].created_at.is_some());
    assert_eq!(sessions[1], ChatSession::new("t-2", "Second"));
}

#[test]
fn test_delete_acknowledgement_tolerates_missing_fields() {
    let full: ThreadDeleted = serde_json::from_str(r#"{"status":"deleted","id":"t-1"}"#).unwrap();
    assert_eq!(full, ThreadDeleted::new("t-1"));

    let bare: ThreadDeleted = serde_json::from_str(r#"{"status":"ok"}"#).unwrap();
    assert_eq!(bare.status, "ok");
    assert!(bare.id.is_empty());
}

#[test]
fn test_stream_event_serialization() {
    let event = StreamEvent::chunk_with_thread("Hel", "t-1");
    let json = serde_json::to_string(&event).unwrap();

    assert!(json.contains("\"type\":\"chunk\""));
    assert!(json.contains("\"thread_id\":\"t-1\""));

    let done: StreamEvent = serde_json::from_str(r#"{"type":"done","reason":"end_of_stream"}"#).unwrap();
    assert_eq!(done, StreamEvent::done(DoneReason::EndOfStream));
}

#[test]
fn test_done_reason_completion() {
    assert!(DoneReason::Sentinel.is_completed());
    assert!(DoneReason::EndOfStream.is_completed());
    assert!(!DoneReason::Cancelled.is_completed());
}

#[test]
fn test_user_display_name() {
    let mut user = User {
        id: "u-1".to_string(),
        email: "ada@example.com".to_string(),
        full_name: None,
        avatar_url: None,
    };
    assert_eq!(user.display_name(), "ada@example.com");

    user.full_name = Some("Ada Lovelace".to_string());
    assert_eq!(user.display_name(), "Ada Lovelace");
}

#[test]
fn test_profile_update_skips_unset_fields() {
    let update = ProfileUpdate::new().full_name("Ada");
    let json = serde_json::to_value(&update).unwrap();

    assert_eq!(json, serde_json::json!({"full_name": "Ada"}));
    assert!(ProfileUpdate::new().is_empty());
}
