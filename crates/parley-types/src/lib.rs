pub mod events;
pub mod message;
pub mod thread;
pub mod user;
mod timestamp;

pub use events::{DoneReason, StreamEvent};
pub use message::{Message, MessageId, Role, TEMP_CHAT_ID};
pub use thread::{ChatSession, ThreadDeleted, ThreadRenamed};
pub use user::{AuthResponse, ProfileUpdate, User};
