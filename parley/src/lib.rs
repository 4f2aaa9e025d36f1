//! # Parley - streaming chat client
//!
//! Parley talks to a chat backend that answers prompts with a server-sent
//! event stream. It provides:
//! - **Stream consumption**: `data:` frames decoded into chunk, error and
//!   done events, with partial frames carried across network reads
//! - **Cancellable turns**: every turn owns a cancellation token and
//!   starting a new one aborts the previous request
//! - **Optimistic state**: user messages and reply placeholders appear
//!   immediately and are replaced by persisted history once a turn ends
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use parley::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut workspace = WorkspaceBuilder::new()
//!         .base_url("http://localhost:8000/api/v1")
//!         .build()?;
//!
//!     workspace.login("ada@example.com", "secret").await?;
//!     workspace.send("Hello!", &mut NoopObserver).await;
//!
//!     for message in workspace.conversation().messages() {
//!         println!("{:?}: {}", message.role, message.content);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **parley-types**: wire and domain types (StreamEvent, Message, ChatSession)
//! - **parley-client**: REST client, SSE frame parser and the backend traits
//! - **parley-session**: conversation state machine, thread cache and turn driver
//!
//! The `parley-cli` binary in the repository is a terminal front-end built on
//! these crates.

pub use parley_client as client;
pub use parley_session as session;
pub use parley_types as types;

pub use parley_client::{ApiClient, CancellationToken, ChatBackend, ClientConfig, ClientError};
pub use parley_session::{Conversation, TurnObserver, TurnOutcome, Workspace};
pub use parley_types::{ChatSession, Message, MessageId, Role, StreamEvent, User};

/// High-level builder for a connected workspace
pub mod builder;

/// Convenient prelude with commonly used types
pub mod prelude {
    pub use crate::builder::WorkspaceBuilder;
    pub use crate::session::{NoopObserver, TurnObserver, TurnOutcome, Workspace};
    pub use crate::types::{Message, MessageId, Role, StreamEvent};
    pub use anyhow::Result;
}
