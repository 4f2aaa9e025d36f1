pub mod state;
pub mod store;
pub mod workspace;

pub use state::{Applied, Conversation, Turn, TurnId, TurnPhase, TurnRequest};
pub use store::ThreadStore;
pub use workspace::{NoopObserver, TurnObserver, TurnOutcome, Workspace};
