pub mod api;
pub mod buffer_utils;
pub mod config;
pub mod error;
pub mod streaming;
pub mod traits;

pub use api::ApiClient;
pub use config::{ClientConfig, DEFAULT_API_BASE};
pub use error::{ClientError, Result, StreamError};
pub use streaming::{cancelled_stream, consume, parse_event_stream, EventStream, StreamHandler};
pub use traits::{AccountClient, ChatBackend, HistoryClient, StreamingClient};

pub use tokio_util::sync::CancellationToken;
