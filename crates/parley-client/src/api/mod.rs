mod client;
mod payloads;

pub use client::ApiClient;
