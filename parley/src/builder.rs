use crate::{ApiClient, ClientConfig, Workspace};
use anyhow::{Context, Result};
use parley_client::DEFAULT_API_BASE;
use std::sync::Arc;

/// Builds a [`Workspace`] backed by the HTTP client
///
/// # Example
///
/// ```rust,no_run
/// use parley::prelude::*;
///
/// # fn main() -> Result<()> {
/// let workspace = WorkspaceBuilder::new()
///     .base_url("https://chat.example.com/api/v1")
///     .access_token(std::env::var("PARLEY_ACCESS_TOKEN")?)
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct WorkspaceBuilder {
    config: ClientConfig,
}

impl Default for WorkspaceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkspaceBuilder {
    /// Start from the default backend address
    pub fn new() -> Self {
        Self {
            config: ClientConfig::new(DEFAULT_API_BASE),
        }
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    /// Token of an existing session; otherwise call `Workspace::login`
    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.config.access_token = Some(token.into());
        self
    }

    /// Build the HTTP client
    pub fn client(self) -> Result<ApiClient> {
        ApiClient::new(self.config).context("Failed to create API client")
    }

    pub fn build(self) -> Result<Workspace> {
        let client = self.client()?;
        Ok(Workspace::new(Arc::new(client)))
    }
}
