use serde::{Deserialize, Serialize};
use std::fmt;

/// Backend used when nothing else is configured
pub const DEFAULT_API_BASE: &str = "http://localhost:8000/api/v1";

/// Connection settings for [`crate::ApiClient`]
#[derive(Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub base_url: String,
    /// Bearer token sent with every request (optional, set after login otherwise)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            access_token: None,
        }
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Base URL without trailing slashes
    pub fn normalized_base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE)
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, DEFAULT_API_BASE);
        assert!(config.access_token.is_none());
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let config = ClientConfig::new("http://example.com/api/");
        assert_eq!(config.normalized_base_url(), "http://example.com/api");
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = ClientConfig::default().with_access_token("secret-token");
        let debug = format!("{:?}", config);

        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_serde_roundtrip() {
        let config = ClientConfig::new("http://example.com").with_access_token("t");
        let json = serde_json::to_string(&config).unwrap();
        let parsed: ClientConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.base_url, "http://example.com");
        assert_eq!(parsed.access_token.as_deref(), Some("t"));
    }
}
