use config::builder::{ConfigBuilder, DefaultState};
use config::{Config as ConfigLoader, ConfigError, Environment, File};
use parley_client::{ClientConfig, DEFAULT_API_BASE};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct CliConfig {
    pub api: ApiConfig,
    pub logging: LoggingConfig,

    // Secret (from ENV only)
    #[serde(skip)]
    pub access_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl CliConfig {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. built-in defaults
    /// 2. config/default.toml
    /// 3. config/{PARLEY_ENV}.toml (if PARLEY_ENV is set)
    /// 4. PARLEY_-prefixed variables, `__` between sections (PARLEY_API__BASE_URL)
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Self::defaults()?
            .add_source(File::with_name("config/default").required(false));

        if let Ok(env) = std::env::var("PARLEY_ENV") {
            builder = builder.add_source(File::with_name(&format!("config/{}", env)).required(false));
        }

        let config = builder
            .add_source(
                Environment::with_prefix("PARLEY")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut cfg: CliConfig = config.try_deserialize()?;
        cfg.access_token = std::env::var("PARLEY_ACCESS_TOKEN")
            .ok()
            .filter(|token| !token.trim().is_empty());

        Ok(cfg)
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        ConfigLoader::builder()
            .set_default("api.base_url", DEFAULT_API_BASE)?
            .set_default("logging.level", "warn")?
            .set_default("logging.format", "pretty")
    }

    pub fn client_config(&self) -> ClientConfig {
        let config = ClientConfig::new(&self.api.base_url);
        match &self.access_token {
            Some(token) => config.with_access_token(token),
            None => config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_structure() {
        let toml = r#"
            [api]
            base_url = "https://chat.example.com/api/v1"

            [logging]
            level = "debug"
            format = "json"
        "#;

        let config: CliConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.api.base_url, "https://chat.example.com/api/v1");
        assert_eq!(config.logging.format, "json");
        assert!(config.access_token.is_none());
    }

    #[test]
    fn test_defaults_fill_missing_sections() {
        let config: CliConfig = CliConfig::defaults()
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.api.base_url, DEFAULT_API_BASE);
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_client_config_carries_token() {
        let mut config: CliConfig = CliConfig::defaults()
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        config.access_token = Some("secret".to_string());

        let client = config.client_config();
        assert_eq!(client.base_url, DEFAULT_API_BASE);
        assert_eq!(client.access_token.as_deref(), Some("secret"));
    }
}
