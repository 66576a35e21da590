use crate::notebook::UploadProtocol;
use serde::Deserialize;
use std::env;
use std::sync::OnceLock;
use thiserror::Error;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the notebridge client.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Base URL of the document-intelligence service.
    pub api_url: String,
    /// Bearer token sent with every request.
    pub api_key: String,
    /// Upload endpoint revision used when the caller does not pick one.
    pub upload_protocol: UploadProtocol,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: load_env("NOTEBOOK_API_URL")?,
            api_key: load_env("NOTEBOOK_API_KEY")?,
            upload_protocol: load_env_optional("NOTEBOOK_UPLOAD_PROTOCOL")
                .map(|value| {
                    value.parse().map_err(|()| {
                        ConfigError::InvalidValue("NOTEBOOK_UPLOAD_PROTOCOL".to_string())
                    })
                })
                .transpose()?
                .unwrap_or_default(),
        })
    }
}

fn load_env(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingVariable(key.to_string()))
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
pub fn init_config() {
    dotenvy::dotenv().ok();
    let config = Config::from_env().expect("Failed to load config from environment");
    tracing::debug!(
        api_url = %config.api_url,
        upload_protocol = ?config.upload_protocol,
        "Loaded configuration"
    );
    CONFIG.set(config).expect("Failed to set config");
}
