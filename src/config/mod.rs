pub mod validation;

use std::path::Path;

use serde::{Deserialize, Serialize};

use self::validation::validate_config;

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "devstral:24b";
pub const BASE_URL_ENV: &str = "OLLAMA_BASE_URL";
pub const MODEL_ENV: &str = "OLLAMA_MODEL";

/// Error type for configuration loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Connection settings for the chat-completion service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Whole-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,
    #[serde(default)]
    pub http_use_env_proxy: bool,
}

fn default_timeout() -> u64 {
    180
}
fn default_connect_timeout() -> u64 {
    5
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            model: None,
            timeout: default_timeout(),
            connect_timeout: default_connect_timeout(),
            http_use_env_proxy: false,
        }
    }
}

/// Base URL and default model after applying config, environment and defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedUpstream {
    pub base_url: String,
    pub model: String,
}

impl UpstreamConfig {
    /// Resolve against the process environment.
    #[must_use]
    pub fn resolve(&self) -> ResolvedUpstream {
        self.resolve_with(|key| std::env::var(key).ok())
    }

    /// Resolve with an injected environment lookup.
    ///
    /// Explicit config wins over the environment, which wins over the
    /// built-in defaults. Empty values count as unset at every level.
    #[must_use]
    pub fn resolve_with<F>(&self, env: F) -> ResolvedUpstream
    where
        F: Fn(&str) -> Option<String>,
    {
        let pick = |explicit: Option<&String>, key: &str, fallback: &str| {
            explicit
                .filter(|value| !value.trim().is_empty())
                .cloned()
                .or_else(|| env(key).filter(|value| !value.trim().is_empty()))
                .unwrap_or_else(|| fallback.to_string())
        };
        ResolvedUpstream {
            base_url: pick(self.base_url.as_ref(), BASE_URL_ENV, DEFAULT_BASE_URL),
            model: pick(self.model.as_ref(), MODEL_ENV, DEFAULT_MODEL),
        }
    }
}

/// Feature toggles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeaturesConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "INFO".to_string()
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub features: FeaturesConfig,
}

/// Load configuration from a YAML file and validate it.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] when reading the file fails, [`ConfigError::Yaml`]
/// when parsing fails, or [`ConfigError::Validation`] when semantic validation fails.
pub fn load_config(path: impl AsRef<Path>) -> Result<AppConfig, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

/// Like [`load_config`], but a missing file yields the default config.
///
/// # Errors
///
/// Same as [`load_config`] for any failure other than the file not existing.
pub fn load_config_or_default(path: impl AsRef<Path>) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => parse_config(&contents),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(err) => Err(err.into()),
    }
}

/// Parse and validate YAML config text.
///
/// # Errors
///
/// Returns [`ConfigError::Yaml`] or [`ConfigError::Validation`].
pub fn parse_config(contents: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = serde_yaml::from_str(contents)?;
    validate_config(&config)?;
    Ok(config)
}
