use super::{AppConfig, ConfigError};

const VALID_LOG_LEVELS: &[&str] = &["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL", "DISABLED"];

/// Validate the full application config, returning an error if any rule is violated.
///
/// # Errors
///
/// Returns [`ConfigError::Validation`] when any configuration invariant is violated.
pub fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    validate_upstream(config)?;
    validate_log_level(config)?;
    Ok(())
}

fn validation_err(msg: impl Into<String>) -> ConfigError {
    ConfigError::Validation(msg.into())
}

fn validate_upstream(config: &AppConfig) -> Result<(), ConfigError> {
    let upstream = &config.upstream;
    if let Some(base_url) = upstream.base_url.as_deref() {
        let parsed = url::Url::parse(base_url).map_err(|err| {
            validation_err(format!("upstream.base_url '{base_url}' is not a valid URL: {err}"))
        })?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(validation_err(
                "upstream.base_url must start with http:// or https://",
            ));
        }
    }
    if let Some(model) = upstream.model.as_deref() {
        if model.trim().is_empty() {
            return Err(validation_err("upstream.model cannot be empty when set"));
        }
    }
    if upstream.timeout == 0 {
        return Err(validation_err("upstream.timeout must be greater than 0"));
    }
    if upstream.connect_timeout == 0 {
        return Err(validation_err(
            "upstream.connect_timeout must be greater than 0",
        ));
    }
    Ok(())
}

fn validate_log_level(config: &AppConfig) -> Result<(), ConfigError> {
    if !VALID_LOG_LEVELS.contains(&config.features.log_level.as_str()) {
        return Err(validation_err(format!(
            "log_level must be one of {VALID_LOG_LEVELS:?}"
        )));
    }
    Ok(())
}
