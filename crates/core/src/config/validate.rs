use super::{
    types::{AuthMethod, Config},
    ConfigError,
};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - api_key is set when auth method requires it
/// - Catalog URL is non-empty
/// - Selection duration window is sane
/// - HTTP attempt bound is at least 1
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.auth.method == AuthMethod::ApiKey
        && config.auth.api_key.as_ref().is_none_or(|k| k.is_empty())
    {
        return Err(ConfigError::ValidationError(
            "auth.api_key must be set when auth.method is api_key".to_string(),
        ));
    }

    if config.catalog.url.is_empty() {
        return Err(ConfigError::ValidationError(
            "catalog.url cannot be empty".to_string(),
        ));
    }

    if config.selector.min_duration_secs >= config.selector.max_duration_secs {
        return Err(ConfigError::ValidationError(format!(
            "selector duration window is empty: min {} >= max {}",
            config.selector.min_duration_secs, config.selector.max_duration_secs
        )));
    }

    if config.pipeline.max_http_attempts == 0 {
        return Err(ConfigError::ValidationError(
            "pipeline.max_http_attempts must be at least 1".to_string(),
        ));
    }

    Ok(())
}
