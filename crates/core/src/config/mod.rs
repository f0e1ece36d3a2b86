//! Configuration loading and validation.

mod loader;
mod types;
mod validate;

pub use loader::{load_config, load_config_from_str};
pub use types::{
    AuthConfig, AuthMethod, Config, DatabaseConfig, DiscoveryConfig, SanitizedAuthConfig,
    SanitizedCatalogConfig, SanitizedConfig, SanitizedDiscoveryConfig, SanitizedTmdbConfig,
    ServerConfig,
};
pub use validate::validate_config;

use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(String),

    #[error("failed to parse config: {0}")]
    ParseError(String),

    #[error("invalid config: {0}")]
    ValidationError(String),
}
