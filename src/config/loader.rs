//! Configuration loading from disk.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::ServiceConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable that replaces `auth.jwt_secret`.
pub const JWT_SECRET_ENV: &str = "ADMISSION_JWT_SECRET";

/// Environment variable naming the config file (`--config` wins).
pub const CONFIG_PATH_ENV: &str = "ADMISSION_CONFIG";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),

    #[error("storage root {path:?} unusable: {source}")]
    StorageRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("policy construction failed: {0}")]
    Policy(String),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load, apply environment overrides, and validate a TOML file.
pub fn load_config(path: &Path) -> Result<ServiceConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse_config(&content)?;
    let config = apply_overrides(config, std::env::var(JWT_SECRET_ENV).ok());

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Deserialize without validation.
pub fn parse_config(content: &str) -> Result<ServiceConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Apply secret overrides taken from the environment.
pub fn apply_overrides(mut config: ServiceConfig, jwt_secret: Option<String>) -> ServiceConfig {
    if let Some(secret) = jwt_secret.filter(|s| !s.is_empty()) {
        config.auth.jwt_secret = secret;
    }
    config
}
