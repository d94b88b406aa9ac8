//! Configuration loading from disk and JSON values.

use std::fs;
use std::path::Path;

use crate::config::schema::{AppConfig, SwOptions};
use crate::config::validation::{validate_config, validate_options, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid options: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: AppConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Deserialize and validate plugin options from a JSON value.
pub fn options_from_value(value: serde_json::Value) -> Result<SwOptions, ConfigError> {
    let options: SwOptions = serde_json::from_value(value)?;
    validate_options(&options).map_err(ConfigError::Validation)?;
    Ok(options)
}
