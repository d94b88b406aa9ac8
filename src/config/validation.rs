//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges and addresses
//! - Check globs compile and referenced files exist
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is a pure function over the parsed config
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::{AppConfig, SwOptions};
use crate::generator::glob::Glob;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate the full application configuration.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "server.bind_address",
            format!("`{}` is not a socket address", config.server.bind_address),
        ));
    }
    if config.server.request_timeout_secs == 0 {
        errors.push(ValidationError::new("server.request_timeout_secs", "must be > 0"));
    }
    if config.server.watch && config.server.static_root.is_none() {
        errors.push(ValidationError::new("server.watch", "requires server.static_root"));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("`{}` is not a socket address", config.observability.metrics_address),
        ));
    }

    if let Err(sw_errors) = validate_options(&config.service_worker) {
        errors.extend(sw_errors.into_iter().map(|mut e| {
            e.field = format!("service_worker.{}", e.field);
            e
        }));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate service worker options.
pub fn validate_options(options: &SwOptions) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if options.maximum_file_size_to_cache_in_bytes == Some(0) {
        errors.push(ValidationError::new("maximumFileSizeToCacheInBytes", "must be > 0"));
    }

    for (i, pattern) in options.static_file_globs.iter().enumerate() {
        if pattern.trim().is_empty() {
            errors.push(ValidationError::new(format!("staticFileGlobs[{i}]"), "is empty"));
        } else if let Err(e) = Glob::new(pattern) {
            errors.push(ValidationError::new(format!("staticFileGlobs[{i}]"), e.to_string()));
        }
    }

    for (i, script) in options.import_scripts.iter().enumerate() {
        if script.trim().is_empty() {
            errors.push(ValidationError::new(format!("importScripts[{i}]"), "is empty"));
        }
    }

    for url in options.dynamic_url_to_dependencies.keys() {
        if url.is_empty() {
            errors.push(ValidationError::new("dynamicUrlToDependencies", "empty URL key"));
        }
    }

    if options.strip_prefix_multi.keys().any(String::is_empty) {
        errors.push(ValidationError::new("stripPrefixMulti", "empty prefix key"));
    }

    if matches!(options.navigate_fallback.as_deref(), Some("")) {
        errors.push(ValidationError::new("navigateFallback", "is empty"));
    }

    if let Some(path) = &options.template_file_path {
        if !path.is_file() {
            errors.push(ValidationError::new(
                "templateFilePath",
                format!("{} is not a file", path.display()),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
