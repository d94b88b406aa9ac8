//! Service worker generation.
//!
//! # Data Flow
//! ```text
//! SwOptions snapshot
//!     → manifest.rs (globs → files → hashes → URLs)   [blocking pool]
//!     → template.rs (placeholder values, substitution)
//!     → worker script text
//! ```
//!
//! # Design Decisions
//! - Generation sits behind the `Generator` trait; the gate never knows
//!   how a script is produced
//! - File system work runs on `spawn_blocking`
//! - A custom template must only use known placeholders

pub mod glob;
pub mod manifest;
pub mod template;

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::config::schema::SwOptions;
use crate::routing::matcher::PatternError;

/// Error raised while generating a worker script.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid static file glob: {0}")]
    Glob(#[from] PatternError),

    #[error("failed to walk static files: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("malformed template: {0}")]
    Template(String),

    #[error("unknown template placeholder `{0}`")]
    UnknownPlaceholder(String),

    #[error("generation task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("{0}")]
    Other(String),
}

impl GenerateError {
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

/// Produces worker script text from options.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, options: &SwOptions) -> Result<String, GenerateError>;
}

/// Built-in generator: precache manifest plus the bundled template.
#[derive(Debug, Clone, Default)]
pub struct PrecacheGenerator;

impl PrecacheGenerator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Generator for PrecacheGenerator {
    async fn generate(&self, options: &SwOptions) -> Result<String, GenerateError> {
        let snapshot = options.clone();
        let manifest =
            tokio::task::spawn_blocking(move || manifest::build_manifest(&snapshot)).await??;

        let source = match &options.template_file_path {
            Some(path) => tokio::fs::read_to_string(path)
                .await
                .map_err(|e| GenerateError::io(path, e))?,
            None => template::DEFAULT_TEMPLATE.to_string(),
        };

        let vars = template::template_vars(options, &manifest);
        template::render(&source, &vars)
    }
}
