//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) / JSON value / typed SwOptions
//!     → loader.rs (parse & deserialize, unknown keys rejected)
//!     → validation.rs (semantic checks)
//!     → SwOptions (validated) handed to the plugin
//!
//! On static file change:
//!     watcher.rs detects change
//!     → artifact gate invalidated
//!     → next worker request regenerates
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Route annotations never mutate a snapshot; they publish a new one

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, options_from_value, ConfigError};
pub use schema::{AppConfig, ObservabilityConfig, ServerConfig, SwOptions};
