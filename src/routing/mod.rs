//! Route annotation subsystem.
//!
//! # Data Flow
//! ```text
//! Route registration (path, method, annotation)
//!     → annotation.rs (validate per-route directives)
//!     → merge.rs (fold directives into SwOptions)
//!     → new configuration snapshot, artifact marked stale
//!
//! Pattern handling:
//!     matcher.rs (exact / prefix / regex, JS rendering)
//! ```
//!
//! # Design Decisions
//! - Merging is a pure function: options in, options out
//! - Unknown annotation keys are rejected, never dropped
//! - Route paths become anchored patterns; parameters become wildcards

pub mod annotation;
pub mod matcher;
pub mod merge;

pub use annotation::{CacheBust, RouteInfo, RouteOptions, RouteRuntimeCaching};
pub use matcher::{Matcher, PatternError, UrlPattern};
pub use merge::merge_route;

/// Error raised while registering an annotated route.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    /// The annotation does not match the per-route schema.
    #[error("invalid service worker annotation on `{path}`: {source}")]
    Annotation {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// The route path could not be turned into a URL pattern.
    #[error("cannot derive url pattern from `{path}`: {source}")]
    Pattern {
        path: String,
        #[source]
        source: PatternError,
    },
}
