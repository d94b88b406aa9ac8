//! Service worker generation for axum routers.
//!
//! Routes registered through [`SwRouter`] may carry a [`RouteOptions`]
//! annotation. The plugin folds those annotations into its [`SwOptions`] and
//! serves a lazily regenerated worker at `/service-worker.js`.
//!
//! ```no_run
//! use axum::routing::get;
//! use sw_router::{RouteInfo, RouteOptions, ServiceWorkerPlugin, SwOptions, SwRouter};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let plugin = ServiceWorkerPlugin::register(SwOptions::default())?;
//! let app: axum::Router = SwRouter::new(plugin)
//!     .route(
//!         RouteInfo::get("/").annotate(RouteOptions::default().dependencies(["views/index.html"])),
//!         get(|| async { "home" }),
//!     )?
//!     .into_router();
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod generator;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod plugin;
pub mod routing;
pub mod worker;

pub use config::schema::SwOptions;
pub use generator::{GenerateError, Generator, PrecacheGenerator};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use plugin::{ServiceWorkerPlugin, SwRouter, REGISTRATION_PATH, WORKER_PATH};
pub use routing::{RouteError, RouteInfo, RouteOptions, UrlPattern};
pub use worker::{Artifact, ArtifactGate};
