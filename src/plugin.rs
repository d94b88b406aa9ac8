//! The service worker plugin.
//!
//! # Data Flow
//! ```text
//! register(options)          → validate → ArtifactGate (version 1, stale)
//! SwRouter::route(info, mr)  → on_route → merge_route → new version
//!                            → axum Router::route(path, mr)
//! GET /service-worker.js     → ArtifactGate::current
//! ```

use std::sync::Arc;

use axum::routing::{get, MethodRouter};
use axum::Router;

use crate::config::loader::{options_from_value, ConfigError};
use crate::config::schema::SwOptions;
use crate::config::validation::validate_options;
use crate::generator::{Generator, PrecacheGenerator};
use crate::http::handlers;
use crate::observability::metrics;
use crate::routing::{merge_route, RouteError, RouteInfo};
use crate::worker::ArtifactGate;

/// Path the generated worker is served from.
pub const WORKER_PATH: &str = "/service-worker.js";

/// Path the registration script is served from.
pub const REGISTRATION_PATH: &str = "/service-worker-registration.js";

/// Plugin state shared by the route hook and the HTTP handlers.
#[derive(Clone)]
pub struct ServiceWorkerPlugin {
    gate: Arc<ArtifactGate>,
}

impl ServiceWorkerPlugin {
    /// Register with the built-in generator.
    pub fn register(options: SwOptions) -> Result<Self, ConfigError> {
        Self::with_generator(options, Arc::new(PrecacheGenerator::new()))
    }

    /// Register from untyped options (e.g. a JSON document).
    pub fn register_value(options: serde_json::Value) -> Result<Self, ConfigError> {
        let options = options_from_value(options)?;
        Ok(Self::from_validated(options, Arc::new(PrecacheGenerator::new())))
    }

    /// Register with a custom generator.
    pub fn with_generator(
        options: SwOptions,
        generator: Arc<dyn Generator>,
    ) -> Result<Self, ConfigError> {
        validate_options(&options).map_err(ConfigError::Validation)?;
        Ok(Self::from_validated(options, generator))
    }

    fn from_validated(options: SwOptions, generator: Arc<dyn Generator>) -> Self {
        tracing::info!(
            static_globs = options.static_file_globs.len(),
            runtime_rules = options.runtime_caching.len(),
            "Service worker plugin registered"
        );
        Self {
            gate: Arc::new(ArtifactGate::new(options, generator)),
        }
    }

    /// Route registration hook. Merges the route's annotation, if any, and
    /// marks the worker stale.
    pub fn on_route(&self, route: &RouteInfo) -> Result<(), RouteError> {
        if route.annotation.is_none() {
            return Ok(());
        }

        let version = self.gate.update(|options| merge_route(options, route))?;
        metrics::record_route_merge();
        tracing::debug!(
            method = %route.method,
            path = %route.path,
            version,
            "Route annotation merged"
        );
        Ok(())
    }

    pub fn gate(&self) -> &Arc<ArtifactGate> {
        &self.gate
    }

    /// Router with the worker and registration script endpoints.
    pub fn routes<S>(&self) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        Router::new()
            .route(WORKER_PATH, get(handlers::service_worker))
            .route(REGISTRATION_PATH, get(handlers::registration_script))
            .with_state(self.clone())
    }
}

/// An axum router whose route registrations pass through the plugin.
pub struct SwRouter<S = ()> {
    plugin: ServiceWorkerPlugin,
    router: Router<S>,
}

impl<S> SwRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    pub fn new(plugin: ServiceWorkerPlugin) -> Self {
        Self {
            plugin,
            router: Router::new(),
        }
    }

    /// Register a route. The annotation is merged before the route is added;
    /// an invalid annotation aborts the registration.
    pub fn route(mut self, route: RouteInfo, method_router: MethodRouter<S>) -> Result<Self, RouteError> {
        self.plugin.on_route(&route)?;
        self.router = self.router.route(&route.path, method_router);
        Ok(self)
    }

    pub fn plugin(&self) -> &ServiceWorkerPlugin {
        &self.plugin
    }

    /// The finished router, including the plugin endpoints.
    pub fn into_router(self) -> Router<S> {
        self.router.merge(self.plugin.routes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::matcher::Matcher;
    use crate::routing::{CacheBust, RouteOptions};
    use serde_json::json;

    #[test]
    fn test_register_defaults() {
        let plugin = ServiceWorkerPlugin::register(SwOptions::default()).unwrap();
        assert!(plugin.gate().is_stale());
    }

    #[test]
    fn test_register_value_rejects_unknown_key() {
        let result = ServiceWorkerPlugin::register_value(json!({ "notAnOption": 1 }));
        assert!(matches!(result, Err(ConfigError::Json(_))));
    }

    #[test]
    fn test_on_route_merges_and_bumps_version() {
        let plugin = ServiceWorkerPlugin::register(SwOptions::default()).unwrap();
        let before = plugin.gate().snapshot().version;

        plugin.on_route(&RouteInfo::get("/plain")).unwrap();
        assert_eq!(plugin.gate().snapshot().version, before);

        let route = RouteInfo::get("/y")
            .annotate(RouteOptions::default().dont_cache_bust(CacheBust::Flag(true)));
        plugin.on_route(&route).unwrap();

        let snapshot = plugin.gate().snapshot();
        assert!(snapshot.version > before);
        assert!(snapshot.options.dont_cache_bust_urls_matching[0].matches("/y"));
    }

    #[test]
    fn test_invalid_annotation_aborts_route() {
        let err = RouteInfo::get("/x")
            .annotate_value(json!({ "cacheId": "nope" }))
            .unwrap_err();
        assert!(matches!(err, RouteError::Annotation { .. }));
    }

    #[test]
    fn test_sw_router_registers_through_plugin() {
        let plugin = ServiceWorkerPlugin::register(SwOptions::default()).unwrap();
        let router: SwRouter = SwRouter::new(plugin.clone())
            .route(
                RouteInfo::get("/").annotate(RouteOptions::default().dependencies(["index.html"])),
                get(|| async { "home" }),
            )
            .unwrap();

        assert!(router
            .plugin()
            .gate()
            .options()
            .dynamic_url_to_dependencies
            .contains_key("/"));
        let _app: Router = router.into_router();
    }
}
