//! Per-route service worker annotations.

use std::path::PathBuf;

use axum::http::Method;
use serde::{Deserialize, Serialize};

use crate::config::schema::{Handler, RuleMethod};
use crate::routing::matcher::UrlPattern;
use crate::routing::RouteError;

/// Directives a route may attach for the service worker.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct RouteOptions {
    /// Files whose contents version this route's URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dynamic_url_to_dependencies: Option<Vec<PathBuf>>,

    /// `true` exempts this route from cache-busting; a pattern is added as is.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dont_cache_bust_urls_matching: Option<CacheBust>,

    /// Use this route as the navigation fallback.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub navigate_fallback: Option<bool>,

    /// Runtime caching strategy for this route.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime_caching: Option<RouteRuntimeCaching>,
}

impl RouteOptions {
    /// Validate a raw annotation value against the per-route schema.
    pub fn from_value(path: &str, value: serde_json::Value) -> Result<Self, RouteError> {
        serde_json::from_value(value).map_err(|source| RouteError::Annotation {
            path: path.to_string(),
            source,
        })
    }

    pub fn dependencies<I, P>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.dynamic_url_to_dependencies = Some(files.into_iter().map(Into::into).collect());
        self
    }

    pub fn dont_cache_bust(mut self, value: CacheBust) -> Self {
        self.dont_cache_bust_urls_matching = Some(value);
        self
    }

    pub fn navigate_fallback(mut self, enabled: bool) -> Self {
        self.navigate_fallback = Some(enabled);
        self
    }

    pub fn runtime_caching(mut self, rule: RouteRuntimeCaching) -> Self {
        self.runtime_caching = Some(rule);
        self
    }
}

/// Cache-bust exemption for a route.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CacheBust {
    /// `true` derives a pattern from the route path.
    Flag(bool),
    Pattern(UrlPattern),
}

/// Runtime caching rule attached to a route; the URL pattern comes from
/// the route path.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RouteRuntimeCaching {
    pub handler: Handler,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<RuleMethod>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<serde_json::Map<String, serde_json::Value>>,
}

impl RouteRuntimeCaching {
    pub fn new(handler: Handler) -> Self {
        Self {
            handler,
            method: None,
            options: None,
        }
    }
}

/// A route as seen by the plugin when it is registered.
#[derive(Debug, Clone)]
pub struct RouteInfo {
    pub method: Method,
    pub path: String,
    pub annotation: Option<RouteOptions>,
}

impl RouteInfo {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            annotation: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn annotate(mut self, options: RouteOptions) -> Self {
        self.annotation = Some(options);
        self
    }

    /// Attach a raw annotation, validating it first.
    pub fn annotate_value(self, value: serde_json::Value) -> Result<Self, RouteError> {
        let options = RouteOptions::from_value(&self.path, value)?;
        Ok(self.annotate(options))
    }

    /// The route's method as a runtime rule method, if it is one.
    pub fn rule_method(&self) -> Option<RuleMethod> {
        RuleMethod::parse(self.method.as_str())
    }
}
