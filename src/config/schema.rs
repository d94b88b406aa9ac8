//! Configuration schema definitions.
//!
//! This module defines the application configuration and the service worker
//! options accepted by the plugin. All types derive Serde traits for
//! deserialization from config files or JSON values.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::routing::matcher::{one_or_many, UrlPattern};

/// Default cap on precached file size (2 MiB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 2 * 1024 * 1024;

/// Root configuration for the demo server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener and static file settings.
    pub server: ServerConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Service worker generation options.
    pub service_worker: SwOptions,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:9000").
    pub bind_address: String,

    /// Directory served for unmatched paths.
    pub static_root: Option<PathBuf>,

    /// Invalidate the generated worker when files under `static_root` change.
    pub watch: bool,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:9000".to_string(),
            static_root: None,
            watch: false,
            request_timeout_secs: 30,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Global service worker options.
///
/// Keys use the camelCase names of the generation contract. Unknown keys
/// are rejected at deserialization.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct SwOptions {
    /// Cache name component, distinguishes workers sharing an origin.
    pub cache_id: Option<String>,

    /// Take control of open clients on activation.
    pub clients_claim: Option<bool>,

    /// File appended to URLs ending in `/` (default `index.html`).
    pub directory_index: Option<String>,

    /// URLs that already carry a version and need no cache-busting.
    #[serde(deserialize_with = "one_or_many")]
    pub dont_cache_bust_urls_matching: Vec<UrlPattern>,

    /// URL → files (or literal content) whose hash versions that URL.
    pub dynamic_url_to_dependencies: BTreeMap<String, Dependencies>,

    /// Emit a fetch handler (default true).
    pub handle_fetch: Option<bool>,

    /// Query parameters ignored when looking up the cache
    /// (default `/^utm_/`).
    pub ignore_url_parameters_matching: Option<Vec<UrlPattern>>,

    /// Extra scripts loaded with `importScripts`.
    pub import_scripts: Vec<String>,

    /// Progress callback. Set programmatically only.
    #[serde(skip)]
    pub logger: Option<Logger>,

    /// Files above this size are not precached.
    pub maximum_file_size_to_cache_in_bytes: Option<u64>,

    /// URL served for navigations that miss the cache.
    pub navigate_fallback: Option<String>,

    /// Restricts which navigations use the fallback.
    pub navigate_fallback_whitelist: Vec<UrlPattern>,

    /// Prefix added to file URLs after `stripPrefix` is removed.
    pub replace_prefix: Option<String>,

    /// Runtime caching rules.
    pub runtime_caching: Vec<RuntimeCachingRule>,

    /// Activate the new worker without waiting.
    pub skip_waiting: Option<bool>,

    /// Globs of files to precache.
    pub static_file_globs: Vec<String>,

    /// Prefix removed from file paths to form URLs.
    pub strip_prefix: Option<String>,

    /// Prefix → replacement pairs, tried before `stripPrefix`.
    pub strip_prefix_multi: BTreeMap<String, String>,

    /// Custom template with `<%= name %>` placeholders.
    pub template_file_path: Option<PathBuf>,

    /// Log every precached resource.
    pub verbose: bool,

    /// Script served when generation fails.
    pub default_worker: Option<String>,
}

impl SwOptions {
    pub fn max_file_size(&self) -> u64 {
        self.maximum_file_size_to_cache_in_bytes
            .unwrap_or(DEFAULT_MAX_FILE_SIZE)
    }

    pub fn ignored_url_parameters(&self) -> Vec<UrlPattern> {
        match &self.ignore_url_parameters_matching {
            Some(patterns) => patterns.clone(),
            None => vec![UrlPattern::prefix("utm_")],
        }
    }

    pub fn directory_index(&self) -> &str {
        self.directory_index.as_deref().unwrap_or("index.html")
    }

    /// Send a progress message to the logger hook, or to tracing.
    pub fn log(&self, message: &str) {
        match &self.logger {
            Some(logger) => logger.call(message),
            None => tracing::info!(target: "sw_router::generator", "{}", message),
        }
    }
}

/// Dependencies of a dynamic URL.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Dependencies {
    /// Files whose combined contents version the URL.
    Files(Vec<PathBuf>),
    /// Literal content versioning the URL.
    Content(String),
}

/// Progress callback used during generation.
#[derive(Clone)]
pub struct Logger(Arc<dyn Fn(&str) + Send + Sync>);

impl Logger {
    pub fn new(f: impl Fn(&str) + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn call(&self, message: &str) {
        (self.0)(message)
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Logger(..)")
    }
}

/// Strategy used by a runtime caching rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Handler {
    NetworkFirst,
    CacheFirst,
    Fastest,
    CacheOnly,
    NetworkOnly,
}

impl Handler {
    pub fn as_str(&self) -> &'static str {
        match self {
            Handler::NetworkFirst => "networkFirst",
            Handler::CacheFirst => "cacheFirst",
            Handler::Fastest => "fastest",
            Handler::CacheOnly => "cacheOnly",
            Handler::NetworkOnly => "networkOnly",
        }
    }
}

/// HTTP methods a runtime rule may apply to.
///
/// Parsed case-insensitively, always rendered lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleMethod {
    Get,
    Post,
    Put,
    Delete,
    Head,
}

impl RuleMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleMethod::Get => "get",
            RuleMethod::Post => "post",
            RuleMethod::Put => "put",
            RuleMethod::Delete => "delete",
            RuleMethod::Head => "head",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "get" => Some(RuleMethod::Get),
            "post" => Some(RuleMethod::Post),
            "put" => Some(RuleMethod::Put),
            "delete" => Some(RuleMethod::Delete),
            "head" => Some(RuleMethod::Head),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for RuleMethod {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        RuleMethod::parse(&value).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "unknown method `{value}`, expected one of get, post, put, delete, head"
            ))
        })
    }
}

impl Serialize for RuleMethod {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A pattern-to-strategy mapping applied by the generated worker.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct RuntimeCachingRule {
    pub url_pattern: UrlPattern,

    pub handler: Handler,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<RuleMethod>,

    /// Free-form strategy options (cache name, expiration, debug, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<serde_json::Map<String, serde_json::Value>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::matcher::Matcher;

    #[test]
    fn test_defaults() {
        let options = SwOptions::default();
        assert_eq!(options.max_file_size(), DEFAULT_MAX_FILE_SIZE);
        assert_eq!(options.directory_index(), "index.html");
        assert!(options.ignored_url_parameters()[0].matches("utm_source"));
    }

    #[test]
    fn test_camel_case_keys() {
        let options: SwOptions = serde_json::from_value(serde_json::json!({
            "cacheId": "app",
            "staticFileGlobs": ["public/**/*.css"],
            "dontCacheBustUrlsMatching": "/\\.\\w{8}\\./",
            "runtimeCaching": [{
                "urlPattern": "/https:\\/\\/picsum.photos\\//",
                "handler": "fastest",
                "method": "GET",
                "options": { "debug": true }
            }]
        }))
        .unwrap();

        assert_eq!(options.cache_id.as_deref(), Some("app"));
        assert_eq!(options.dont_cache_bust_urls_matching.len(), 1);
        assert!(options.dont_cache_bust_urls_matching[0].matches("/app.1a2b3c4d.js"));
        let rule = &options.runtime_caching[0];
        assert_eq!(rule.handler, Handler::Fastest);
        assert_eq!(rule.method, Some(RuleMethod::Get));
        assert!(rule.url_pattern.matches("https://picsum.photos/200"));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let result: Result<SwOptions, _> =
            serde_json::from_value(serde_json::json!({ "cacheID": "typo" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_wrong_type_rejected() {
        let result: Result<SwOptions, _> =
            serde_json::from_value(serde_json::json!({ "verbose": "yes" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_handler_and_method() {
        let bad_handler: Result<RuntimeCachingRule, _> = serde_json::from_value(
            serde_json::json!({ "urlPattern": "/a", "handler": "cacheLast" }),
        );
        assert!(bad_handler.is_err());

        let bad_method: Result<RuntimeCachingRule, _> = serde_json::from_value(
            serde_json::json!({ "urlPattern": "/a", "handler": "cacheFirst", "method": "patch" }),
        );
        assert!(bad_method.is_err());
    }

    #[test]
    fn test_dependencies_forms() {
        let options: SwOptions = serde_json::from_value(serde_json::json!({
            "dynamicUrlToDependencies": {
                "/": ["views/index.html", "views/layout.html"],
                "/build": "v42"
            }
        }))
        .unwrap();

        assert_eq!(
            options.dynamic_url_to_dependencies["/"],
            Dependencies::Files(vec!["views/index.html".into(), "views/layout.html".into()])
        );
        assert_eq!(
            options.dynamic_url_to_dependencies["/build"],
            Dependencies::Content("v42".into())
        );
    }

    #[test]
    fn test_app_config_from_toml() {
        let config: AppConfig = toml::from_str(
            r#"
            [server]
            bind_address = "127.0.0.1:9000"

            [service_worker]
            verbose = true
            staticFileGlobs = ["*.css"]

            [[service_worker.runtimeCaching]]
            urlPattern = "https://unpkg.com/"
            handler = "cacheFirst"
            options = { debug = true }
            "#,
        )
        .unwrap();

        assert_eq!(config.server.bind_address, "127.0.0.1:9000");
        assert!(config.service_worker.verbose);
        assert_eq!(config.service_worker.runtime_caching[0].handler, Handler::CacheFirst);
        assert_eq!(config.observability.log_level, "info");
    }
}
