//! Folding route annotations into the global options.
//!
//! # Responsibilities
//! - Reshape each route directive into the form the generator expects
//! - Merge the result into a new `SwOptions`
//!
//! # Design Decisions
//! - Options are taken by value and returned; no shared mutable config
//! - Maps are merged by key (later routes win), lists are appended
//! - A route without annotation leaves the options untouched

use crate::config::schema::{Dependencies, RuntimeCachingRule, SwOptions};
use crate::routing::annotation::{CacheBust, RouteInfo};
use crate::routing::matcher::UrlPattern;
use crate::routing::RouteError;

/// Merge a route's annotation into the options.
///
/// | directive | result |
/// |---|---|
/// | `dynamicUrlToDependencies: [f]` | `dynamicUrlToDependencies[path] = [f]` |
/// | `dontCacheBustUrlsMatching: true` | pattern matching `path` exactly appended |
/// | `dontCacheBustUrlsMatching: <p>` | `<p>` appended |
/// | `navigateFallback: true` | `navigateFallback = path` |
/// | `runtimeCaching: {..}` | rule for `path` appended |
pub fn merge_route(mut config: SwOptions, route: &RouteInfo) -> Result<SwOptions, RouteError> {
    let Some(annotation) = &route.annotation else {
        return Ok(config);
    };

    if let Some(files) = &annotation.dynamic_url_to_dependencies {
        config
            .dynamic_url_to_dependencies
            .insert(route.path.clone(), Dependencies::Files(files.clone()));
    }

    match &annotation.dont_cache_bust_urls_matching {
        Some(CacheBust::Flag(true)) => {
            let pattern = route_pattern(route)?;
            config.dont_cache_bust_urls_matching.push(pattern);
        }
        Some(CacheBust::Pattern(pattern)) => {
            config.dont_cache_bust_urls_matching.push(pattern.clone());
        }
        Some(CacheBust::Flag(false)) | None => {}
    }

    if annotation.navigate_fallback == Some(true) {
        if let Some(previous) = &config.navigate_fallback {
            if previous != &route.path {
                tracing::warn!(
                    previous = %previous,
                    path = %route.path,
                    "Navigate fallback replaced by route annotation"
                );
            }
        }
        config.navigate_fallback = Some(route.path.clone());
    }

    if let Some(rule) = &annotation.runtime_caching {
        config.runtime_caching.push(RuntimeCachingRule {
            url_pattern: route_pattern(route)?,
            handler: rule.handler,
            method: rule.method.or_else(|| route.rule_method()),
            options: rule.options.clone(),
        });
    }

    Ok(config)
}

fn route_pattern(route: &RouteInfo) -> Result<UrlPattern, RouteError> {
    UrlPattern::from_route_path(&route.path).map_err(|source| RouteError::Pattern {
        path: route.path.clone(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{Handler, RuleMethod};
    use crate::routing::annotation::{RouteOptions, RouteRuntimeCaching};
    use crate::routing::matcher::Matcher;
    use axum::http::Method;
    use std::path::PathBuf;

    #[test]
    fn test_unannotated_route_is_noop() {
        let mut config = SwOptions::default();
        config.cache_id = Some("app".into());
        let merged = merge_route(config, &RouteInfo::get("/x")).unwrap();
        assert_eq!(merged.cache_id.as_deref(), Some("app"));
        assert!(merged.dynamic_url_to_dependencies.is_empty());
    }

    #[test]
    fn test_dependencies_keyed_by_route_path() {
        let route = RouteInfo::get("/x").annotate(RouteOptions::default().dependencies(["depA"]));
        let merged = merge_route(SwOptions::default(), &route).unwrap();
        assert_eq!(
            merged.dynamic_url_to_dependencies.get("/x"),
            Some(&Dependencies::Files(vec![PathBuf::from("depA")]))
        );
    }

    #[test]
    fn test_dependencies_merge_with_existing_keys() {
        let mut config = SwOptions::default();
        config
            .dynamic_url_to_dependencies
            .insert("/other".into(), Dependencies::Content("v1".into()));

        let route = RouteInfo::get("/x").annotate(RouteOptions::default().dependencies(["a", "b"]));
        let merged = merge_route(config, &route).unwrap();
        assert_eq!(merged.dynamic_url_to_dependencies.len(), 2);
        assert!(merged.dynamic_url_to_dependencies.contains_key("/other"));
    }

    #[test]
    fn test_cache_bust_flag_matches_path_exactly() {
        let route = RouteInfo::get("/y")
            .annotate(RouteOptions::default().dont_cache_bust(CacheBust::Flag(true)));
        let merged = merge_route(SwOptions::default(), &route).unwrap();

        let pattern = &merged.dont_cache_bust_urls_matching[0];
        assert!(pattern.matches("/y"));
        assert!(!pattern.matches("/y/z"));
        assert!(!pattern.matches("/xy"));
    }

    #[test]
    fn test_cache_bust_false_is_noop() {
        let route = RouteInfo::get("/y")
            .annotate(RouteOptions::default().dont_cache_bust(CacheBust::Flag(false)));
        let merged = merge_route(SwOptions::default(), &route).unwrap();
        assert!(merged.dont_cache_bust_urls_matching.is_empty());
    }

    #[test]
    fn test_cache_bust_patterns_accumulate() {
        let mut config = SwOptions::default();
        config
            .dont_cache_bust_urls_matching
            .push(UrlPattern::parse("/\\.[0-9a-f]{8}\\./").unwrap());

        let route = RouteInfo::get("/assets/{file*}")
            .annotate(RouteOptions::default().dont_cache_bust(CacheBust::Flag(true)));
        let merged = merge_route(config, &route).unwrap();

        assert_eq!(merged.dont_cache_bust_urls_matching.len(), 2);
        assert!(merged.dont_cache_bust_urls_matching[1].matches("/assets/img/logo.png"));
    }

    #[test]
    fn test_navigate_fallback() {
        let route = RouteInfo::get("/app").annotate(RouteOptions::default().navigate_fallback(true));
        let merged = merge_route(SwOptions::default(), &route).unwrap();
        assert_eq!(merged.navigate_fallback.as_deref(), Some("/app"));

        let route = RouteInfo::get("/b").annotate(RouteOptions::default().navigate_fallback(false));
        let merged = merge_route(merged, &route).unwrap();
        assert_eq!(merged.navigate_fallback.as_deref(), Some("/app"));
    }

    #[test]
    fn test_runtime_caching_from_route() {
        let route = RouteInfo::new(Method::POST, "/api/items/{id}").annotate(
            RouteOptions::default().runtime_caching(RouteRuntimeCaching::new(Handler::NetworkOnly)),
        );
        let merged = merge_route(SwOptions::default(), &route).unwrap();

        let rule = &merged.runtime_caching[0];
        assert_eq!(rule.handler, Handler::NetworkOnly);
        assert_eq!(rule.method, Some(RuleMethod::Post));
        assert!(rule.url_pattern.matches("/api/items/9"));
        assert!(!rule.url_pattern.matches("/api/items"));
    }

    #[test]
    fn test_runtime_caching_explicit_method_wins() {
        let mut rule = RouteRuntimeCaching::new(Handler::CacheFirst);
        rule.method = Some(RuleMethod::Head);
        let route = RouteInfo::get("/feed").annotate(RouteOptions::default().runtime_caching(rule));
        let merged = merge_route(SwOptions::default(), &route).unwrap();
        assert_eq!(merged.runtime_caching[0].method, Some(RuleMethod::Head));
    }

    #[test]
    fn test_bad_route_path() {
        let route = RouteInfo::get("/broken/{id")
            .annotate(RouteOptions::default().dont_cache_bust(CacheBust::Flag(true)));
        assert!(matches!(
            merge_route(SwOptions::default(), &route),
            Err(RouteError::Pattern { .. })
        ));
    }
}
