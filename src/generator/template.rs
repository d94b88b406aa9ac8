//! Worker script rendering.
//!
//! Templates contain `<%= name %>` placeholders. Every placeholder must be
//! known; values are already JS expressions.

use std::collections::BTreeMap;

use crate::config::schema::SwOptions;
use crate::generator::manifest::Manifest;
use crate::generator::GenerateError;
use crate::routing::matcher::js_array;

/// Template used when `templateFilePath` is not set.
pub const DEFAULT_TEMPLATE: &str = include_str!("../../assets/service-worker.js.tmpl");

const OPEN: &str = "<%=";
const CLOSE: &str = "%>";

/// Placeholder values derived from the options and manifest.
pub fn template_vars(options: &SwOptions, manifest: &Manifest) -> BTreeMap<&'static str, String> {
    let mut vars = BTreeMap::new();

    vars.insert("version", env!("CARGO_PKG_VERSION").to_string());
    vars.insert("precacheConfig", manifest.to_json().to_string());
    vars.insert("cacheId", js_string(options.cache_id.as_deref().unwrap_or("")));
    vars.insert("directoryIndex", js_string(options.directory_index()));
    vars.insert(
        "dontCacheBustUrlsMatching",
        js_array(&options.dont_cache_bust_urls_matching),
    );
    vars.insert(
        "ignoreUrlParametersMatching",
        js_array(&options.ignored_url_parameters()),
    );
    vars.insert(
        "navigateFallback",
        js_string(options.navigate_fallback.as_deref().unwrap_or("")),
    );
    vars.insert(
        "navigateFallbackWhitelist",
        js_array(&options.navigate_fallback_whitelist),
    );
    vars.insert("runtimeCaching", runtime_caching(options));
    vars.insert("importScripts", import_scripts(&options.import_scripts));
    vars.insert("clientsClaim", options.clients_claim.unwrap_or(false).to_string());
    vars.insert("skipWaiting", options.skip_waiting.unwrap_or(false).to_string());
    vars.insert("handleFetch", options.handle_fetch.unwrap_or(true).to_string());

    vars
}

/// Substitute placeholders in `template`.
pub fn render(template: &str, vars: &BTreeMap<&'static str, String>) -> Result<String, GenerateError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find(OPEN) {
        out.push_str(&rest[..start]);
        let after = &rest[start + OPEN.len()..];
        let end = after.find(CLOSE).ok_or_else(|| {
            GenerateError::Template(format!(
                "unterminated placeholder at byte {}",
                template.len() - rest.len() + start
            ))
        })?;

        let name = after[..end].trim();
        let value = vars
            .get(name)
            .ok_or_else(|| GenerateError::UnknownPlaceholder(name.to_string()))?;
        out.push_str(value);
        rest = &after[end + CLOSE.len()..];
    }
    out.push_str(rest);

    Ok(out)
}

fn runtime_caching(options: &SwOptions) -> String {
    let rules: Vec<String> = options
        .runtime_caching
        .iter()
        .map(|rule| {
            let method = rule
                .method
                .map(|m| js_string(m.as_str()))
                .unwrap_or_else(|| "null".to_string());
            let rule_options = rule
                .options
                .as_ref()
                .map(|o| serde_json::Value::Object(o.clone()).to_string())
                .unwrap_or_else(|| "{}".to_string());
            format!(
                "{{urlPattern: {}, handler: {}, method: {}, options: {}}}",
                rule.url_pattern.to_js(),
                js_string(rule.handler.as_str()),
                method,
                rule_options
            )
        })
        .collect();
    format!("[{}]", rules.join(", "))
}

fn import_scripts(scripts: &[String]) -> String {
    if scripts.is_empty() {
        return String::new();
    }
    let args: Vec<String> = scripts.iter().map(|s| js_string(s)).collect();
    format!("importScripts({});", args.join(", "))
}

fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{Handler, RuleMethod, RuntimeCachingRule};
    use crate::routing::matcher::UrlPattern;

    #[test]
    fn test_render_substitutes() {
        let mut vars = BTreeMap::new();
        vars.insert("cacheId", "\"app\"".to_string());
        let out = render("var id = <%= cacheId %>;<%=cacheId%>", &vars).unwrap();
        assert_eq!(out, "var id = \"app\";\"app\"");
    }

    #[test]
    fn test_unknown_placeholder() {
        let vars = BTreeMap::new();
        assert!(matches!(
            render("<%= nope %>", &vars),
            Err(GenerateError::UnknownPlaceholder(name)) if name == "nope"
        ));
    }

    #[test]
    fn test_unterminated_placeholder() {
        let vars = BTreeMap::new();
        assert!(matches!(render("a <%= b", &vars), Err(GenerateError::Template(_))));
    }

    #[test]
    fn test_default_template_renders() {
        let options = SwOptions::default();
        let vars = template_vars(&options, &Manifest::default());
        let script = render(DEFAULT_TEMPLATE, &vars).unwrap();
        assert!(!script.contains("<%="));
        assert!(script.contains("var precacheConfig = [];"));
        assert!(script.contains(r#"var ignoreUrlParametersMatching = [new RegExp("^utm_")];"#));
        assert!(script.contains("if (true) {\n  self.addEventListener('fetch'"));
    }

    #[test]
    fn test_same_origin_rules_match_pathname() {
        let script = render(
            DEFAULT_TEMPLATE,
            &template_vars(&SwOptions::default(), &Manifest::default()),
        )
        .unwrap();
        assert!(script.contains(
            "return url.origin === self.location.origin ? url.pathname : url.toString();"
        ));
        assert!(script.contains("candidate.urlPattern.test(runtimeCachingTarget(request.url))"));
        assert!(!script.contains("request.url.replace(self.location.origin"));
    }

    #[test]
    fn test_runtime_rules_and_imports() {
        let mut options = SwOptions::default();
        options.import_scripts = vec!["/push.js".into()];
        options.runtime_caching.push(RuntimeCachingRule {
            url_pattern: UrlPattern::prefix("https://unpkg.com/"),
            handler: Handler::CacheFirst,
            method: Some(RuleMethod::Get),
            options: serde_json::json!({ "debug": true }).as_object().cloned(),
        });

        let vars = template_vars(&options, &Manifest::default());
        assert_eq!(vars["importScripts"], r#"importScripts("/push.js");"#);
        assert_eq!(
            vars["runtimeCaching"],
            r#"[{urlPattern: new RegExp("^https://unpkg\\.com/"), handler: "cacheFirst", method: "get", options: {"debug":true}}]"#
        );
    }
}
