//! URL pattern matching.
//!
//! # Responsibilities
//! - Match URLs against exact, prefix or regex patterns
//! - Render each pattern as a JS `RegExp` for the generated worker
//! - Derive a pattern from a route path (`/users/{id}`, `/files/{p*}`)
//!
//! # Design Decisions
//! - One enum covers every shape; callers never inspect raw config values
//! - Exact and prefix patterns are escaped before rendering
//! - No closure-based variant: patterns must be serializable into the script
//!
//! # Textual forms
//! ```text
//! "/^api\\//i"            → regex literal (source + flags)
//! "/api/sim"              → prefix (the body is a plain path)
//! "https://unpkg.com/"    → prefix
//! { exact = "/offline" }  → exact
//! { prefix = "/api/" }    → prefix (use this when a prefix looks like a literal)
//! { regex = "^/a", flags = "i" }
//! ```

use fancy_regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Trait for matching URLs against a condition.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the URL matches this condition.
    fn matches(&self, url: &str) -> bool;
}

/// Error raised when a pattern cannot be compiled.
#[derive(Debug, thiserror::Error)]
pub enum PatternError {
    #[error("invalid regex `{source_text}`: {error}")]
    Regex {
        source_text: String,
        #[source]
        error: Box<fancy_regex::Error>,
    },

    #[error("unsupported regex flag `{0}`")]
    Flag(char),

    #[error("regex flag `{0}` given twice")]
    RepeatedFlag(char),

    #[error("invalid glob `{pattern}`: {error}")]
    Glob {
        pattern: String,
        #[source]
        error: glob::PatternError,
    },

    #[error("unterminated parameter in route path `{0}`")]
    RoutePath(String),
}

/// A compiled regular expression together with its textual form.
#[derive(Debug, Clone)]
pub struct RegexPattern {
    source: String,
    flags: String,
    regex: Regex,
}

impl RegexPattern {
    /// Compile a pattern. Flags follow JS: `i`, `m`, `s` change matching,
    /// `g` and `u` are accepted and only carried into the script.
    /// Look-around and backreferences are supported.
    pub fn new(source: impl Into<String>, flags: impl Into<String>) -> Result<Self, PatternError> {
        let source = source.into();
        let flags = flags.into();

        let mut inline = String::new();
        for (i, flag) in flags.char_indices() {
            if flags[..i].contains(flag) {
                return Err(PatternError::RepeatedFlag(flag));
            }
            match flag {
                'i' | 'm' | 's' => inline.push(flag),
                'g' | 'u' => {}
                other => return Err(PatternError::Flag(other)),
            }
        }

        let compiled = if inline.is_empty() {
            source.clone()
        } else {
            format!("(?{inline}){source}")
        };
        let regex = Regex::new(&compiled).map_err(|error| PatternError::Regex {
            source_text: source.clone(),
            error: Box::new(error),
        })?;

        Ok(Self { source, flags, regex })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn flags(&self) -> &str {
        &self.flags
    }
}

/// A URL pattern used by caching directives.
#[derive(Debug, Clone)]
pub enum UrlPattern {
    /// Matches the whole URL exactly.
    Exact(String),
    /// Matches URLs starting with the given string.
    Prefix(String),
    /// Matches URLs the regex finds a match in (unanchored, like JS `test`).
    Regex(RegexPattern),
}

impl UrlPattern {
    pub fn exact(value: impl Into<String>) -> Self {
        Self::Exact(value.into())
    }

    pub fn prefix(value: impl Into<String>) -> Self {
        Self::Prefix(value.into())
    }

    pub fn regex(source: impl Into<String>, flags: impl Into<String>) -> Result<Self, PatternError> {
        RegexPattern::new(source, flags).map(Self::Regex)
    }

    /// Parse the bare string form: `/source/flags` is a regex literal,
    /// anything else is a prefix.
    pub fn parse(text: &str) -> Result<Self, PatternError> {
        if let Some((source, flags)) = split_regex_literal(text) {
            return Self::regex(source, flags);
        }
        Ok(Self::Prefix(text.to_string()))
    }

    /// Build a pattern matching a route path exactly. Path parameters
    /// (`{id}`, `{id?}`, `{rest*}`, `{*rest}`, `:id`) become wildcards.
    pub fn from_route_path(path: &str) -> Result<Self, PatternError> {
        if !path.contains('{') && !path.split('/').any(|s| s.starts_with(':')) {
            return Ok(Self::Exact(path.to_string()));
        }

        let mut source = String::from("^");
        let mut literal = String::new();
        let mut chars = path.chars().peekable();
        let mut at_segment_start = true;

        while let Some(c) = chars.next() {
            match c {
                '{' => {
                    source.push_str(&regex::escape(&literal));
                    literal.clear();

                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some(n) => name.push(n),
                            None => return Err(PatternError::RoutePath(path.to_string())),
                        }
                    }
                    source.push_str(param_wildcard(&name));
                    at_segment_start = false;
                }
                ':' if at_segment_start => {
                    source.push_str(&regex::escape(&literal));
                    literal.clear();
                    while chars.peek().is_some_and(|n| *n != '/') {
                        chars.next();
                    }
                    source.push_str("[^/]+");
                    at_segment_start = false;
                }
                _ => {
                    literal.push(c);
                    at_segment_start = c == '/';
                }
            }
        }
        source.push_str(&regex::escape(&literal));
        source.push('$');

        Self::regex(source, "")
    }

    /// Render as a JS expression evaluating to a `RegExp`.
    pub fn to_js(&self) -> String {
        let (source, flags) = match self {
            Self::Exact(value) => (format!("^{}$", regex::escape(value)), ""),
            Self::Prefix(value) => (format!("^{}", regex::escape(value)), ""),
            Self::Regex(pattern) => (pattern.source.clone(), pattern.flags.as_str()),
        };
        if flags.is_empty() {
            format!("new RegExp({})", js_string(&source))
        } else {
            format!("new RegExp({}, {})", js_string(&source), js_string(flags))
        }
    }
}

impl Matcher for UrlPattern {
    fn matches(&self, url: &str) -> bool {
        match self {
            Self::Exact(value) => url == value,
            Self::Prefix(value) => url.starts_with(value.as_str()),
            // Exceeding the backtrack limit counts as no match.
            Self::Regex(pattern) => pattern.regex.is_match(url).unwrap_or(false),
        }
    }
}

/// Render a list of patterns as a JS array literal.
pub fn js_array(patterns: &[UrlPattern]) -> String {
    let items: Vec<String> = patterns.iter().map(UrlPattern::to_js).collect();
    format!("[{}]", items.join(", "))
}

fn param_wildcard(name: &str) -> &'static str {
    if name.contains('*') {
        ".*"
    } else if name.ends_with('?') {
        "[^/]*"
    } else {
        "[^/]+"
    }
}

/// Split `/source/flags`. A body made only of path characters (`/api/sim`)
/// is a path, not a literal; so is one with repeated or unknown flags.
fn split_regex_literal(text: &str) -> Option<(&str, &str)> {
    let body = text.strip_prefix('/')?;
    let end = body.rfind('/')?;
    let (source, flags) = (&body[..end], &body[end + 1..]);

    if source.is_empty() || !flags.chars().all(|f| "gimsu".contains(f)) {
        return None;
    }
    if flags.char_indices().any(|(i, f)| flags[..i].contains(f)) {
        return None;
    }
    if !source.contains(REGEX_SYNTAX) {
        return None;
    }
    Some((source, flags))
}

/// Characters that never appear in a plain path but mark regex syntax.
const REGEX_SYNTAX: [char; 13] = ['^', '$', '\\', '*', '+', '?', '(', ')', '[', ']', '{', '}', '|'];

fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ExactRepr {
    exact: String,
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct PrefixRepr {
    prefix: String,
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RegexRepr {
    regex: String,
    #[serde(default)]
    flags: String,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum PatternRepr {
    Literal(String),
    Exact(ExactRepr),
    Prefix(PrefixRepr),
    Regex(RegexRepr),
}

impl<'de> Deserialize<'de> for UrlPattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = PatternRepr::deserialize(deserializer)?;
        match repr {
            PatternRepr::Literal(text) => UrlPattern::parse(&text),
            PatternRepr::Exact(r) => Ok(UrlPattern::Exact(r.exact)),
            PatternRepr::Prefix(r) => Ok(UrlPattern::Prefix(r.prefix)),
            PatternRepr::Regex(r) => UrlPattern::regex(r.regex, r.flags),
        }
        .map_err(serde::de::Error::custom)
    }
}

impl Serialize for UrlPattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let repr = match self {
            Self::Exact(exact) => PatternRepr::Exact(ExactRepr { exact: exact.clone() }),
            Self::Prefix(prefix) => PatternRepr::Prefix(PrefixRepr { prefix: prefix.clone() }),
            Self::Regex(pattern) => PatternRepr::Regex(RegexRepr {
                regex: pattern.source.clone(),
                flags: pattern.flags.clone(),
            }),
        };
        repr.serialize(serializer)
    }
}

/// Deserialize either a single pattern or a list of patterns.
pub fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<UrlPattern>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        Many(Vec<UrlPattern>),
        One(UrlPattern),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::Many(list) => list,
        OneOrMany::One(single) => vec![single],
    })
}
