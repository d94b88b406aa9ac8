//! File globs for `staticFileGlobs`.
//!
//! Brace alternatives (`{css,js}`) are expanded first; each alternative is
//! compiled with the `glob` crate and walked from its literal base
//! directory. A backslash escapes the next character.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use walkdir::WalkDir;

use crate::routing::matcher::PatternError;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

#[derive(Debug, Clone)]
pub struct Glob {
    alternatives: Vec<(PathBuf, Pattern)>,
}

impl Glob {
    pub fn new(pattern: &str) -> Result<Self, PatternError> {
        let pattern = pattern.strip_prefix("./").unwrap_or(pattern);

        let alternatives = expand_braces(pattern)
            .into_iter()
            .map(|alternative| {
                let compiled = Pattern::new(&escape_metachars(&alternative)).map_err(|error| {
                    PatternError::Glob {
                        pattern: pattern.to_string(),
                        error,
                    }
                })?;
                Ok((literal_base(&alternative), compiled))
            })
            .collect::<Result<Vec<_>, PatternError>>()?;

        Ok(Self { alternatives })
    }

    /// Directories expansion starts from, one per brace alternative.
    pub fn bases(&self) -> BTreeSet<&Path> {
        self.alternatives.iter().map(|(base, _)| base.as_path()).collect()
    }

    pub fn is_match(&self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        let path = path.strip_prefix("./").unwrap_or(path);
        self.alternatives
            .iter()
            .any(|(_, pattern)| pattern.matches_path_with(path, MATCH_OPTIONS))
    }

    /// All files under the base directories matching the glob, sorted.
    pub fn expand(&self) -> Result<Vec<PathBuf>, walkdir::Error> {
        let mut files = BTreeSet::new();

        for base in self.bases() {
            let root = if base.as_os_str().is_empty() {
                Path::new(".")
            } else {
                base
            };
            if !root.exists() {
                continue;
            }

            for entry in WalkDir::new(root).follow_links(true) {
                let entry = entry?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let path = entry.path();
                let candidate = path.strip_prefix("./").unwrap_or(path);
                if self.is_match(candidate) {
                    files.insert(candidate.to_path_buf());
                }
            }
        }

        Ok(files.into_iter().collect())
    }
}

/// Expand the first top-level `{a,b}` group, recursively. Groups without a
/// comma and escaped braces stay literal.
fn expand_braces(pattern: &str) -> Vec<String> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut depth = 0usize;
    let mut open = 0;
    let mut commas = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '\\' => {
                i += 2;
                continue;
            }
            '{' => {
                if depth == 0 {
                    open = i;
                    commas.clear();
                }
                depth += 1;
            }
            ',' if depth == 1 => commas.push(i),
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 && !commas.is_empty() {
                    let prefix: String = chars[..open].iter().collect();
                    let suffix: String = chars[i + 1..].iter().collect();

                    let mut bounds = vec![open];
                    bounds.extend(&commas);
                    bounds.push(i);

                    return bounds
                        .windows(2)
                        .flat_map(|w| {
                            let alternative: String = chars[w[0] + 1..w[1]].iter().collect();
                            expand_braces(&format!("{prefix}{alternative}{suffix}"))
                        })
                        .collect();
                }
            }
            _ => {}
        }
        i += 1;
    }

    vec![pattern.to_string()]
}

/// Rewrite backslash escapes into the bracket form `glob` understands.
fn escape_metachars(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some(e @ ('*' | '?' | '[' | ']')) => {
                out.push('[');
                out.push(e);
                out.push(']');
            }
            Some(e) => out.push(e),
            None => out.push('\\'),
        }
    }
    out
}

fn literal_base(pattern: &str) -> PathBuf {
    let segments: Vec<&str> = pattern.split('/').collect();
    let mut base = Vec::new();

    for segment in &segments[..segments.len() - 1] {
        match unescape_literal(segment) {
            Some(literal) => base.push(literal),
            None => break,
        }
    }

    if base.len() == 1 && base[0].is_empty() {
        return PathBuf::from("/");
    }
    PathBuf::from(base.join("/"))
}

/// The segment with escapes removed, or `None` if it holds a wildcard.
fn unescape_literal(segment: &str) -> Option<String> {
    let mut out = String::with_capacity(segment.len());
    let mut chars = segment.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => out.extend(chars.next()),
            '*' | '?' | '[' => return None,
            _ => out.push(c),
        }
    }
    Some(out)
}
