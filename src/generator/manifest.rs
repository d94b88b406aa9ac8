//! Precache manifest construction.
//!
//! # Responsibilities
//! - Expand `staticFileGlobs` and hash each file
//! - Skip files above `maximumFileSizeToCacheInBytes`
//! - Map file paths to URLs (`stripPrefixMulti`, `stripPrefix`, `replacePrefix`)
//! - Version `dynamicUrlToDependencies` entries by their dependencies
//!
//! Blocking: reads the file system. Call from `spawn_blocking`.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::config::schema::{Dependencies, SwOptions};
use crate::generator::glob::Glob;
use crate::generator::GenerateError;

/// One precached URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub url: String,
    pub hash: String,
    pub size: u64,
}

/// The set of URLs the worker precaches, sorted by URL.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    entries: BTreeMap<String, ManifestEntry>,
}

impl Manifest {
    pub fn entries(&self) -> impl Iterator<Item = &ManifestEntry> {
        self.entries.values()
    }

    pub fn get(&self, url: &str) -> Option<&ManifestEntry> {
        self.entries.get(url)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_size(&self) -> u64 {
        self.entries.values().map(|e| e.size).sum()
    }

    /// `[[url, hash], ...]` as a JSON array.
    pub fn to_json(&self) -> serde_json::Value {
        self.entries
            .values()
            .map(|e| serde_json::json!([e.url, e.hash]))
            .collect()
    }

    fn insert(&mut self, entry: ManifestEntry) {
        self.entries.insert(entry.url.clone(), entry);
    }
}

/// Build the manifest for the given options.
pub fn build_manifest(options: &SwOptions) -> Result<Manifest, GenerateError> {
    let mut manifest = Manifest::default();
    let max_size = options.max_file_size();

    for pattern in &options.static_file_globs {
        let glob = Glob::new(pattern)?;
        for path in glob.expand()? {
            let size = fs::metadata(&path).map_err(|e| GenerateError::io(&path, e))?.len();
            if size > max_size {
                options.log(&format!(
                    "Skipping static resource \"{}\" ({}) - max size is {}",
                    path.display(),
                    format_size(size),
                    format_size(max_size)
                ));
                continue;
            }

            let contents = fs::read(&path).map_err(|e| GenerateError::io(&path, e))?;
            let url = file_url(&path, options);
            if options.verbose {
                options.log(&format!(
                    "Caching static resource \"{}\" ({})",
                    path.display(),
                    format_size(size)
                ));
            }
            manifest.insert(ManifestEntry {
                url,
                hash: hash_bytes(&contents),
                size,
            });
        }
    }

    for (url, dependencies) in &options.dynamic_url_to_dependencies {
        let (hash, size) = match dependencies {
            Dependencies::Files(files) => {
                let mut hasher = Sha256::new();
                let mut size = 0;
                for file in files {
                    let contents = fs::read(file).map_err(|e| GenerateError::io(file, e))?;
                    size += contents.len() as u64;
                    hasher.update(&contents);
                }
                if options.verbose {
                    let names: Vec<String> =
                        files.iter().map(|f| f.display().to_string()).collect();
                    options.log(&format!(
                        "Caching dynamic URL \"{}\" with dependencies on {:?}",
                        url, names
                    ));
                }
                (hex::encode(hasher.finalize()), size)
            }
            Dependencies::Content(content) => {
                if options.verbose {
                    options.log(&format!("Caching dynamic URL \"{}\" with literal content", url));
                }
                (hash_bytes(content.as_bytes()), content.len() as u64)
            }
        };
        manifest.insert(ManifestEntry {
            url: url.clone(),
            hash,
            size,
        });
    }

    options.log(&format!(
        "Total precache size is about {} for {} resources.",
        format_size(manifest.total_size()),
        manifest.len()
    ));

    Ok(manifest)
}

/// URL a precached file is served under.
pub fn file_url(path: &Path, options: &SwOptions) -> String {
    let path = path.to_string_lossy().replace('\\', "/");

    let longest = options
        .strip_prefix_multi
        .iter()
        .filter(|(prefix, _)| path.starts_with(prefix.as_str()))
        .max_by_key(|(prefix, _)| prefix.len());
    if let Some((prefix, replacement)) = longest {
        return format!("{replacement}{}", &path[prefix.len()..]);
    }

    if let Some(prefix) = &options.strip_prefix {
        if let Some(rest) = path.strip_prefix(prefix.as_str()) {
            let replacement = options.replace_prefix.as_deref().unwrap_or("");
            return format!("{replacement}{rest}");
        }
    }

    path
}

fn hash_bytes(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "kB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1000.0 && unit < UNITS.len() - 1 {
        value /= 1000.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}
