//! Static file watcher for worker invalidation.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};

use crate::worker::ArtifactGate;

/// Watches static roots and marks the generated worker stale on change.
pub struct StaticWatcher {
    paths: Vec<PathBuf>,
    gate: Arc<ArtifactGate>,
}

impl StaticWatcher {
    pub fn new(gate: Arc<ArtifactGate>) -> Self {
        Self {
            paths: Vec::new(),
            gate,
        }
    }

    /// Add a directory (watched recursively) or file.
    pub fn watch(mut self, path: &Path) -> Self {
        self.paths.push(path.to_path_buf());
        self
    }

    /// Start watching. The returned watcher must be kept alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let gate = self.gate.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() || event.kind.is_remove() {
                        let version = gate.invalidate();
                        tracing::info!(paths = ?event.paths, version, "Static files changed, worker invalidated");
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        for path in &self.paths {
            watcher.watch(path, RecursiveMode::Recursive)?;
            tracing::info!(path = ?path, "Static watcher started");
        }
        Ok(watcher)
    }
}
