//! Generated worker cache.
//!
//! # Responsibilities
//! - Hold the current options snapshot and its version
//! - Serve the cached script while it matches the current version
//! - Regenerate at most once per version, however many requests wait
//!
//! # Design Decisions
//! - Snapshots are immutable and swapped atomically (`ArcSwap`)
//! - The fast path never awaits: a fresh artifact is a single atomic load
//! - Regenerations serialize behind one async mutex; waiters re-check the
//!   cache after acquiring it, so they reuse the result of the call they
//!   queued behind
//! - A failed generation leaves the artifact stale so the next request retries

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use arc_swap::{ArcSwap, ArcSwapOption};
use tokio::sync::Mutex;

use crate::config::schema::SwOptions;
use crate::generator::{GenerateError, Generator};
use crate::observability::metrics;

/// Options together with the version they were published under.
#[derive(Debug)]
pub struct Snapshot {
    pub version: u64,
    pub options: Arc<SwOptions>,
}

/// A generated script and the snapshot version it was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub version: u64,
    pub script: Arc<str>,
}

/// Lazily regenerating holder of the worker script.
pub struct ArtifactGate {
    snapshot: ArcSwap<Snapshot>,
    next_version: AtomicU64,
    cached: ArcSwapOption<Artifact>,
    flight: Mutex<()>,
    generator: Arc<dyn Generator>,
}

impl ArtifactGate {
    pub fn new(options: SwOptions, generator: Arc<dyn Generator>) -> Self {
        Self {
            snapshot: ArcSwap::from_pointee(Snapshot {
                version: 1,
                options: Arc::new(options),
            }),
            next_version: AtomicU64::new(2),
            cached: ArcSwapOption::empty(),
            flight: Mutex::new(()),
            generator,
        }
    }

    /// Current options snapshot.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshot.load_full()
    }

    pub fn options(&self) -> Arc<SwOptions> {
        self.snapshot.load().options.clone()
    }

    /// Replace the options through `update`, publishing a new version.
    ///
    /// `update` may run more than once if another update races it.
    pub fn update<F, E>(&self, mut update: F) -> Result<u64, E>
    where
        F: FnMut(SwOptions) -> Result<SwOptions, E>,
    {
        loop {
            let current = self.snapshot.load_full();
            let options = update((*current.options).clone())?;
            let next = Arc::new(Snapshot {
                version: self.next_version.fetch_add(1, Ordering::SeqCst),
                options: Arc::new(options),
            });
            let version = next.version;

            let previous = self.snapshot.compare_and_swap(&current, next);
            if Arc::ptr_eq(&*previous, &current) {
                tracing::debug!(version, "Service worker options updated");
                return Ok(version);
            }
        }
    }

    /// Mark the artifact stale without changing the options.
    pub fn invalidate(&self) -> u64 {
        let previous = self.snapshot.rcu(|current| Snapshot {
            version: self.next_version.fetch_add(1, Ordering::SeqCst),
            options: current.options.clone(),
        });
        let version = self.snapshot.load().version;
        tracing::debug!(previous = previous.version, version, "Service worker invalidated");
        version
    }

    /// True when the cached artifact does not match the current version.
    pub fn is_stale(&self) -> bool {
        let version = self.snapshot.load().version;
        !matches!(&*self.cached.load(), Some(a) if a.version == version)
    }

    /// The current artifact, regenerating if the options changed.
    pub async fn current(&self) -> Result<Arc<Artifact>, GenerateError> {
        if let Some(fresh) = self.fresh() {
            return Ok(fresh);
        }

        let _flight = self.flight.lock().await;
        if let Some(fresh) = self.fresh() {
            return Ok(fresh);
        }

        let snapshot = self.snapshot.load_full();
        let started = Instant::now();
        tracing::info!(version = snapshot.version, "Regenerating service worker");

        match self.generator.generate(&snapshot.options).await {
            Ok(script) => {
                metrics::record_regeneration(started);
                let artifact = Arc::new(Artifact {
                    version: snapshot.version,
                    script: Arc::from(script),
                });
                self.cached.store(Some(artifact.clone()));
                tracing::info!(
                    version = snapshot.version,
                    bytes = artifact.script.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Service worker generated"
                );
                Ok(artifact)
            }
            Err(e) => {
                metrics::record_generation_failure();
                tracing::error!(version = snapshot.version, error = %e, "Service worker generation failed");
                Err(e)
            }
        }
    }

    fn fresh(&self) -> Option<Arc<Artifact>> {
        let version = self.snapshot.load().version;
        match self.cached.load_full() {
            Some(artifact) if artifact.version == version => Some(artifact),
            _ => None,
        }
    }
}
