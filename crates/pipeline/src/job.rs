//! Configured import jobs.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};

use sentry_import_core::config::{normalize_source, Config, ImportConfig};
use sentry_import_core::Dsn;

use crate::cache;
use crate::error::PipelineError;

/// One configured (source, target) pair, synced and submitted periodically.
///
/// Everything except the lock is fixed at startup. The lock serializes
/// syncs of the same source: an import worker holds it for the whole
/// "rsync + list cached files" step.
pub struct Job {
    pub name: String,
    /// rsync source, always ending with `/`.
    pub source: String,
    pub target: Dsn,
    pub cache_dir: PathBuf,
    lock: Mutex<()>,
}

impl Job {
    pub fn new(name: impl Into<String>, source: &str, target: Dsn, cache_root: &Path) -> Self {
        let source = normalize_source(source);
        let cache_dir = cache::resolve(cache_root, &source, &target.raw);
        Self {
            name: name.into(),
            source,
            target,
            cache_dir,
            lock: Mutex::new(()),
        }
    }

    pub fn from_config(import: &ImportConfig, cache_root: &Path) -> Self {
        Self::new(import.name.clone(), &import.source, import.target.clone(), cache_root)
    }

    /// Wait until no other worker is syncing this job.
    pub async fn lock(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().await
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("name", &self.name)
            .field("source", &self.source)
            .field("target", &self.target.to_string())
            .field("cache_dir", &self.cache_dir)
            .finish()
    }
}

/// Build every configured job and create its cache directory.
///
/// Fails on the first directory that cannot be created, before any worker
/// has started.
pub fn jobs_from_config(config: &Config) -> Result<Vec<Arc<Job>>, PipelineError> {
    config
        .imports
        .iter()
        .map(|import| {
            let job = Job::from_config(import, &config.cache);
            cache::ensure(&job.cache_dir)?;
            Ok(Arc::new(job))
        })
        .collect()
}
