//! TTL-cached dataset manager.
//!
//! Wraps [`load_dataset`] with an optional time-to-live cache. Callers use
//! [`DatasetManager::get_dataset`] to obtain a shared, immutable [`Dataset`];
//! a failed load is returned to the caller and recorded, never retried and
//! never papered over with the previous cache.
//!
//! The `dl-dashboard` binary loads once per process, so it never hits the
//! cache. The cache serves long-lived callers that embed this crate and build
//! several pages from one handle, reloading only when the TTL lapses or
//! [`DatasetManager::invalidate_cache`] is called.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dl_core::error::Result;
use dl_data::aggregator::GroupingPolicy;
use dl_data::analysis::{load_dataset, Dataset};

// ── Defaults ──────────────────────────────────────────────────────────────────

/// Default cache TTL in seconds.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

// ── DatasetManager ────────────────────────────────────────────────────────────

/// TTL-cached wrapper around the load pipeline.
///
/// # Example
/// ```no_run
/// use dl_data::aggregator::GroupingPolicy;
/// use dl_runtime::data_manager::DatasetManager;
///
/// let mut mgr = DatasetManager::new(300, "Schema.csv".into(), GroupingPolicy::FirstWins);
/// let dataset = mgr.get_dataset(false).unwrap();
/// println!("periods: {}", dataset.summaries().len());
/// ```
pub struct DatasetManager {
    /// Maximum age of a cached dataset before it is reloaded.
    cache_ttl: Duration,
    /// CSV file or directory to load.
    data_path: PathBuf,
    policy: GroupingPolicy,
    cache: Option<Arc<Dataset>>,
    /// When the cache was last populated.
    cache_timestamp: Option<Instant>,
    /// Description of the last load failure.
    last_error: Option<String>,
}

impl DatasetManager {
    pub fn new(cache_ttl_secs: u64, data_path: PathBuf, policy: GroupingPolicy) -> Self {
        Self {
            cache_ttl: Duration::from_secs(cache_ttl_secs),
            data_path,
            policy,
            cache: None,
            cache_timestamp: None,
            last_error: None,
        }
    }

    // ── Public API ────────────────────────────────────────────────────────

    /// Return the dataset, using the cache when it is still valid.
    ///
    /// When `force_refresh` is `true` the cache is bypassed. On failure the
    /// cache is dropped so stale data is never served after a failed reload.
    pub fn get_dataset(&mut self, force_refresh: bool) -> Result<Arc<Dataset>> {
        if !force_refresh && self.is_cache_valid() {
            if let Some(cached) = &self.cache {
                tracing::debug!("returning cached dataset");
                return Ok(Arc::clone(cached));
            }
        }

        match load_dataset(&self.data_path, self.policy) {
            Ok(dataset) => {
                tracing::debug!(
                    records = dataset.metadata().records_loaded,
                    periods = dataset.metadata().periods_created,
                    "dataset cache updated"
                );
                let dataset = Arc::new(dataset);
                self.cache = Some(Arc::clone(&dataset));
                self.cache_timestamp = Some(Instant::now());
                self.last_error = None;
                Ok(dataset)
            }
            Err(e) => {
                tracing::warn!(error = %e, path = %self.data_path.display(), "dataset load failed");
                self.invalidate_cache();
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Discard the current cache, forcing the next call to reload.
    pub fn invalidate_cache(&mut self) {
        self.cache = None;
        self.cache_timestamp = None;
        tracing::debug!("cache invalidated");
    }

    /// Age of the current cache entry, or `None` if nothing is cached.
    pub fn cache_age(&self) -> Option<Duration> {
        self.cache_timestamp.map(|ts| ts.elapsed())
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn data_path(&self) -> &std::path::Path {
        &self.data_path
    }

    // ── Private helpers ───────────────────────────────────────────────────

    fn is_cache_valid(&self) -> bool {
        match (self.cache.as_ref(), self.cache_timestamp) {
            (Some(_), Some(ts)) => ts.elapsed() < self.cache_ttl,
            _ => false,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
