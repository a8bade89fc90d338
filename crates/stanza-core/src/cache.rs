//! Render each distinct poem once, then serve it from memory
//!
//! Entries are keyed by [`Fingerprint`] and hold the encoded PNG. The map is a
//! moka cache, which gives three things at once:
//! - Single flight: concurrent misses on one key share a single render
//! - Expiry: entries disappear `ttl` after insertion
//! - A byte budget: entries are weighed by their encoded size
//!
//! Failed renders are never stored. Everybody waiting on a failed render gets
//! the same error, and the next request tries again.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use moka::sync::Cache;

use crate::{
    cache_config::CacheConfig,
    error::{RenderError, Result, StanzaError},
    fingerprint::Fingerprint,
    traits::Renderer,
    RenderRequest,
};

/// Encoded image bytes, shared between the cache and every caller
pub type ImageBytes = Arc<Vec<u8>>;

/// Fingerprint-keyed store of rendered images
pub struct ContentCache {
    entries: Option<Cache<Fingerprint, ImageBytes>>,
    config: CacheConfig,
    hits: AtomicU64,
    misses: AtomicU64,
    renders: AtomicU64,
    failures: AtomicU64,
}

impl ContentCache {
    pub fn new(config: CacheConfig) -> Self {
        let entries = config.enabled.then(|| {
            Cache::builder()
                .max_capacity(config.max_bytes)
                .weigher(|_key: &Fingerprint, value: &ImageBytes| -> u32 {
                    u32::try_from(value.len()).unwrap_or(u32::MAX)
                })
                .time_to_live(config.ttl)
                .build()
        });

        log::debug!(
            "Content cache: enabled={}, ttl={:?}, max_bytes={}",
            config.enabled,
            config.ttl,
            config.max_bytes
        );

        Self {
            entries,
            config,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            renders: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.entries.is_some()
    }

    /// Return the cached image for `request`, rendering it if needed
    ///
    /// The request is normalized and validated before the cache is touched, so
    /// a request that can never render is rejected without side effects.
    pub fn get_or_render(
        &self,
        request: &RenderRequest,
        renderer: &dyn Renderer,
    ) -> Result<ImageBytes> {
        let request = request.normalized()?;
        renderer.validate(&request)?;
        let fingerprint = Fingerprint::of_normalized(&request);

        let Some(entries) = &self.entries else {
            return self.render_once(&request, renderer).map_err(StanzaError::from);
        };

        if let Some(bytes) = entries.get(&fingerprint) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            log::trace!("Cache hit for {fingerprint}");
            return Ok(bytes);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        log::debug!("Cache miss for {fingerprint}, rendering with {}", renderer.name());

        entries
            .try_get_with(fingerprint, || self.render_once(&request, renderer))
            .map_err(|shared| StanzaError::RenderFailed((*shared).clone()))
    }

    fn render_once(
        &self,
        request: &RenderRequest,
        renderer: &dyn Renderer,
    ) -> std::result::Result<ImageBytes, RenderError> {
        self.renders.fetch_add(1, Ordering::Relaxed);
        match renderer.render(request) {
            Ok(bytes) => Ok(Arc::new(bytes)),
            Err(e) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                log::warn!("Render failed: {e}");
                Err(RenderError::from(e))
            },
        }
    }

    /// Look up a finished render without triggering one
    pub fn get(&self, fingerprint: &Fingerprint) -> Option<ImageBytes> {
        self.entries.as_ref()?.get(fingerprint)
    }

    pub fn invalidate(&self, fingerprint: &Fingerprint) {
        if let Some(entries) = &self.entries {
            entries.invalidate(fingerprint);
        }
    }

    pub fn invalidate_all(&self) {
        if let Some(entries) = &self.entries {
            entries.invalidate_all();
        }
    }

    /// Flush moka's pending evictions so sizes and counts are exact
    pub fn run_pending_tasks(&self) {
        if let Some(entries) = &self.entries {
            entries.run_pending_tasks();
        }
    }

    pub fn stats(&self) -> CacheStats {
        let (entries, weighted_bytes) = match &self.entries {
            Some(cache) => (cache.entry_count(), cache.weighted_size()),
            None => (0, 0),
        };

        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            renders: self.renders.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            entries,
            weighted_bytes,
        }
    }
}

impl Default for ContentCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

/// Counters since the cache was created
///
/// `entries` and `weighted_bytes` are approximate until
/// [`ContentCache::run_pending_tasks`] runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Renders actually started
    pub renders: u64,
    pub failures: u64,
    pub entries: u64,
    pub weighted_bytes: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
