//! How long rendered images live and how much room they get
//!
//! Caching is **enabled by default**: a rendered poem stays around for six
//! hours or until 256 MiB of newer renders push it out.
//!
//! # Environment Variables
//!
//! Read by [`CacheConfig::with_env_overrides`]:
//!
//! ```bash
//! STANZA_CACHE=0 ./stanza render ...        # render every request afresh
//! STANZA_CACHE_TTL=60 ./stanza batch ...    # entries expire after a minute
//! ```

use std::time::Duration;

/// Six hours, matching how long a shared poem link is expected to stay hot
pub const DEFAULT_TTL: Duration = Duration::from_secs(6 * 60 * 60);

/// 256 MiB of encoded PNGs
pub const DEFAULT_MAX_BYTES: u64 = 256 * 1024 * 1024;

/// Settings for [`ContentCache`](crate::ContentCache)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// When false the cache is a pass-through and every request renders
    pub enabled: bool,
    /// Time-to-live measured from insertion
    pub ttl: Duration,
    /// Upper bound on the summed size of cached images
    pub max_bytes: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl: DEFAULT_TTL,
            max_bytes: DEFAULT_MAX_BYTES,
        }
    }
}

impl CacheConfig {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Apply `STANZA_CACHE` and `STANZA_CACHE_TTL` on top of these settings
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Same as [`with_env_overrides`](Self::with_env_overrides) with a custom variable source
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(val) = lookup("STANZA_CACHE") {
            match parse_switch(&val) {
                Some(enabled) => {
                    self.enabled = enabled;
                    log::info!(
                        "Stanza caching {} via STANZA_CACHE",
                        if enabled { "enabled" } else { "disabled" }
                    );
                },
                None => log::warn!("Ignoring STANZA_CACHE={val:?}: expected on/off"),
            }
        }

        if let Some(val) = lookup("STANZA_CACHE_TTL") {
            match val.trim().parse::<u64>() {
                Ok(secs) => {
                    self.ttl = Duration::from_secs(secs);
                    log::info!("Stanza cache TTL set to {secs}s via STANZA_CACHE_TTL");
                },
                Err(_) => log::warn!("Ignoring STANZA_CACHE_TTL={val:?}: expected seconds"),
            }
        }

        self
    }
}

/// Shared reading of boolean-ish environment values
pub fn parse_switch(val: &str) -> Option<bool> {
    match val.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
