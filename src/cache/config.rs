//! Cache configuration.

use std::num::NonZeroUsize;
use std::time::Duration;

use serde::Deserialize;

const DEFAULT_SCHOOL_LIMIT: usize = 64;
const DEFAULT_SEASON_LIMIT: usize = 16;
const DEFAULT_STALE_AFTER_MS: u64 = 30_000;

/// Cache section of `ammesso.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum schools held in the query cache.
    pub school_limit: usize,
    /// Maximum seasons held in the query cache.
    pub season_limit: usize,
    /// Freshness window in milliseconds; `0` means entries never go stale
    /// and are replaced only by writes or eviction.
    pub stale_after_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            school_limit: DEFAULT_SCHOOL_LIMIT,
            season_limit: DEFAULT_SEASON_LIMIT,
            stale_after_ms: DEFAULT_STALE_AFTER_MS,
        }
    }
}

impl CacheConfig {
    /// Returns the school limit as NonZeroUsize, clamping to 1 if zero.
    pub fn school_limit_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.school_limit).unwrap_or(NonZeroUsize::MIN)
    }

    /// Returns the season limit as NonZeroUsize, clamping to 1 if zero.
    pub fn season_limit_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.season_limit).unwrap_or(NonZeroUsize::MIN)
    }

    /// Freshness window, or `None` when entries never expire.
    pub fn stale_after(&self) -> Option<Duration> {
        (self.stale_after_ms > 0).then(|| Duration::from_millis(self.stale_after_ms))
    }
}
