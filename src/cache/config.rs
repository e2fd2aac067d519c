//! Cache configuration.
//!
//! Controls the dashboard TTL cache via `vetrina.toml`.

use std::time::Duration;

use serde::Deserialize;

const DEFAULT_TTL_SECONDS: u64 = 10;
const DEFAULT_SWEEP_INTERVAL_SECONDS: u64 = 60;

/// Cache configuration from `vetrina.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Enable the dashboard query cache.
    pub enabled: bool,
    /// Freshness window for cached dashboard results.
    pub ttl_seconds: u64,
    /// Cadence of the background sweep that drops expired entries. Expiry is
    /// lazy regardless; the sweep only reclaims memory. Zero disables it.
    pub sweep_interval_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_seconds: DEFAULT_TTL_SECONDS,
            sweep_interval_seconds: DEFAULT_SWEEP_INTERVAL_SECONDS,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            ttl_seconds: settings.ttl_seconds,
            sweep_interval_seconds: settings.sweep_interval_seconds,
        }
    }
}

impl CacheConfig {
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds.max(1))
    }

    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.sweep_interval_seconds > 0)
            .then(|| Duration::from_secs(self.sweep_interval_seconds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = CacheConfig::default();
        assert!(config.enabled);
        assert_eq!(config.ttl_seconds, 10);
        assert_eq!(config.sweep_interval_seconds, 60);
    }

    #[test]
    fn ttl_clamps_to_at_least_one_second() {
        let config = CacheConfig {
            ttl_seconds: 0,
            ..Default::default()
        };
        assert_eq!(config.ttl(), Duration::from_secs(1));
    }

    #[test]
    fn zero_sweep_interval_disables_sweeper() {
        let config = CacheConfig {
            sweep_interval_seconds: 0,
            ..Default::default()
        };
        assert!(config.sweep_interval().is_none());
    }
}
