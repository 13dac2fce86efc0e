//! Cache configuration.
//!
//! Controls entry lifetime and the sweep cadence, derived from the validated
//! `[cache]` settings.

use std::time::Duration;

const DEFAULT_TTL_SECS: u64 = 300;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;

/// Tunables for [`TtlCache`](super::TtlCache) and the background sweeper.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Lifetime applied by `set_default` and by content store reads.
    pub default_ttl_secs: u64,
    /// How often the sweeper drops expired entries.
    pub sweep_interval_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl_secs: DEFAULT_TTL_SECS,
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            default_ttl_secs: settings.default_ttl.as_secs(),
            sweep_interval_secs: settings.sweep_interval.as_secs(),
        }
    }
}

impl CacheConfig {
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_secs)
    }

    /// Sweep interval, clamped to one second so a zero never yields a busy loop.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = CacheConfig::default();
        assert_eq!(config.default_ttl(), Duration::from_secs(300));
        assert_eq!(config.sweep_interval(), Duration::from_secs(60));
    }

    #[test]
    fn built_from_validated_settings() {
        let settings = crate::config::CacheSettings {
            default_ttl: Duration::from_secs(90),
            sweep_interval: Duration::from_secs(15),
        };
        let config = CacheConfig::from(&settings);
        assert_eq!(config.default_ttl(), Duration::from_secs(90));
        assert_eq!(config.sweep_interval(), Duration::from_secs(15));
    }

    #[test]
    fn zero_sweep_interval_clamps_to_one_second() {
        let config = CacheConfig {
            sweep_interval_secs: 0,
            ..Default::default()
        };
        assert_eq!(config.sweep_interval(), Duration::from_secs(1));
    }
}
