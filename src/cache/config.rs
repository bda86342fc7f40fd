//! Cache configuration.

use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_MAX_SIZE: usize = 1000;
pub const DEFAULT_TTL_MINUTES: u64 = 120;
pub const DEFAULT_CLEANUP_INTERVAL_MINUTES: u64 = 30;
pub const DEFAULT_MAX_RECENT_HEADLINES: usize = 20;
pub const DEFAULT_TOP_BRIEFS_LIMIT: usize = 10;
/// Upper bound accepted for the TTL and the cleanup interval.
pub const MAX_DURATION: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Construction-time settings for a [`GenerationCache`](super::GenerationCache).
///
/// The serialized form expresses durations in minutes:
///
/// ```yaml
/// max_size: 500
/// ttl_minutes: 60
/// cleanup_interval_minutes: 15
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Entry count bound; eviction runs whenever a store exceeds it.
    pub max_size: usize,
    #[serde(rename = "ttl_minutes", with = "minutes")]
    pub ttl: Duration,
    #[serde(rename = "cleanup_interval_minutes", with = "minutes")]
    pub cleanup_interval: Duration,
    /// Headlines retained per brief in the dedup index.
    pub max_recent_headlines: usize,
    /// Briefs reported in [`CacheStatistics::most_used_briefs`](super::CacheStatistics).
    pub top_briefs_limit: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_SIZE,
            ttl: Duration::from_secs(DEFAULT_TTL_MINUTES * 60),
            cleanup_interval: Duration::from_secs(DEFAULT_CLEANUP_INTERVAL_MINUTES * 60),
            max_recent_headlines: DEFAULT_MAX_RECENT_HEADLINES,
            top_briefs_limit: DEFAULT_TOP_BRIEFS_LIMIT,
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }

    pub fn with_max_recent_headlines(mut self, cap: usize) -> Self {
        self.max_recent_headlines = cap;
        self
    }

    pub fn with_top_briefs_limit(mut self, limit: usize) -> Self {
        self.top_briefs_limit = limit;
        self
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Defaults overridden by `CONCEPT_CACHE_*` environment variables.
    ///
    /// Unparsable values are ignored and the default is kept.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Some(max_size) = env_parse::<usize>("CONCEPT_CACHE_MAX_SIZE") {
            config.max_size = max_size;
        }
        if let Some(ttl) = env_parse::<f64>("CONCEPT_CACHE_TTL_MINUTES") {
            config.ttl = minutes::to_duration(ttl);
        }
        if let Some(interval) = env_parse::<f64>("CONCEPT_CACHE_CLEANUP_INTERVAL_MINUTES") {
            config.cleanup_interval = minutes::to_duration(interval);
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_size == 0 {
            return Err(invalid("max_size", "max_size must be at least 1"));
        }
        if self.ttl.is_zero() {
            return Err(invalid("ttl_minutes", "ttl must be greater than zero"));
        }
        if self.ttl > MAX_DURATION {
            return Err(invalid("ttl_minutes", "ttl must not exceed one year"));
        }
        if self.cleanup_interval.is_zero() {
            return Err(invalid(
                "cleanup_interval_minutes",
                "cleanup interval must be greater than zero",
            ));
        }
        if self.cleanup_interval > MAX_DURATION {
            return Err(invalid(
                "cleanup_interval_minutes",
                "cleanup interval must not exceed one year",
            ));
        }
        if self.max_recent_headlines == 0 {
            return Err(invalid(
                "max_recent_headlines",
                "max_recent_headlines must be at least 1",
            ));
        }
        Ok(())
    }

    /// Size above which the second eviction pass kicks in.
    pub(crate) fn high_water_mark(&self) -> usize {
        tenths(self.max_size, 9)
    }

    /// Size the second eviction pass shrinks the store down to.
    pub(crate) fn low_water_mark(&self) -> usize {
        tenths(self.max_size, 8)
    }
}

/// `n * parts / 10` rounded down, without overflowing for large `n`.
fn tenths(n: usize, parts: usize) -> usize {
    n / 10 * parts + n % 10 * parts / 10
}

fn invalid(field: &str, message: &str) -> Error {
    Error::configuration_with_context(
        message,
        ErrorContext::new()
            .with_field_path(field)
            .with_source("cache_config"),
    )
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|s| s.trim().parse::<T>().ok())
}

mod minutes {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn to_duration(minutes: f64) -> Duration {
        if minutes.is_finite() && minutes > 0.0 {
            Duration::try_from_secs_f64(minutes * 60.0).unwrap_or(Duration::MAX)
        } else {
            Duration::ZERO
        }
    }

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64() / 60.0)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let minutes = f64::deserialize(d)?;
        if minutes.is_nan() || minutes < 0.0 {
            return Err(serde::de::Error::custom("minutes must be a non-negative number"));
        }
        Ok(to_duration(minutes))
    }
}
