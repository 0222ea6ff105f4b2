//! Configuration Module
//!
//! Construction-time settings for a [`Cache`](crate::Cache).

use std::hash::Hash;

use serde::{Deserialize, Serialize};

use crate::cache::Cache;
use crate::error::Result;

/// Cache configuration parameters.
///
/// Deserializes from any serde format; missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// Maximum number of entries the cache can hold, 0 = unbounded
    pub capacity: usize,
}

impl CacheConfig {
    /// Creates a configuration with the given capacity.
    pub fn new(capacity: usize) -> Self {
        Self { capacity }
    }

    /// Parses a configuration from a JSON document.
    ///
    /// # Example
    /// ```
    /// use ttl_lru::CacheConfig;
    ///
    /// let config = CacheConfig::from_json(r#"{"capacity": 64}"#).unwrap();
    /// assert_eq!(config.capacity, 64);
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Builds an empty cache with this configuration.
    pub fn build<K, V>(&self) -> Cache<K, V>
    where
        K: Hash + Eq + Clone,
    {
        Cache::from_config(self)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { capacity: 1000 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;

    #[test]
    fn test_config_default() {
        let config = CacheConfig::default();
        assert_eq!(config.capacity, 1000);
    }

    #[test]
    fn test_config_from_json() {
        let config = CacheConfig::from_json(r#"{"capacity": 0}"#).unwrap();
        assert_eq!(config, CacheConfig::new(0));
    }

    #[test]
    fn test_config_from_json_defaults() {
        let config = CacheConfig::from_json("{}").unwrap();
        assert_eq!(config, CacheConfig::default());
    }

    #[test]
    fn test_config_rejects_unknown_fields() {
        let result = CacheConfig::from_json(r#"{"capacity": 10, "ttl": 5}"#);
        assert!(matches!(result, Err(ConfigError::Json(_))));
    }

    #[test]
    fn test_config_rejects_negative_capacity() {
        let result = CacheConfig::from_json(r#"{"capacity": -1}"#);
        assert!(matches!(result, Err(ConfigError::Json(_))));
    }

    #[test]
    fn test_config_builds_cache() {
        let cache = CacheConfig::new(3).build::<String, u8>();
        assert_eq!(cache.capacity(), 3);
        assert!(cache.is_empty());
    }
}
