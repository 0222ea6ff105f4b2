//! ttl_lru - An embeddable in-process cache
//!
//! Bounded key/value storage with least-recently-used eviction, optional
//! per-entry TTL expiration, and an eviction callback.

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{Cache, CacheStats, EvictionCallback};
pub use config::CacheConfig;
pub use error::{ConfigError, Result};
