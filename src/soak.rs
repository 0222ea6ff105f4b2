//! Soak Driver
//!
//! Owner-side plumbing for the soak binary: configuration from the
//! environment, worker tasks that hammer a shared cache, and the periodic
//! sweep task that drives TTL cleanup.

use std::env;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use ttl_lru::{Cache, ConfigError, Result};

// == Soak Config ==
/// Soak run parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoakConfig {
    /// Maximum number of entries the cache can hold
    pub capacity: usize,
    /// Number of distinct keys the workers draw from
    pub key_space: u64,
    /// Number of concurrent worker tasks
    pub workers: usize,
    /// TTL for entries written with an expiration, in milliseconds
    pub entry_ttl_ms: u64,
    /// Interval between expiration sweeps, in milliseconds
    pub sweep_interval_ms: u64,
    /// Run length in seconds
    pub run_secs: u64,
}

impl SoakConfig {
    /// Loads the configuration from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_CAPACITY` - Maximum cache entries (default: 1000)
    /// - `KEY_SPACE` - Distinct keys used by workers (default: 5000)
    /// - `WORKERS` - Concurrent worker tasks (default: 4)
    /// - `ENTRY_TTL_MS` - TTL of expiring entries (default: 200)
    /// - `SWEEP_INTERVAL_MS` - Sweep frequency (default: 250)
    /// - `RUN_SECS` - Run length (default: 5)
    ///
    /// Unset variables take their default; set but unparsable ones are an error.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            capacity: env_or("CACHE_CAPACITY", defaults.capacity)?,
            key_space: env_or("KEY_SPACE", defaults.key_space)?,
            workers: env_or("WORKERS", defaults.workers)?,
            entry_ttl_ms: env_or("ENTRY_TTL_MS", defaults.entry_ttl_ms)?,
            sweep_interval_ms: env_or("SWEEP_INTERVAL_MS", defaults.sweep_interval_ms)?,
            run_secs: env_or("RUN_SECS", defaults.run_secs)?,
        })
    }
}

impl Default for SoakConfig {
    fn default() -> Self {
        Self {
            capacity: 1000,
            key_space: 5000,
            workers: 4,
            entry_ttl_ms: 200,
            sweep_interval_ms: 250,
            run_secs: 5,
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> Result<T> {
    match env::var(name) {
        Ok(raw) => parse_var(name, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_var<T: FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidVar {
        name: name.to_string(),
        value: raw.to_string(),
    })
}

// == Sweep Task ==
/// Spawns a task that calls [`Cache::remove_expire`] every `interval`.
///
/// The cache never schedules its own sweeps; this is the owner's timer.
/// Abort the returned handle to stop it.
pub fn spawn_sweep_task<K, V>(cache: Arc<Cache<K, V>>, interval: Duration) -> JoinHandle<()>
where
    K: std::hash::Hash + Eq + Clone + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    tokio::spawn(async move {
        info!(interval_ms = interval.as_millis() as u64, "Starting expiration sweep task");

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.remove_expire();
            if removed > 0 {
                info!("Expiration sweep: removed {} entries", removed);
            } else {
                debug!("Expiration sweep: no expired entries found");
            }
        }
    })
}

// == Worker Task ==
/// Spawns a worker that issues a deterministic mix of cache operations
/// until aborted.
pub fn spawn_worker(
    id: usize,
    cache: Arc<Cache<u64, String>>,
    config: &SoakConfig,
) -> JoinHandle<()> {
    let key_space = config.key_space.max(1);
    let ttl = Duration::from_millis(config.entry_ttl_ms);

    tokio::spawn(async move {
        let mut state = id as u64 + 1;
        let mut op: u64 = 0;

        loop {
            state = next_state(state);
            let key = state % key_space;

            match op % 8 {
                0 | 1 => cache.set(key, format!("w{}-{}", id, op)),
                2 => cache.set_with_expire(key, format!("w{}-{}", id, op), ttl),
                3 | 4 | 5 => {
                    cache.get(&key);
                }
                6 => {
                    cache.get_and_remove_expire(&key);
                }
                _ => {
                    cache.remove(&key);
                }
            }

            op = op.wrapping_add(1);
            if op % 64 == 0 {
                tokio::task::yield_now().await;
            }
        }
    })
}

// xorshift64, enough to spread keys without a rand dependency.
fn next_state(mut x: u64) -> u64 {
    x ^= x << 13;
    x ^= x >> 7;
    x ^= x << 17;
    x
}
