//! Thread-safe cache handle.
//!
//! [`Cache`] guards the cache store with a reader/writer lock and delivers removed
//! entries to the eviction callback once the lock has been released.

use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

use crate::cache::store::{Expiration, Lookup, Store};
use crate::cache::CacheStats;
use crate::config::CacheConfig;

/// Callback receiving every `(key, value)` pair that leaves the cache.
pub type EvictionCallback<K, V> = Arc<dyn Fn(K, V) + Send + Sync>;

// == Cache ==
/// In-process key/value cache with LRU eviction and optional per-entry TTL.
///
/// Every structural mutation, including promotion on `get`, takes the write
/// lock; `has`, `len`, `ttl` and `stats` take the read lock. Expiration is lazy:
/// only [`Cache::get_and_remove_expire`] and [`Cache::remove_expire`] look at it,
/// and nothing runs in the background.
///
/// # Eviction callback
/// The callback fires exactly once for each entry removed by capacity
/// eviction, `remove`, `remove_oldest`, `remove_expire`, a stale
/// `get_and_remove_expire`, `clear` or `reset`. It never fires for lookups, and
/// not for entries still present when the cache is dropped. It always runs after
/// the lock is released, so it may call back into the cache, but it then sees
/// the state after the removal.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use ttl_lru::Cache;
///
/// let cache = Cache::new(2);
/// cache.set("a", 1);
/// cache.set_with_expire("b", 2, Duration::from_secs(60));
/// assert_eq!(cache.get("a"), Some(1));
///
/// cache.set("c", 3); // evicts "b", the least recently used
/// assert!(!cache.has("b"));
/// assert_eq!(cache.len(), 2);
/// ```
pub struct Cache<K, V> {
    store: RwLock<Store<K, V>>,
    on_evicted: RwLock<Option<EvictionCallback<K, V>>>,
}

impl<K, V> fmt::Debug for Cache<K, V>
where
    K: Hash + Eq + Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let store = self.store.read();
        f.debug_struct("Cache")
            .field("capacity", &store.capacity())
            .field("len", &store.len())
            .field("on_evicted", &self.on_evicted.read().is_some())
            .finish()
    }
}

impl<K, V> Cache<K, V>
where
    K: Hash + Eq + Clone,
{
    // == Constructors ==
    /// Creates an empty cache holding at most `capacity` entries.
    ///
    /// A capacity of 0 disables automatic eviction; the owner is then
    /// responsible for calling [`Cache::remove_oldest`].
    pub fn new(capacity: usize) -> Self {
        Self {
            store: RwLock::new(Store::new(capacity)),
            on_evicted: RwLock::new(None),
        }
    }

    /// Creates an empty cache from configuration.
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.capacity)
    }

    /// Installs the eviction callback and returns the cache.
    pub fn with_on_evicted<F>(self, callback: F) -> Self
    where
        F: Fn(K, V) + Send + Sync + 'static,
    {
        self.set_on_evicted(callback);
        self
    }

    // == Eviction Callback ==
    /// Replaces the eviction callback.
    pub fn set_on_evicted<F>(&self, callback: F)
    where
        F: Fn(K, V) + Send + Sync + 'static,
    {
        *self.on_evicted.write() = Some(Arc::new(callback));
    }

    /// Removes the eviction callback.
    pub fn clear_on_evicted(&self) {
        *self.on_evicted.write() = None;
    }

    // == Write Path ==
    /// Inserts or updates `key` and marks it most recently used.
    ///
    /// An existing entry keeps its expiration; a new one never expires.
    pub fn set(&self, key: K, value: V) {
        let evicted = {
            let mut store = self.store.write();
            store.insert(key, value, Expiration::Retain, Instant::now())
        };
        self.notify(evicted);
    }

    /// Inserts or updates `key` so that it expires `ttl` from now.
    ///
    /// The expiration is refreshed on existing entries too. A zero `ttl`
    /// produces an entry that is already stale; a `ttl` beyond what the clock
    /// can represent never expires.
    pub fn set_with_expire(&self, key: K, value: V, ttl: Duration) {
        let evicted = {
            let mut store = self.store.write();
            store.insert(key, value, Expiration::After(ttl), Instant::now())
        };
        self.notify(evicted);
    }

    // == Read Path ==
    /// Checks whether `key` is present, without promoting it.
    ///
    /// Stale entries that have not been swept yet still count as present.
    pub fn has<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.store.read().contains(key)
    }

    /// Remaining lifetime of `key`.
    ///
    /// Returns None if the key is absent or never expires, and
    /// `Some(Duration::ZERO)` if it is stale but not yet removed.
    pub fn ttl<Q>(&self, key: &Q) -> Option<Duration>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.store.read().ttl(key, Instant::now())
    }

    // == Removal ==
    /// Removes `key`. Returns false, and fires nothing, if it was absent.
    pub fn remove<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let removed = self.store.write().remove(key);
        let found = removed.is_some();
        self.notify(removed);
        found
    }

    /// Removes the least recently used entry. Returns false if the cache is empty.
    pub fn remove_oldest(&self) -> bool {
        let removed = self.store.write().remove_oldest();
        let found = removed.is_some();
        self.notify(removed);
        found
    }

    /// Sweeps the whole cache and removes every stale entry.
    ///
    /// O(n) in the number of entries. Returns how many entries were removed.
    pub fn remove_expire(&self) -> usize {
        let removed = self.store.write().remove_expired(Instant::now());
        let count = removed.len();
        self.notify(removed);
        count
    }

    /// Removes every entry and releases the underlying storage.
    pub fn clear(&self) {
        let drained = self.store.write().drain(true);
        self.notify(drained);
    }

    /// Removes every entry but keeps the allocated storage for reuse.
    pub fn reset(&self) {
        let drained = self.store.write().drain(false);
        self.notify(drained);
    }

    // == Introspection ==
    pub fn len(&self) -> usize {
        self.store.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.store.read().capacity()
    }

    /// Returns a snapshot of the cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.store.read().stats()
    }

    // Runs outside the store lock.
    fn notify<I>(&self, removed: I)
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let callback = self.on_evicted.read().clone();
        if let Some(callback) = callback {
            for (key, value) in removed {
                callback(key, value);
            }
        }
    }
}

impl<K, V> Cache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// Returns a copy of the value for `key` and marks it most recently used.
    ///
    /// Does not check expiration: a stale entry is still returned.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.store.write().get(key).cloned()
    }

    /// Returns a copy of the value for `key`, removing the entry if it is stale.
    ///
    /// A stale hit is still returned to this caller; the entry is gone for every
    /// later call and the eviction callback receives it.
    pub fn get_and_remove_expire<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let (value, expired) = {
            let mut store = self.store.write();
            match store.get_and_remove_expired(key, Instant::now())? {
                Lookup::Fresh(value) => (value.clone(), None),
                Lookup::Expired(key, value) => (value.clone(), Some((key, value))),
            }
        };
        self.notify(expired);
        Some(value)
    }
}

impl<K, V> Default for Cache<K, V>
where
    K: Hash + Eq + Clone,
{
    fn default() -> Self {
        Self::from_config(&CacheConfig::default())
    }
}
