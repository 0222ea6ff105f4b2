//! Cache Store Module
//!
//! Unsynchronized cache engine: a key index over an arena recency list, with
//! capacity eviction and TTL expiration. [`crate::cache::Cache`] wraps it in a lock.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::cache::entry::{expiration_after, Entry};
use crate::cache::lru::{Handle, RecencyList};
use crate::cache::CacheStats;

/// Key/value pairs that left the store during one call, in removal order.
pub(crate) type Evicted<K, V> = Vec<(K, V)>;

// == Expiration Policy ==
/// How a write treats the expiration of the entry it touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Expiration {
    /// New entries never expire; existing entries keep their expiration
    Retain,
    /// The entry expires `ttl` after the write, new or existing
    After(Duration),
}

// == Lookup Result ==
/// Outcome of an expiration-aware lookup hit.
#[derive(Debug)]
pub(crate) enum Lookup<'a, K, V> {
    /// Entry is live and was promoted
    Fresh(&'a V),
    /// Entry was stale and has been detached
    Expired(K, V),
}

// == Cache Store ==
/// Cache storage with LRU eviction and TTL support.
#[derive(Debug)]
pub(crate) struct Store<K, V> {
    /// Key to list position
    index: HashMap<K, Handle>,
    /// Entries ordered most to least recently used
    recency: RecencyList<Entry<K, V>>,
    /// Maximum number of entries, 0 = unbounded
    capacity: usize,
    /// Performance statistics
    stats: CacheStats,
}

impl<K, V> Store<K, V>
where
    K: Hash + Eq + Clone,
{
    // == Constructor ==
    /// Creates an empty store. `capacity == 0` disables automatic eviction.
    pub fn new(capacity: usize) -> Self {
        Self {
            index: HashMap::new(),
            recency: RecencyList::new(),
            capacity,
            stats: CacheStats::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.recency.len()
    }

    // == Insert ==
    /// Inserts or updates `key`, promoting it to most recently used.
    ///
    /// Returns the entries evicted to bring the store back within capacity.
    pub fn insert(
        &mut self,
        key: K,
        value: V,
        expiration: Expiration,
        now: Instant,
    ) -> Evicted<K, V> {
        if let Some(&handle) = self.index.get(&key) {
            if let Some(entry) = self.recency.get_mut(handle) {
                entry.value = value;
                if let Expiration::After(ttl) = expiration {
                    entry.expires_at = expiration_after(now, ttl);
                }
            }
            self.recency.move_to_front(handle);
            return Vec::new();
        }

        let expires_at = match expiration {
            Expiration::Retain => None,
            Expiration::After(ttl) => expiration_after(now, ttl),
        };
        let handle = self
            .recency
            .push_front(Entry::new(key.clone(), value, expires_at));
        self.index.insert(key, handle);

        let evicted = self.enforce_capacity();
        self.stats.set_total_entries(self.len());
        evicted
    }

    // == Get ==
    /// Returns the value for `key` and promotes it. Ignores expiration.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let Some(&handle) = self.index.get(key) else {
            self.stats.record_miss();
            return None;
        };
        self.stats.record_hit();
        self.recency.move_to_front(handle);
        self.recency.get(handle).map(|entry| &entry.value)
    }

    // == Get And Remove Expired ==
    /// Looks up `key` and detaches it if it is stale at `now`.
    ///
    /// A stale hit still counts as a hit: the caller receives the detached pair.
    pub fn get_and_remove_expired<Q>(
        &mut self,
        key: &Q,
        now: Instant,
    ) -> Option<Lookup<'_, K, V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let Some(&handle) = self.index.get(key) else {
            self.stats.record_miss();
            return None;
        };
        self.stats.record_hit();

        let stale = self
            .recency
            .get(handle)
            .is_some_and(|entry| entry.is_expired_at(now));
        if stale {
            let (key, value) = self.detach(handle)?;
            self.stats.record_expirations(1);
            self.stats.set_total_entries(self.len());
            trace!("removed expired entry on access");
            return Some(Lookup::Expired(key, value));
        }

        self.recency.move_to_front(handle);
        self.recency
            .get(handle)
            .map(|entry| Lookup::Fresh(&entry.value))
    }

    // == Contains ==
    /// Checks if `key` is indexed. No promotion, no expiration check.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.contains_key(key)
    }

    // == Time To Live ==
    /// Remaining lifetime of `key` at `now`; None if absent or never expiring.
    pub fn ttl<Q>(&self, key: &Q, now: Instant) -> Option<Duration>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let handle = self.index.get(key).copied()?;
        self.recency.get(handle)?.ttl_remaining_at(now)
    }

    // == Remove ==
    /// Detaches `key` if present.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let handle = self.index.get(key).copied()?;
        let pair = self.detach(handle)?;
        self.stats.record_removals(1);
        self.stats.set_total_entries(self.len());
        Some(pair)
    }

    // == Remove Oldest ==
    /// Detaches the least recently used entry.
    pub fn remove_oldest(&mut self) -> Option<(K, V)> {
        let pair = self.detach_oldest()?;
        self.stats.record_evictions(1);
        self.stats.set_total_entries(self.len());
        Some(pair)
    }

    // == Remove Expired ==
    /// Detaches every entry that is stale at `now`.
    pub fn remove_expired(&mut self, now: Instant) -> Evicted<K, V> {
        let stale: Vec<Handle> = self
            .recency
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(handle, _)| handle)
            .collect();

        let removed: Evicted<K, V> = stale
            .into_iter()
            .filter_map(|handle| self.detach(handle))
            .collect();

        self.stats.record_expirations(removed.len());
        self.stats.set_total_entries(self.len());
        debug!(
            removed = removed.len(),
            remaining = self.len(),
            "expiration sweep finished"
        );
        removed
    }

    // == Drain ==
    /// Detaches every entry, least recently used first.
    ///
    /// With `release_storage` the index and list allocations are dropped too;
    /// otherwise they are kept for reuse.
    pub fn drain(&mut self, release_storage: bool) -> Evicted<K, V> {
        let entries = self.recency.drain_lru_first();
        if release_storage {
            self.index = HashMap::new();
            self.recency = RecencyList::new();
        } else {
            self.index.clear();
        }

        self.stats.record_removals(entries.len());
        self.stats.set_total_entries(0);
        debug!(
            removed = entries.len(),
            release_storage, "drained cache"
        );
        entries.into_iter().map(Entry::into_pair).collect()
    }

    // == Stats ==
    /// Returns a snapshot of the current statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.len());
        stats
    }

    // == Internal Helpers ==
    fn detach(&mut self, handle: Handle) -> Option<(K, V)> {
        let entry = self.recency.remove(handle)?;
        self.index.remove(&entry.key);
        Some(entry.into_pair())
    }

    fn detach_oldest(&mut self) -> Option<(K, V)> {
        let handle = self.recency.back()?;
        self.detach(handle)
    }

    fn enforce_capacity(&mut self) -> Evicted<K, V> {
        let mut evicted = Vec::new();
        if self.capacity == 0 {
            return evicted;
        }

        while self.len() > self.capacity {
            match self.detach_oldest() {
                Some(pair) => evicted.push(pair),
                None => break,
            }
        }

        if !evicted.is_empty() {
            self.stats.record_evictions(evicted.len());
            debug!(
                evicted = evicted.len(),
                capacity = self.capacity,
                "evicted least recently used entries"
            );
        }
        evicted
    }

    /// Checks that index and list hold the same keys, each pointing at its own slot.
    #[cfg(test)]
    pub fn is_consistent(&self) -> bool {
        self.index.len() == self.recency.len()
            && self
                .recency
                .iter()
                .all(|(handle, entry)| self.index.get(&entry.key) == Some(&handle))
    }

    /// Keys from most to least recently used.
    #[cfg(test)]
    pub fn keys_mru_first(&self) -> Vec<K> {
        self.recency
            .iter()
            .map(|(_, entry)| entry.key.clone())
            .collect()
    }
}
