// Copyright 2019-2020 PolkaX Authors. Licensed under GPL-3.0.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use log::{debug, trace};
use parking_lot::{Mutex, RwLock};

use crate::Identity;

/// Smallest table size; the table never shrinks below it.
const MIN_CAPACITY: usize = 16;

/// The table grows past 4/5 occupancy and shrinks below 1/4.
const LOAD_FACTOR_NUM: usize = 4;
const LOAD_FACTOR_DENOM: usize = 5;
const SHRINK_DENOM: usize = 4;

/// Spread an identity hash over the buckets (the murmur3 64-bit
/// finalizer), so that clustered hashes do not pile into one chain.
fn spread(hash: u64) -> u64 {
    let mut h = hash;
    h ^= h >> 33;
    h = h.wrapping_mul(0xff51_afd7_ed55_8ccd);
    h ^= h >> 33;
    h = h.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    h ^= h >> 33;
    h
}

/// Smallest power-of-two capacity that keeps `len` under the load factor.
fn capacity_for(len: usize) -> usize {
    let mut capacity = MIN_CAPACITY;
    while len * LOAD_FACTOR_DENOM > capacity * LOAD_FACTOR_NUM {
        capacity <<= 1;
    }
    capacity
}

struct CacheEntry<T> {
    hash: u64,
    referent: Weak<T>,
}

impl<T> CacheEntry<T> {
    fn is_live(&self) -> bool {
        Weak::strong_count(&self.referent) > 0
    }
}

struct Table<T> {
    chains: Box<[Mutex<Vec<CacheEntry<T>>>]>,
}

impl<T> Table<T> {
    fn new(capacity: usize) -> Self {
        debug_assert!(capacity.is_power_of_two());
        let chains = (0..capacity)
            .map(|_| Mutex::new(Vec::new()))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Table { chains }
    }

    fn chain_for(&self, hash: u64) -> &Mutex<Vec<CacheEntry<T>>> {
        &self.chains[spread(hash) as usize & (self.chains.len() - 1)]
    }
}

/// A concurrent weak hash-consing cache.
///
/// Readers (`get`, `intern`, `purge`) share the table; the only writer is
/// the resize, which replaces the table wholesale under the write lock.
/// Within a bucket, the chain mutex serializes lookups and insertions, so
/// two racing `intern` calls for identical candidates always agree on one
/// canonical instance.
pub struct WeakCache<T> {
    table: RwLock<Table<T>>,
    len: AtomicUsize,
}

impl<T: Identity> WeakCache<T> {
    /// Create a cache with the minimum capacity.
    pub fn new() -> Self {
        Self::with_capacity(MIN_CAPACITY)
    }

    /// Create a cache sized for roughly `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.next_power_of_two().max(MIN_CAPACITY);
        WeakCache {
            table: RwLock::new(Table::new(capacity)),
            len: AtomicUsize::new(0),
        }
    }

    /// Number of entries, including entries whose referent has been
    /// dropped but not yet reclaimed.
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Relaxed)
    }

    /// Whether the cache tracks no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current bucket count.
    pub fn capacity(&self) -> usize {
        self.table.read().chains.len()
    }

    /// The canonical live instance identical to `probe`, if any.
    pub fn get(&self, probe: &T) -> Option<Arc<T>> {
        let hash = probe.identity_hash();
        let table = self.table.read();
        let chain = table.chain_for(hash).lock();
        lookup(&chain, hash, probe)
    }

    /// Return the canonical instance for `candidate`: an existing live
    /// instance when one is identical, the candidate itself otherwise.
    pub fn intern(&self, candidate: T) -> Arc<T> {
        let hash = candidate.identity_hash();
        let canonical = {
            let table = self.table.read();
            let mut chain = table.chain_for(hash).lock();
            if let Some(existing) = lookup(&chain, hash, &candidate) {
                return existing;
            }
            // reclaim this chain's cleared entries before installing
            let before = chain.len();
            chain.retain(CacheEntry::is_live);
            let reclaimed = before - chain.len();
            if reclaimed > 0 {
                self.len.fetch_sub(reclaimed, Ordering::Relaxed);
                trace!("reclaimed {} cleared intern entries", reclaimed);
            }
            let canonical = Arc::new(candidate);
            chain.push(CacheEntry {
                hash,
                referent: Arc::downgrade(&canonical),
            });
            self.len.fetch_add(1, Ordering::Relaxed);
            canonical
        };
        self.resize_if_needed();
        canonical
    }

    /// Reclaim every entry whose referent has been dropped, shrinking the
    /// table when occupancy allows.
    pub fn purge(&self) {
        let mut reclaimed = 0;
        {
            let table = self.table.read();
            for chain in table.chains.iter() {
                let mut chain = chain.lock();
                let before = chain.len();
                chain.retain(CacheEntry::is_live);
                reclaimed += before - chain.len();
            }
        }
        if reclaimed > 0 {
            self.len.fetch_sub(reclaimed, Ordering::Relaxed);
            trace!("purged {} cleared intern entries", reclaimed);
        }
        self.resize_if_needed();
    }

    fn resize_if_needed(&self) {
        let len = self.len();
        let capacity = self.capacity();
        let grow = len * LOAD_FACTOR_DENOM > capacity * LOAD_FACTOR_NUM;
        let shrink = capacity > MIN_CAPACITY && len * SHRINK_DENOM < capacity;
        if !grow && !shrink {
            return;
        }
        let mut table = self.table.write();
        // recheck under the write lock; a racing resize may have run
        let capacity = table.chains.len();
        if capacity_for(self.len()) == capacity {
            return;
        }
        let mut live = Vec::new();
        for chain in table.chains.iter() {
            let mut chain = chain.lock();
            for entry in chain.drain(..) {
                if entry.is_live() {
                    live.push(entry);
                }
            }
        }
        let new_capacity = capacity_for(live.len());
        let new_table = Table::new(new_capacity);
        let count = live.len();
        for entry in live {
            new_table.chain_for(entry.hash).lock().push(entry);
        }
        debug!(
            "resized intern table {} -> {} buckets ({} live entries)",
            capacity, new_capacity, count
        );
        self.len.store(count, Ordering::Relaxed);
        *table = new_table;
    }
}

/// Walk a chain for a live identical referent.
fn lookup<T: Identity>(chain: &[CacheEntry<T>], hash: u64, probe: &T) -> Option<Arc<T>> {
    for entry in chain {
        if entry.hash != hash {
            continue;
        }
        if let Some(live) = entry.referent.upgrade() {
            if live.identical(probe) {
                return Some(live);
            }
        }
    }
    None
}

impl<T: Identity> Default for WeakCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for WeakCache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakCache")
            .field("len", &self.len.load(Ordering::Relaxed))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    use rand::seq::SliceRandom;
    use rand::thread_rng;

    #[derive(Debug, PartialEq)]
    struct Token(String);

    impl Identity for Token {
        fn identity_hash(&self) -> u64 {
            let mut h = std::collections::hash_map::DefaultHasher::new();
            std::hash::Hash::hash(&self.0, &mut h);
            std::hash::Hasher::finish(&h)
        }

        fn identical(&self, other: &Self) -> bool {
            self.0 == other.0
        }
    }

    fn token(text: &str) -> Token {
        Token(text.to_string())
    }

    #[test]
    fn intern_returns_one_canonical_instance() {
        let cache = WeakCache::new();
        let a = cache.intern(token("hello"));
        let b = cache.intern(token("hello"));
        let c = cache.intern(token("world"));
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(cache.len(), 2);
        assert!(Arc::ptr_eq(&a, &cache.get(&token("hello")).unwrap()));
        assert!(cache.get(&token("missing")).is_none());
    }

    #[test]
    fn dropped_referents_are_reclaimed_not_resurrected() {
        let cache = WeakCache::new();
        let kept = cache.intern(token("kept"));
        let dropped = cache.intern(token("dropped"));
        drop(dropped);
        assert!(cache.get(&token("dropped")).is_none());
        cache.purge();
        assert_eq!(cache.len(), 1);
        // a later intern installs a fresh canonical instance
        let fresh = cache.intern(token("dropped"));
        assert_eq!(fresh.0, "dropped");
        assert!(Arc::ptr_eq(&kept, &cache.intern(token("kept"))));
    }

    #[test]
    fn growth_and_shrink_preserve_reachable_entries() {
        let cache = WeakCache::new();
        let mut held = Vec::new();
        for i in 0..10_000 {
            held.push(cache.intern(token(&format!("value-{}", i))));
        }
        assert!(cache.capacity() > MIN_CAPACITY);
        assert_eq!(cache.len(), 10_000);
        for (i, kept) in held.iter().enumerate() {
            let again = cache.intern(token(&format!("value-{}", i)));
            assert!(Arc::ptr_eq(kept, &again));
        }

        held.truncate(10);
        cache.purge();
        assert_eq!(cache.len(), 10);
        assert!(cache.capacity() < 10_000);
        for (i, kept) in held.iter().enumerate() {
            let again = cache.intern(token(&format!("value-{}", i)));
            assert!(Arc::ptr_eq(kept, &again));
        }
    }

    #[test]
    fn concurrent_interns_agree_on_the_canonical_instance() {
        let cache = Arc::new(WeakCache::new());
        let candidates: Vec<String> = (0..2000).map(|i| format!("shared-{}", i)).collect();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = Arc::clone(&cache);
            let mut order = candidates.clone();
            handles.push(thread::spawn(move || {
                order.shuffle(&mut thread_rng());
                let mut seen = Vec::new();
                for text in order {
                    let canonical = cache.intern(Token(text.clone()));
                    seen.push((text, canonical));
                }
                seen
            }));
        }

        let mut canonical = std::collections::HashMap::new();
        for handle in handles {
            for (text, instance) in handle.join().unwrap() {
                let entry = canonical.entry(text).or_insert_with(|| Arc::clone(&instance));
                assert!(
                    Arc::ptr_eq(entry, &instance),
                    "two canonical instances coexisted"
                );
            }
        }
        assert_eq!(canonical.len(), 2000);
    }
}
