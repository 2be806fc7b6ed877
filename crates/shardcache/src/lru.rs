//! Single LRU shard: lock-striped map plus mutex-guarded recency list.
//!
//! The map and the list are coordinated loosely on purpose. A lookup copies
//! the value out under a short stripe read lock and only then tries to touch
//! the recency list; an insert installs the map entry first and links the
//! node after. The one hard rule is that a node is destroyed exactly once,
//! by whichever unlinker finds it linked under the list mutex.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::hash::{BuildHasher, Hash};
use std::ops::Deref;
use std::sync::atomic::{AtomicUsize, Ordering};

use ahash::RandomState;
use parking_lot::{Mutex, RwLock};

use crate::list::{NodeRef, RecencyList};
use crate::stats::CacheStats;

/// Lock stripes per shard. Power of two; stripe choice consumes the low
/// hash bits, leaving the high bits to the sharding layer.
const STRIPE_COUNT: usize = 16;

/// Map payload: the stored value plus the entry's recency-list position
struct Slot<V> {
    value: V,
    node: NodeRef,
}

/// Owned copy of a cached value returned by [`LruCache::find`].
///
/// The copy is independent of the cache: the handle stays valid and stable
/// across later cache operations and does not pin the entry it came from.
#[derive(Debug)]
pub struct ValueHandle<V> {
    value: V,
}

impl<V> ValueHandle<V> {
    /// Borrow the value
    pub fn get(&self) -> &V {
        &self.value
    }

    /// Unwrap the handle into the value
    pub fn into_inner(self) -> V {
        self.value
    }
}

impl<V> Deref for ValueHandle<V> {
    type Target = V;

    fn deref(&self) -> &V {
        &self.value
    }
}

/// Bounded concurrent LRU cache — a single shard.
///
/// Lookups run against lock-striped hash maps and never wait on the
/// recency list: the promotion to most-recently-used is attempted with a
/// `try_lock` and skipped under contention. Inserts evict the
/// least-recently-used entry once the configured capacity is reached.
///
/// Usable on its own; [`ShardedLruCache`](crate::ShardedLruCache) fans out
/// over several of these to cut list-mutex contention.
pub struct LruCache<K, V, S = RandomState> {
    stripes: Box<[RwLock<HashMap<K, Slot<V>, S>>]>,
    list: Mutex<RecencyList<K>>,
    /// Resident entries. Eventually consistent: concurrent inserts may
    /// drive it past `capacity` by at most the number of in-flight calls.
    size: AtomicUsize,
    capacity: usize,
    hasher: S,
    stats: CacheStats,
}

impl<K, V, S> LruCache<K, V, S>
where
    K: Hash + Eq + Clone,
    V: Clone,
    S: BuildHasher + Clone,
{
    /// Create a cache bounded to `capacity` entries
    pub fn new(capacity: usize) -> Self
    where
        S: Default,
    {
        Self::with_hasher(capacity, S::default())
    }

    /// Create a cache bounded to `capacity` entries with a caller-supplied
    /// hasher. Good eviction behavior needs pseudo-randomness in the low
    /// bits of the hash.
    pub fn with_hasher(capacity: usize, hasher: S) -> Self {
        assert!(capacity > 0, "Capacity must be greater than 0");

        let stripe_capacity = capacity / STRIPE_COUNT + 1;
        let stripes = (0..STRIPE_COUNT)
            .map(|_| RwLock::new(HashMap::with_capacity_and_hasher(stripe_capacity, hasher.clone())))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Self {
            stripes,
            list: Mutex::new(RecencyList::with_capacity(capacity)),
            size: AtomicUsize::new(0),
            capacity,
            hasher,
            stats: CacheStats::new(),
        }
    }

    /// Look up `key`, returning a copy of its value.
    ///
    /// Promotes the entry to most-recently-used when the list lock is
    /// uncontended; under contention the promotion is skipped entirely so
    /// reads never queue behind writers.
    pub fn find(&self, key: &K) -> Option<ValueHandle<V>> {
        let found = {
            let map = self.stripe(key).read();
            map.get(key).map(|slot| (slot.value.clone(), slot.node))
        };

        let (value, node) = match found {
            Some(found) => found,
            None => {
                self.stats.record_miss();
                return None;
            }
        };

        // Opportunistic recency update: drop it rather than wait.
        if let Some(mut list) = self.list.try_lock() {
            list.promote(node);
        }

        self.stats.record_hit();
        Some(ValueHandle { value })
    }

    /// Insert `key` with `value`, evicting the least-recently-used entry
    /// if the cache is full.
    ///
    /// Returns `false` without updating the stored value when the key is
    /// already present.
    pub fn insert(&self, key: K, value: V) -> bool {
        // The node carries its own key copy so eviction can find the map
        // entry after the slot is long out of reach.
        let node = self.list.lock().alloc(key.clone());

        let mut inserted = true;
        {
            let mut map = self.stripe(&key).write();
            match map.entry(key) {
                Entry::Occupied(_) => inserted = false,
                Entry::Vacant(entry) => {
                    entry.insert(Slot { value, node });
                }
            }
        }
        if !inserted {
            self.list.lock().release(node);
            return false;
        }

        // Evict ahead of the append when the shard is already full.
        let sampled = self.size.load(Ordering::Relaxed);
        let mut popped = false;
        if sampled >= self.capacity {
            self.pop_front();
            popped = true;
        }

        self.list.lock().push_back(node);

        let prev = if popped {
            sampled
        } else {
            self.size.fetch_add(1, Ordering::SeqCst)
        };

        // Concurrent inserts may all have sampled a pre-eviction count and
        // pushed the cache past capacity. Each insert runs at most one
        // corrective eviction, gated by a compare-and-swap so exactly one
        // caller accounts for each excess entry; a recovery loop here would
        // trade that bounded overshoot for unbounded insert latency.
        if prev > self.capacity
            && self
                .size
                .compare_exchange(prev, prev - 1, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
        {
            self.pop_front();
        }

        self.stats.record_insert();
        true
    }

    /// Remove `key`, returning the number of entries removed (0 or 1).
    ///
    /// When several erases race on one key, exactly one of them removes
    /// the map entry; only that call frees the node and decrements the
    /// resident count.
    pub fn erase(&self, key: &K) -> usize {
        // Read probe first so erases of absent keys never take the write
        // lock.
        {
            let map = self.stripe(key).read();
            if !map.contains_key(key) {
                return 0;
            }
        }

        let slot = match self.stripe(key).write().remove(key) {
            Some(slot) => slot,
            None => return 0,
        };

        {
            let mut list = self.list.lock();
            // The node may already be destroyed (an eviction raced) or not
            // yet linked (its insert is still in flight); either way it is
            // someone else's to free.
            list.remove(slot.node);
        }

        self.size.fetch_sub(1, Ordering::SeqCst);
        1
    }

    /// Evict the least-recently-used entry.
    ///
    /// Does not touch `size`; the caller owns the accounting.
    fn pop_front(&self) {
        let key = {
            let mut list = self.list.lock();
            match list.pop_front() {
                Some(key) => key,
                None => return,
            }
        };

        // An erase may have raced and already removed the key.
        if self.stripe(&key).write().remove(&key).is_some() {
            self.stats.record_eviction();
        }
    }

    /// Drop every entry. Not safe against concurrent operations.
    pub fn clear(&self) {
        for stripe in self.stripes.iter() {
            stripe.write().clear();
        }
        self.list.lock().clear();
        self.size.store(0, Ordering::SeqCst);
    }

    /// Resident entries. Eventually consistent under concurrent writes.
    pub fn len(&self) -> usize {
        self.size.load(Ordering::Relaxed)
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the cache capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get cache statistics
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    fn stripe(&self, key: &K) -> &RwLock<HashMap<K, Slot<V>, S>> {
        let hash = self.hasher.hash_one(key);
        &self.stripes[(hash as usize) & (STRIPE_COUNT - 1)]
    }
}
