//! Sharded front over independent LRU shards.

use std::hash::{BuildHasher, Hash};
use std::thread;

use ahash::RandomState;

use crate::lru::{LruCache, ValueHandle};
use crate::stats::StatsSnapshot;

/// Concurrent LRU cache split into independent shards by key hash.
///
/// Each shard owns its own map stripes, recency list and resident counter;
/// shards share no state and never synchronise with each other. Eviction is
/// therefore per shard, not global: the cache-wide bound is the sum of the
/// shard bounds.
///
/// Shard choice uses the high 16 bits of the key hash while the shards'
/// internal map stripes use the low bits, so a key's shard and its bucket
/// within the shard stay uncorrelated.
pub struct ShardedLruCache<K, V, S = RandomState> {
    shards: Box<[LruCache<K, V, S>]>,
    hasher: S,
    capacity: usize,
}

impl<K, V, S> ShardedLruCache<K, V, S>
where
    K: Hash + Eq + Clone,
    V: Clone,
    S: BuildHasher + Clone,
{
    /// Create a cache bounded to `capacity` entries with one shard per
    /// available hardware thread.
    pub fn new(capacity: usize) -> Self
    where
        S: Default,
    {
        let shard_count = thread::available_parallelism()
            .map(|threads| threads.get())
            .unwrap_or(1);
        Self::with_shards(capacity, shard_count)
    }

    /// Create a cache bounded to `capacity` entries spread over
    /// `shard_count` shards.
    pub fn with_shards(capacity: usize, shard_count: usize) -> Self
    where
        S: Default,
    {
        Self::with_shards_and_hasher(capacity, shard_count, S::default())
    }

    /// Create a cache with a caller-supplied hasher.
    ///
    /// The shard count is clamped so every shard holds at least one entry;
    /// shard capacities always sum to `capacity`, with shard 0 taking the
    /// division remainder.
    pub fn with_shards_and_hasher(capacity: usize, shard_count: usize, hasher: S) -> Self {
        assert!(capacity > 0, "Capacity must be greater than 0");

        let shard_count = shard_count.clamp(1, capacity);
        let base = capacity / shard_count;
        let remainder = capacity % shard_count;

        let shards = (0..shard_count)
            .map(|index| {
                let shard_capacity = if index == 0 { base + remainder } else { base };
                LruCache::with_hasher(shard_capacity, hasher.clone())
            })
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Self {
            shards,
            hasher,
            capacity,
        }
    }

    /// Look up `key`, returning a copy of its value.
    ///
    /// May promote the entry to most-recently-used within its shard; the
    /// promotion is skipped when the shard's list lock is contended.
    pub fn find(&self, key: &K) -> Option<ValueHandle<V>> {
        self.shard(key).find(key)
    }

    /// Insert `key` with `value` into its shard, evicting that shard's
    /// least-recently-used entry if the shard is full.
    ///
    /// Returns `false` without updating the stored value when the key is
    /// already present.
    pub fn insert(&self, key: K, value: V) -> bool {
        self.shard(&key).insert(key, value)
    }

    /// Remove `key`, returning the number of entries removed (0 or 1).
    pub fn erase(&self, key: &K) -> usize {
        self.shard(key).erase(key)
    }

    /// Drop every entry in every shard.
    ///
    /// Requires unique access: not safe against concurrent operations.
    pub fn clear(&mut self) {
        for shard in self.shards.iter() {
            shard.clear();
        }
    }

    /// Total resident entries, summed shard by shard.
    ///
    /// The sum is not taken atomically; it is exact only at quiescence.
    pub fn size(&self) -> usize {
        self.shards.iter().map(|shard| shard.len()).sum()
    }

    /// Resident entries in one shard, or 0 for an out-of-range index
    pub fn size_of_shard(&self, index: usize) -> usize {
        self.shards.get(index).map_or(0, |shard| shard.len())
    }

    /// Total capacity across all shards
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Capacity of one shard, or 0 for an out-of-range index
    pub fn capacity_of_shard(&self, index: usize) -> usize {
        self.shards.get(index).map_or(0, |shard| shard.capacity())
    }

    /// Number of shards
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Cache-wide statistics, summed over all shards
    pub fn stats(&self) -> StatsSnapshot {
        let mut total = StatsSnapshot::default();
        for shard in self.shards.iter() {
            let snap = shard.stats().snapshot();
            total.hits += snap.hits;
            total.misses += snap.misses;
            total.evictions += snap.evictions;
            total.inserts += snap.inserts;
        }
        total
    }

    fn shard(&self, key: &K) -> &LruCache<K, V, S> {
        // High bits pick the shard; the map stripes inside each shard hash
        // with the low bits.
        const SHIFT: u32 = u64::BITS - 16;

        let hash = self.hasher.hash_one(key);
        let index = ((hash >> SHIFT) as usize) % self.shards.len();
        &self.shards[index]
    }
}
