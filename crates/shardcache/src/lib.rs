//! # shardcache
//!
//! Bounded, sharded, concurrent LRU cache for in-process lookup
//! acceleration — short-lived keyed records, point lookups at high
//! concurrency, hard cap on resident entries.
//!
//! ## Architecture
//! - **Map**: lock-striped AHash maps per shard for O(1) point access
//! - **Recency list**: slab-backed doubly-linked list per shard, mutex
//!   guarded, for O(1) promotion and eviction
//! - **Sharding**: the high 16 bits of the key hash route each key to one
//!   independent shard; eviction is per shard
//!
//! Reads stay fast under write pressure: a lookup copies its value out
//! under a short read lock and promotes the entry to most-recently-used
//! only if the list mutex happens to be free. Concurrent inserts may push
//! a shard briefly past its capacity; each insert then runs at most one
//! corrective eviction, so the overshoot stays bounded by the number of
//! in-flight inserts and drains as soon as traffic pauses.

#![warn(missing_docs)]

mod cache;
mod list;
mod lru;
mod stats;

pub use cache::ShardedLruCache;
pub use lru::{LruCache, ValueHandle};
pub use stats::{CacheStats, StatsSnapshot};
