//! `ConcurrentDenseMap` — a sharded composition of independent dense
//! Robin-Hood tables for concurrent readers and writers (spec §5).
//!
//! ## Design
//!
//! The table is split into [`crate::PARTITIONS`] fixed partitions, each an
//! independent [`partition::PartitionInner`] guarded by its own
//! `parking_lot::RwLock` and padded to its own cache line via
//! `crossbeam::utils::CachePadded` (spec §5.1: partitions must not
//! false-share). A key's partition is chosen from the top bits of its
//! hash; its home slot *within* that partition comes from an independent
//! remix of the same hash (spec §6.2), so the two derivations don't
//! degenerate into the same few bits.
//!
//! Every operation — read or write — takes the owning partition's lock:
//! `find`/`contains` take a read lock, `insert`/`erase` take a write lock.
//! This is a deliberate simplification from a lock-free atomic-metadata
//! design: per-partition locking is the same sharding discipline the
//! teacher uses for its concurrent indexes, is easy to reason about under
//! concurrent mutation, and bounds contention to the ~1/P of keys that
//! land in any one partition rather than serializing the whole map. See
//! DESIGN.md for the tradeoff this was weighed against.
//!
//! Partitions use tombstone-based deletion internally (spec §4.8) rather
//! than the single-threaded table's backward-shift, so an erase never has
//! to touch any bucket but the one it vacates.

mod partition;

#[cfg(test)]
mod tests;

use crossbeam::utils::CachePadded;
use parking_lot::RwLock;

use crate::hash::{hash_and_fingerprint, BuildFingerprint, AHashFingerprinter};
use partition::PartitionInner;

/// Sharded concurrent dense Robin-Hood hash map. See module docs.
pub struct ConcurrentDenseMap<K, V, S = AHashFingerprinter> {
    partitions: Vec<CachePadded<RwLock<PartitionInner<K, V>>>>,
    build: S,
}

impl<K: Eq, V> ConcurrentDenseMap<K, V, AHashFingerprinter>
where
    AHashFingerprinter: BuildFingerprint<K>,
{
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(n: usize) -> Self {
        Self::with_capacity_and_hasher(n, AHashFingerprinter::default())
    }
}

impl<K: Eq, V> Default for ConcurrentDenseMap<K, V, AHashFingerprinter>
where
    AHashFingerprinter: BuildFingerprint<K>,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq, V, S: BuildFingerprint<K>> ConcurrentDenseMap<K, V, S> {
    pub fn with_hasher(build: S) -> Self {
        Self::with_capacity_and_hasher(0, build)
    }

    pub fn with_capacity_and_hasher(n: usize, build: S) -> Self {
        Self::with_shards_and_hasher(crate::PARTITIONS, n, build)
    }

    /// Like [`ConcurrentDenseMap::with_hasher`], but with an explicit
    /// shard count instead of [`crate::PARTITIONS`] (spec.md recommends
    /// N=64 but does not mandate it). Rounded up to a power of two so
    /// routing can stay a shift rather than a modulo.
    pub fn with_shards(shards: usize, build: S) -> Self {
        Self::with_shards_and_hasher(shards, 0, build)
    }

    pub fn with_shards_and_hasher(shards: usize, n: usize, build: S) -> Self {
        let shards = shards.max(1).next_power_of_two();
        let per_partition = n / shards;
        let partitions = (0..shards)
            .map(|_| CachePadded::new(RwLock::new(PartitionInner::with_capacity(per_partition))))
            .collect();
        ConcurrentDenseMap { partitions, build }
    }

    #[inline]
    fn partition_for(&self, hash: u64) -> usize {
        let bits = self.partitions.len().trailing_zeros();
        if bits == 0 {
            0
        } else {
            (hash >> (u64::BITS - bits)) as usize
        }
    }

    /// Number of live entries across every partition. Takes a brief read
    /// lock on each partition in turn; under concurrent mutation this is a
    /// snapshot, not a linearizable total (spec §5.3 — approximate by
    /// design, see Non-goals).
    pub fn len(&self) -> usize {
        self.partitions.iter().map(|p| p.read().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total bucket capacity summed across partitions.
    pub fn capacity(&self) -> usize {
        self.partitions.iter().map(|p| p.read().capacity()).sum()
    }

    pub fn clear(&self) {
        for p in self.partitions.iter() {
            p.write().clear();
        }
    }

    pub fn insert(&self, key: K, value: V) -> bool {
        let (hash, _) = hash_and_fingerprint(&self.build, &key);
        let idx = self.partition_for(hash);
        self.partitions[idx].write().insert(&self.build, key, value)
    }

    pub fn erase(&self, key: &K) -> usize {
        let (hash, _) = hash_and_fingerprint(&self.build, key);
        let idx = self.partition_for(hash);
        self.partitions[idx].write().erase(&self.build, key)
    }

    pub fn contains(&self, key: &K) -> bool {
        let (hash, _) = hash_and_fingerprint(&self.build, key);
        let idx = self.partition_for(hash);
        self.partitions[idx].read().contains(&self.build, key)
    }

    /// Applies `f` to the value for `key` under that partition's read
    /// lock, returning `f`'s result. There's no `find(&self, key) ->
    /// Option<&V>` because the returned reference would outlive the lock
    /// guard; callers that need to inspect-then-release use this instead
    /// (spec §6.2's `find` adapted for shared-table access — see
    /// SPEC_FULL.md §5 Open Question).
    pub fn find_with<R>(&self, key: &K, f: impl FnOnce(Option<&V>) -> R) -> R {
        let (hash, _) = hash_and_fingerprint(&self.build, key);
        let idx = self.partition_for(hash);
        let guard = self.partitions[idx].read();
        f(guard.find(&self.build, key))
    }

    /// Clone of the value for `key`, if present. Convenience wrapper
    /// around [`ConcurrentDenseMap::find_with`] for the common case.
    pub fn find(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        self.find_with(key, |v| v.cloned())
    }

    /// Snapshot iterator over every `(key, value)` pair, cloned out from
    /// under each partition's read lock in turn. Not a consistent
    /// point-in-time view of the whole map under concurrent mutation (spec
    /// §5.3 Non-goals) — entries inserted or erased mid-iteration by
    /// another thread may or may not appear.
    pub fn iter(&self) -> ConcurrentIter<K, V>
    where
        K: Clone,
        V: Clone,
    {
        let mut out = Vec::with_capacity(self.len());
        for p in self.partitions.iter() {
            let guard = p.read();
            out.extend(guard.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        ConcurrentIter {
            inner: out.into_iter(),
        }
    }

    /// Reserves up front, then precomputes `(partition, hash, fingerprint)`
    /// for every key in parallel via Rayon before dispatching each
    /// insertion to its owning partition's lock (spec §4.7 generalized to
    /// the sharded variant). Observable behavior is identical to
    /// one-by-one insertion.
    #[cfg(feature = "parallel")]
    pub fn batch_insert<I: IntoIterator<Item = (K, V)>>(&self, items: I)
    where
        K: Sync + Send,
        V: Send,
        S: Sync,
    {
        use rayon::prelude::*;
        let items: Vec<(K, V)> = items.into_iter().collect();
        let routed: Vec<usize> = items
            .par_iter()
            .map(|(k, _)| {
                let (hash, _) = hash_and_fingerprint(&self.build, k);
                self.partition_for(hash)
            })
            .collect();
        for ((k, v), idx) in items.into_iter().zip(routed) {
            self.partitions[idx].write().insert(&self.build, k, v);
        }
    }

    #[cfg(not(feature = "parallel"))]
    pub fn batch_insert<I: IntoIterator<Item = (K, V)>>(&self, items: I) {
        for (k, v) in items {
            self.insert(k, v);
        }
    }
}

impl<K: std::fmt::Debug, V: std::fmt::Debug, S> std::fmt::Debug for ConcurrentDenseMap<K, V, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConcurrentDenseMap")
            .field("partitions", &self.partitions.len())
            .field("len", &self.len())
            .finish()
    }
}

/// Owned snapshot iterator returned by [`ConcurrentDenseMap::iter`].
pub struct ConcurrentIter<K, V> {
    inner: std::vec::IntoIter<(K, V)>,
}

impl<K, V> Iterator for ConcurrentIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}
