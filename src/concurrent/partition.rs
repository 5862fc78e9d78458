//! A single partition of a [`super::ConcurrentDenseMap`] — an independent
//! dense(ish) Robin-Hood table guarded by its owner's `parking_lot::RwLock`.
//!
//! Unlike [`crate::table::DenseMap`], a partition uses tombstone-based
//! deletion rather than backward-shift: erase marks the bucket `Tombstone`
//! and the entry slot `Removed` in place, in O(1), without touching any
//! other bucket. Compaction of dead slots happens only during a full
//! rebuild (growth, or an explicit `compact`), matching spec §4.8's
//! tradeoff of cheaper concurrent-friendly deletes for less dense packing
//! between rebuilds.

use crate::bucket::{Bucket, MAX_DISTANCE};
use crate::hash::{hash_and_fingerprint, remix, BuildFingerprint};
use crate::{INITIAL_CAPACITY, MAX_LOAD_DEN, MAX_LOAD_NUM};

/// An entry-store slot. `Removed` is the validity bit spec §4.8 calls for,
/// kept independent of the bucket's own `Tombstone` state — either one
/// alone is sufficient to mask a dead entry out of reads, which is the
/// point of carrying both under concurrent access patterns.
pub(super) enum Slot<K, V> {
    Occupied(K, V),
    Removed,
}

pub(super) struct PartitionInner<K, V> {
    buckets: Vec<Bucket>,
    entries: Vec<Slot<K, V>>,
    capacity: usize,
    len: usize,
    tombstones: usize,
}

impl<K, V> PartitionInner<K, V> {
    pub(super) fn with_capacity(n: usize) -> Self {
        let capacity = smallest_capacity_for(n);
        PartitionInner {
            buckets: vec![Bucket::EMPTY; capacity],
            entries: Vec::with_capacity(n),
            capacity,
            len: 0,
            tombstones: 0,
        }
    }

    pub(super) fn len(&self) -> usize {
        self.len
    }

    pub(super) fn capacity(&self) -> usize {
        self.capacity
    }

    pub(super) fn clear(&mut self) {
        for b in self.buckets.iter_mut() {
            *b = Bucket::EMPTY;
        }
        self.entries.clear();
        self.len = 0;
        self.tombstones = 0;
    }

    /// Intra-partition home slot, derived from an independent remix of the
    /// already-fingerprint-remixed hash rather than reusing the bits that
    /// selected this partition (spec §5.2/§6.2).
    fn home_for(&self, hash: u64) -> usize {
        (remix(hash) as usize) & (self.capacity - 1)
    }

    /// Lookup: unlike the tombstone-free table, a `Tombstone` bucket does
    /// *not* participate in the Robin-Hood early-termination check (its
    /// `distance` reflects whatever displaced it before removal, which is
    /// no longer meaningful) — the scan simply passes over it and keeps
    /// going. Only an `Empty` bucket ends the chain.
    fn find_slot_with(&self, key: &K, hash: u64, fp: u8) -> Option<(usize, usize)>
    where
        K: Eq,
    {
        let mask = self.capacity - 1;
        let mut pos = self.home_for(hash);
        let mut dist: u8 = 0;
        loop {
            let b = self.buckets[pos];
            if b.is_empty() {
                return None;
            }
            if b.is_occupied() {
                if b.fingerprint == fp {
                    if let Slot::Occupied(k2, _) = &self.entries[b.entry_index as usize] {
                        if k2 == key {
                            return Some((pos, b.entry_index as usize));
                        }
                    }
                }
                if b.distance < dist {
                    return None;
                }
            }
            dist = dist.saturating_add(1);
            pos = (pos + 1) & mask;
        }
    }

    pub(super) fn find<S: BuildFingerprint<K>>(&self, build: &S, key: &K) -> Option<&V>
    where
        K: Eq,
    {
        let (hash, fp) = hash_and_fingerprint(build, key);
        let (_, idx) = self.find_slot_with(key, hash, fp)?;
        match &self.entries[idx] {
            Slot::Occupied(_, v) => Some(v),
            Slot::Removed => None,
        }
    }

    pub(super) fn contains<S: BuildFingerprint<K>>(&self, build: &S, key: &K) -> bool
    where
        K: Eq,
    {
        self.find(build, key).is_some()
    }

    pub(super) fn insert<S: BuildFingerprint<K>>(&mut self, build: &S, key: K, value: V) -> bool
    where
        K: Eq,
    {
        let (hash, fp) = hash_and_fingerprint(build, &key);
        if self.find_slot_with(&key, hash, fp).is_some() {
            return false;
        }
        self.grow_if_needed(build);
        let idx = self.entries.len();
        self.entries.push(Slot::Occupied(key, value));
        self.len += 1;
        self.place_at(idx, hash, fp, build);
        true
    }

    pub(super) fn erase<S: BuildFingerprint<K>>(&mut self, build: &S, key: &K) -> usize
    where
        K: Eq,
    {
        let (hash, fp) = hash_and_fingerprint(build, key);
        let Some((pos, idx)) = self.find_slot_with(key, hash, fp) else {
            return 0;
        };
        let mut b = self.buckets[pos];
        b.state = crate::bucket::State::Tombstone;
        self.buckets[pos] = b;
        self.entries[idx] = Slot::Removed;
        self.len -= 1;
        self.tombstones += 1;
        1
    }

    fn place_at<S: BuildFingerprint<K>>(&mut self, idx: usize, hash: u64, fp: u8, build: &S)
    where
        K: Eq,
    {
        let home = self.home_for(hash);
        if try_place(&mut self.buckets, self.capacity, fp, home, idx as u64).is_ok() {
            return;
        }
        tracing::warn!(
            capacity = self.capacity,
            "partition probe distance approached MAX_DISTANCE; forcing rebuild"
        );
        // `rebuild_to` reinserts every live entry, `idx` included (already
        // pushed by the caller) — it has already placed `idx`, so a second
        // placement attempt here would create a duplicate bucket pointing
        // at the same entry_index.
        self.rebuild_to(Some(self.capacity * 2), build);
    }

    /// Grow (and compact away tombstones) if load factor — counting both
    /// live entries and tombstones, since both occupy bucket slots — would
    /// exceed the bound after one more insert.
    fn grow_if_needed<S: BuildFingerprint<K>>(&mut self, build: &S) {
        let projected = self.len + self.tombstones + 1;
        if projected * MAX_LOAD_DEN > self.capacity * MAX_LOAD_NUM {
            let target = smallest_capacity_for(self.len + 1);
            self.rebuild_to(Some(target.max(self.capacity * 2)), build);
        }
    }

    /// Full rebuild: compacts out every `Removed`/`Tombstone` slot and
    /// reinserts every live entry at (at least) `requested` capacity,
    /// retrying at double capacity on renewed probe saturation.
    fn rebuild_to<S: BuildFingerprint<K>>(&mut self, requested: Option<usize>, build: &S) {
        let mut capacity = requested
            .unwrap_or(self.capacity)
            .max(INITIAL_CAPACITY)
            .next_power_of_two();
        let live: Vec<(K, V)> = self
            .entries
            .drain(..)
            .filter_map(|s| match s {
                Slot::Occupied(k, v) => Some((k, v)),
                Slot::Removed => None,
            })
            .collect();
        // Hashes are computed once up front so a failed placement attempt
        // (probe saturation at this capacity) can retry at double capacity
        // without re-hashing or touching `live`'s ownership at all.
        let hashes: Vec<(u64, u8)> = live.iter().map(|(k, _)| hash_and_fingerprint(build, k)).collect();

        loop {
            let mut new_buckets = vec![Bucket::EMPTY; capacity];
            let mut ok = true;
            for (idx, (hash, fp)) in hashes.iter().enumerate() {
                let home = (remix(*hash) as usize) & (capacity - 1);
                if try_place(&mut new_buckets, capacity, *fp, home, idx as u64).is_err() {
                    ok = false;
                    break;
                }
            }
            if ok {
                self.buckets = new_buckets;
                self.entries = live.into_iter().map(|(k, v)| Slot::Occupied(k, v)).collect();
                self.capacity = capacity;
                self.tombstones = 0;
                return;
            }
            capacity *= 2;
        }
    }

    pub(super) fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter().filter_map(|s| match s {
            Slot::Occupied(k, v) => Some((k, v)),
            Slot::Removed => None,
        })
    }
}

fn smallest_capacity_for(n: usize) -> usize {
    let mut capacity = INITIAL_CAPACITY;
    while n * MAX_LOAD_DEN > capacity * MAX_LOAD_NUM {
        capacity *= 2;
    }
    capacity
}

fn try_place(buckets: &mut [Bucket], capacity: usize, fp: u8, home: usize, entry_index: u64) -> Result<(), ()> {
    let mask = capacity - 1;
    let mut carry = Bucket::occupied(fp, 0, entry_index);
    let mut pos = home;
    loop {
        let slot = buckets[pos];
        if slot.is_empty() || slot.is_tombstone() {
            buckets[pos] = carry;
            return Ok(());
        }
        if slot.distance < carry.distance {
            buckets[pos] = carry;
            carry = slot;
        }
        if carry.distance == MAX_DISTANCE {
            return Err(());
        }
        carry.distance += 1;
        pos = (pos + 1) & mask;
    }
}
