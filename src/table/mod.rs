//! `DenseMap` — the single-threaded dense Robin-Hood hash table.
//!
//! ## Design Invariants
//!
//! - The entry store is always dense: `entries.len()` *is* the table's size
//!   (there is no separate counter to drift out of sync with it).
//! - Metadata never carries a tombstone in this variant — erase uses
//!   backward-shift deletion, so only `Empty`/`Occupied` ever appear here.
//!   (The concurrent variant in [`crate::concurrent`] does use tombstones;
//!   see its module docs.)
//! - A probe walk terminates on the first `Empty` bucket. Robin-Hood
//!   ordering (bucket `distance` non-decreasing along a probe path) lets
//!   lookup additionally terminate early the moment it meets a bucket
//!   whose own distance is smaller than the query's current probe
//!   distance — such a bucket could never have been displaced past the
//!   query's home slot, so the key cannot live further down the chain.
//!
//! ## Resize
//!
//! A resize is a full rebuild: allocate fresh `Empty` metadata at the
//! target capacity and reinsert every live entry via the ordinary
//! Robin-Hood placement path (spec §4.5). This is also how probe-length
//! saturation recovers (§4.1/§4.3): if placement can't find a slot within
//! `MAX_DISTANCE`, the whole metadata array is rebuilt one capacity-doubling
//! larger and placement is retried for every entry from scratch.

#[cfg(test)]
mod tests;

use std::hash::Hash;

use crate::bucket::{Bucket, ENTRY_INDEX_BITS, MAX_DISTANCE};
use crate::entry::EntryStore;
use crate::error::DenseMapError;
use crate::hash::{hash_and_fingerprint, BuildFingerprint, AHashFingerprinter};
use crate::{INITIAL_CAPACITY, MAX_LOAD_NUM, MAX_LOAD_DEN};

/// Largest capacity a 46-bit `entry_index` can address (spec §3, §7
/// `CapacityExhausted`). Growth past this point cannot be represented by
/// the bucket metadata word regardless of how much memory is available.
const MAX_ADDRESSABLE_CAPACITY: usize = 1usize << ENTRY_INDEX_BITS;

/// Dense, single-threaded Robin-Hood hash map. See module docs.
///
/// `S` defaults to [`AHashFingerprinter`] (spec §6.1: raw-image hashing
/// for integer keys, content hashing for `String`/`str`/byte-sequence
/// keys). Custom key types should go through
/// [`DenseMap::with_hasher`]/[`DenseMap::with_capacity_and_hasher`] with
/// [`crate::hash::GenericFingerprinter`] instead.
pub struct DenseMap<K, V, S = AHashFingerprinter> {
    buckets: Vec<Bucket>,
    entries: EntryStore<K, V>,
    capacity: usize,
    build: S,
}

impl<K: Eq, V> DenseMap<K, V, AHashFingerprinter>
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

impl<K: Eq, V> Default for DenseMap<K, V, AHashFingerprinter>
where
    AHashFingerprinter: BuildFingerprint<K>,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq, V, S: BuildFingerprint<K>> DenseMap<K, V, S> {
    pub fn with_hasher(build: S) -> Self {
        Self::with_capacity_and_hasher(0, build)
    }

    pub fn with_capacity_and_hasher(n: usize, build: S) -> Self {
        let capacity = smallest_capacity_for(n);
        DenseMap {
            buckets: vec![Bucket::EMPTY; capacity],
            entries: EntryStore::with_capacity(n),
            capacity,
            build,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        for b in self.buckets.iter_mut() {
            *b = Bucket::EMPTY;
        }
        self.entries.clear();
    }

    /// Ensure `additional` more insertions can happen without a resize.
    pub fn reserve(&mut self, additional: usize) {
        let needed = self.entries.len() + additional;
        if needed * MAX_LOAD_DEN > self.capacity * MAX_LOAD_NUM {
            let target = smallest_capacity_for(needed);
            self.rebuild_to(target);
        }
    }

    /// Fallible counterpart to [`DenseMap::reserve`] (spec §7): instead of
    /// panicking or aborting, reports `CapacityExhausted` if satisfying
    /// `additional` would require growing past the 46-bit addressable
    /// entry-index limit, or `AllocationFailure` if the backing `Vec`
    /// allocation itself fails. Leaves the table in its pre-call state on
    /// either error (spec §7 strong exception safety).
    pub fn try_reserve(&mut self, additional: usize) -> Result<(), DenseMapError> {
        let needed = self.entries.len() + additional;
        if needed * MAX_LOAD_DEN <= self.capacity * MAX_LOAD_NUM {
            return Ok(());
        }
        let target = smallest_capacity_for(needed);
        if target > MAX_ADDRESSABLE_CAPACITY {
            return Err(DenseMapError::CapacityExhausted);
        }
        self.try_rebuild_to(target)
    }

    /// Fallible counterpart to `rebuild_to`, used only by `try_reserve`.
    /// The ordinary insert/resize path uses the infallible `rebuild_to`
    /// below, which assumes allocation succeeds (as the rest of this
    /// corpus's `Vec`-backed stores do); this variant exists solely to
    /// give `try_reserve` something to surface as a `Result`.
    fn try_rebuild_to(&mut self, requested: usize) -> Result<(), DenseMapError> {
        let mut capacity = requested.max(INITIAL_CAPACITY).next_power_of_two();
        loop {
            if capacity > MAX_ADDRESSABLE_CAPACITY {
                return Err(DenseMapError::CapacityExhausted);
            }
            let mut new_buckets: Vec<Bucket> = Vec::new();
            if new_buckets.try_reserve_exact(capacity).is_err() {
                return Err(DenseMapError::AllocationFailure { requested: capacity });
            }
            new_buckets.resize(capacity, Bucket::EMPTY);
            let mut ok = true;
            for idx in 0..self.entries.len() {
                let (hash, fp) = {
                    let (key, _) = self.entries.get(idx);
                    hash_and_fingerprint(&self.build, key)
                };
                let home = (hash as usize) & (capacity - 1);
                if try_place(&mut new_buckets, capacity, fp, home, idx as u64).is_err() {
                    ok = false;
                    break;
                }
            }
            if ok {
                tracing::trace!(
                    old_capacity = self.capacity,
                    new_capacity = capacity,
                    len = self.entries.len(),
                    "table resized via try_reserve"
                );
                self.buckets = new_buckets;
                self.capacity = capacity;
                return Ok(());
            }
            capacity *= 2;
        }
    }

    /// Shrink metadata to the smallest capacity that keeps load factor
    /// within bound for the current entry count. Never below
    /// `INITIAL_CAPACITY`. (Supplemental operation — spec §4.5 only
    /// describes growth; see SPEC_FULL.md §10.)
    pub fn shrink_to_fit(&mut self) {
        let target = smallest_capacity_for(self.entries.len());
        if target < self.capacity {
            self.rebuild_to(target);
        }
    }

    fn find_slot_with(&self, key: &K, hash: u64, fp: u8) -> Option<(usize, usize)> {
        let mask = self.capacity - 1;
        let mut pos = (hash as usize) & mask;
        let mut dist: u8 = 0;
        loop {
            let b = self.buckets[pos];
            if b.is_empty() {
                return None;
            }
            if b.is_occupied() {
                if b.fingerprint == fp {
                    let (k2, _) = self.entries.get(b.entry_index as usize);
                    if k2 == key {
                        return Some((pos, b.entry_index as usize));
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

    fn find_slot(&self, key: &K) -> Option<(usize, usize)> {
        let (hash, fp) = hash_and_fingerprint(&self.build, key);
        self.find_slot_with(key, hash, fp)
    }

    pub fn find(&self, key: &K) -> Option<&V> {
        self.find_slot(key).map(|(_, idx)| &self.entries.get(idx).1)
    }

    pub fn find_mut(&mut self, key: &K) -> Option<&mut V> {
        let idx = self.find_slot(key).map(|(_, idx)| idx)?;
        Some(&mut self.entries.get_mut(idx).1)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.find_slot(key).is_some()
    }

    pub fn count(&self, key: &K) -> usize {
        self.contains(key) as usize
    }

    /// Fallible counterpart to the `Index` impl (spec §6.2 `at`).
    pub fn at(&self, key: &K) -> Result<&V, DenseMapError> {
        self.find(key).ok_or(DenseMapError::KeyNotFound)
    }

    /// Default-construct `V` on miss and return a mutable reference to it
    /// (spec §6.2 `index(k)`). Named distinctly from `at`/`Index` because
    /// Rust's `Index` trait cannot return `&mut` or mutate on a shared
    /// reference.
    pub fn get_or_insert_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        let (idx, _) = self.try_emplace(key, V::default);
        &mut self.entries.get_mut(idx).1
    }

    fn insert_with_hash(&mut self, key: K, value: V, hash: u64, fp: u8) -> (usize, bool) {
        if let Some((_, existing_idx)) = self.find_slot_with(&key, hash, fp) {
            return (existing_idx, false);
        }
        self.reserve(1);
        let idx = self.entries.push((key, value));
        self.place_at(idx, hash, fp);
        (idx, true)
    }

    pub fn insert(&mut self, key: K, value: V) -> (usize, bool) {
        let (hash, fp) = hash_and_fingerprint(&self.build, &key);
        self.insert_with_hash(key, value, hash, fp)
    }

    /// Always constructs `value` via `f`, even if `key` already exists (the
    /// constructed value is simply discarded in that case). Use
    /// [`DenseMap::try_emplace`] to avoid constructing on a duplicate.
    pub fn emplace<F: FnOnce() -> V>(&mut self, key: K, f: F) -> (usize, bool) {
        self.insert(key, f())
    }

    /// Constructs `value` via `f` only if `key` is absent.
    pub fn try_emplace<F: FnOnce() -> V>(&mut self, key: K, f: F) -> (usize, bool) {
        let (hash, fp) = hash_and_fingerprint(&self.build, &key);
        if let Some((_, existing_idx)) = self.find_slot_with(&key, hash, fp) {
            return (existing_idx, false);
        }
        self.reserve(1);
        let value = f();
        let idx = self.entries.push((key, value));
        self.place_at(idx, hash, fp);
        (idx, true)
    }

    /// Removes `key`. Returns 1 if a matching entry was removed, 0 if
    /// absent (spec §6.2 — not an error, a normal return, per §7).
    pub fn erase(&mut self, key: &K) -> usize {
        let Some((pos, entry_idx)) = self.find_slot(key) else {
            return 0;
        };
        let (_, moved) = self.entries.swap_remove(entry_idx);
        if let Some(old_last_idx) = moved {
            let fixup_pos = self
                .buckets
                .iter()
                .position(|b| b.is_occupied() && b.entry_index as usize == old_last_idx)
                .expect("dense invariant: every live entry is referenced by exactly one bucket");
            self.buckets[fixup_pos].entry_index = entry_idx as u64;

            // ProviderInconsistency check (spec §7, debug builds only): the
            // entry that just moved into `entry_idx` must still hash to the
            // bucket now claiming it. A mismatch here means the hash
            // provider returned different hashes for an equal key between
            // the original insert and this compaction.
            #[cfg(debug_assertions)]
            {
                let (key, _) = self.entries.get(entry_idx);
                let (hash, fp) = hash_and_fingerprint(&self.build, key);
                debug_assert_eq!(
                    self.find_slot_with(key, hash, fp).map(|(p, _)| p),
                    Some(fixup_pos),
                    "provider inconsistency: moved entry's hash no longer matches the bucket pointing at it"
                );
            }
        }
        self.backward_shift_from(pos);
        1
    }

    /// Backward-shift deletion (spec §4.4): walk forward from `pos` while
    /// the next bucket is occupied with nonzero distance, pulling it back
    /// one slot and decrementing its distance; stop and clear at the first
    /// `Empty` or distance-zero bucket. Leaves no tombstone behind.
    fn backward_shift_from(&mut self, mut pos: usize) {
        let mask = self.capacity - 1;
        loop {
            let next = (pos + 1) & mask;
            let next_bucket = self.buckets[next];
            if !next_bucket.is_occupied() || next_bucket.distance == 0 {
                self.buckets[pos] = Bucket::EMPTY;
                return;
            }
            let mut shifted = next_bucket;
            shifted.distance -= 1;
            self.buckets[pos] = shifted;
            pos = next;
        }
    }

    fn place_at(&mut self, idx: usize, hash: u64, fp: u8) {
        let home = (hash as usize) & (self.capacity - 1);
        if try_place(&mut self.buckets, self.capacity, fp, home, idx as u64).is_ok() {
            return;
        }
        tracing::warn!(
            capacity = self.capacity,
            "probe distance approached MAX_DISTANCE during insert; forcing rehash"
        );
        // `rebuild_to` reinserts every live entry in `entries`, `idx`
        // included (it was already pushed by the caller) — it has already
        // placed `idx` into the rebuilt metadata, so there is nothing left
        // to do here. Retrying placement after this would create a second
        // OCCUPIED bucket pointing at the same entry_index.
        self.rebuild_to(self.capacity * 2);
    }

    /// Full metadata rebuild at (at least) `requested` capacity, retrying
    /// at double capacity if probe saturation recurs (spec §4.1, §4.5).
    fn rebuild_to(&mut self, requested: usize) {
        let mut capacity = requested.max(INITIAL_CAPACITY).next_power_of_two();
        loop {
            let mut new_buckets = vec![Bucket::EMPTY; capacity];
            let mut ok = true;
            for idx in 0..self.entries.len() {
                let (hash, fp) = {
                    let (key, _) = self.entries.get(idx);
                    hash_and_fingerprint(&self.build, key)
                };
                let home = (hash as usize) & (capacity - 1);
                if try_place(&mut new_buckets, capacity, fp, home, idx as u64).is_err() {
                    ok = false;
                    break;
                }
            }
            if ok {
                tracing::trace!(
                    old_capacity = self.capacity,
                    new_capacity = capacity,
                    len = self.entries.len(),
                    "table resized"
                );
                self.buckets = new_buckets;
                self.capacity = capacity;

                // ProviderInconsistency check (spec §7, debug builds only):
                // every entry must still be findable by its own key right
                // after reinsertion into the rebuilt metadata.
                #[cfg(debug_assertions)]
                for idx in 0..self.entries.len() {
                    let (key, _) = self.entries.get(idx);
                    let (hash, fp) = hash_and_fingerprint(&self.build, key);
                    debug_assert_eq!(
                        self.find_slot_with(key, hash, fp).map(|(_, e)| e),
                        Some(idx),
                        "provider inconsistency: entry lost during resize reinsertion"
                    );
                }
                return;
            }
            capacity *= 2;
        }
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.entries.iter(),
        }
    }

    pub fn batch_find<'a, I>(&'a self, keys: I) -> Vec<Option<&'a V>>
    where
        I: IntoIterator<Item = &'a K>,
    {
        keys.into_iter().map(|k| self.find(k)).collect()
    }

    pub fn batch_contains<'a, I>(&self, keys: I) -> Vec<bool>
    where
        I: IntoIterator<Item = &'a K>,
        K: 'a,
    {
        keys.into_iter().map(|k| self.contains(k)).collect()
    }

    #[cfg(not(feature = "parallel"))]
    pub fn batch_insert<I: IntoIterator<Item = (K, V)>>(&mut self, items: I) {
        let iter = items.into_iter();
        let (lower, _) = iter.size_hint();
        self.reserve(lower);
        for (k, v) in iter {
            self.insert(k, v);
        }
    }

    /// Reserves up front, then precomputes `(hash, fingerprint)` for every
    /// key in parallel via Rayon before inserting sequentially — the
    /// "vectorized pass" spec §4.7 describes for integer-keyed batches,
    /// generalized to any `K: Sync`. Observable behavior is identical to
    /// one-by-one insertion (spec §4.7).
    #[cfg(feature = "parallel")]
    pub fn batch_insert<I: IntoIterator<Item = (K, V)>>(&mut self, items: I)
    where
        K: Sync,
        S: Sync,
    {
        use rayon::prelude::*;
        let items: Vec<(K, V)> = items.into_iter().collect();
        self.reserve(items.len());
        let hashes: Vec<(u64, u8)> = items
            .par_iter()
            .map(|(k, _)| hash_and_fingerprint(&self.build, k))
            .collect();
        for ((k, v), (hash, fp)) in items.into_iter().zip(hashes) {
            self.insert_with_hash(k, v, hash, fp);
        }
    }
}

impl<K: Eq, V, S: BuildFingerprint<K>> std::ops::Index<&K> for DenseMap<K, V, S> {
    type Output = V;

    fn index(&self, key: &K) -> &V {
        self.find(key)
            .expect("DenseMap::index: key not found (see DenseMapError::KeyNotFound)")
    }
}

impl<K: Eq + Hash, V, S: BuildFingerprint<K>> Extend<(K, V)> for DenseMap<K, V, S> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        let (lower, _) = iter.size_hint();
        self.reserve(lower);
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K: Eq + Hash, V, S: BuildFingerprint<K> + Default> FromIterator<(K, V)> for DenseMap<K, V, S> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = DenseMap::with_capacity_and_hasher(0, S::default());
        map.extend(iter);
        map
    }
}

impl<K: std::fmt::Debug, V: std::fmt::Debug, S> std::fmt::Debug for DenseMap<K, V, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DenseMap")
            .field("len", &self.entries.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

/// Smallest power-of-two capacity, at least `INITIAL_CAPACITY`, such that
/// `n` entries keep load factor within `MAX_LOAD_FACTOR`.
fn smallest_capacity_for(n: usize) -> usize {
    let mut capacity = INITIAL_CAPACITY;
    while n * MAX_LOAD_DEN > capacity * MAX_LOAD_NUM {
        capacity *= 2;
    }
    capacity
}

/// Robin-Hood placement of a single (fingerprint, entry_index) pair,
/// starting at `home`. Returns `Err(())` if probe distance would exceed
/// `MAX_DISTANCE` without finding an empty slot — the caller is expected to
/// grow capacity and retry (spec §4.1, §4.3).
fn try_place(buckets: &mut [Bucket], capacity: usize, fp: u8, home: usize, entry_index: u64) -> Result<(), ()> {
    let mask = capacity - 1;
    let mut carry = Bucket::occupied(fp, 0, entry_index);
    let mut pos = home;
    loop {
        let slot = buckets[pos];
        if slot.is_empty() {
            buckets[pos] = carry;
            return Ok(());
        }
        debug_assert!(
            !slot.is_tombstone(),
            "single-threaded table must never carry a tombstone (backward-shift deletion)"
        );
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

pub struct Iter<'a, K, V> {
    inner: std::slice::Iter<'a, (K, V)>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (k, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

pub struct IntoIter<K, V> {
    inner: std::vec::IntoIter<(K, V)>,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V, S> IntoIterator for DenseMap<K, V, S> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            inner: self.entries.into_iter(),
        }
    }
}

impl<'a, K, V, S> IntoIterator for &'a DenseMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
