//! Hash/Fingerprint Provider — the capability the table consumes to turn a
//! key into a `(hash, fingerprint)` pair. The table itself is agnostic to
//! how these are produced; see spec §6.1.

use std::hash::{BuildHasher, Hash, Hasher};

use ahash::RandomState;

/// Capability yielding a 64-bit hash for a key. The 8-bit fingerprint is
/// always derived centrally from that hash by [`fingerprint_for`], never
/// by the provider itself — that's where the zero-fingerprint remix rule
/// (spec §4.1) lives, regardless of which provider is in use.
pub trait BuildFingerprint<K: ?Sized> {
    fn hash_of(&self, key: &K) -> u64;
}

/// A strong 64-bit mixer (xor-shift-multiply chain, in the vein of
/// splitmix64/murmur's finalizer) used to remix a hash whose low byte is
/// zero, per spec §4.1. Also reused standalone to derive the
/// intra-partition home slot in [`crate::concurrent`] from a hash that
/// already determined a partition id, so the two derivations aren't simply
/// "the same number with bits masked off".
#[inline]
pub fn remix(mut x: u64) -> u64 {
    x ^= x >> 33;
    x = x.wrapping_mul(0xff51afd7ed558ccd);
    x ^= x >> 33;
    x = x.wrapping_mul(0xc4ceb9fe1a85ec53);
    x ^= x >> 33;
    x
}

/// Derive `(hash, fingerprint)` from a raw hash, applying the zero-
/// fingerprint remix rule from spec §4.1: fingerprint is the low byte of
/// `hash`; if that byte is zero, `hash` is remixed and the fingerprint is
/// recomputed from the remixed value.
#[inline]
pub fn fingerprint_for(hash: u64) -> (u64, u8) {
    let fp = (hash & 0xff) as u8;
    if fp == 0 {
        let remixed = remix(hash);
        (remixed, (remixed & 0xff) as u8)
    } else {
        (hash, fp)
    }
}

/// Compute `(hash, fingerprint)` for `key` under provider `S`, applying the
/// zero-fingerprint remix. This is the entry point [`crate::table`] and
/// [`crate::concurrent`] call; they never touch `BuildFingerprint` or
/// `fingerprint_for` directly.
#[inline]
pub fn hash_and_fingerprint<K: ?Sized, S: BuildFingerprint<K>>(build: &S, key: &K) -> (u64, u8) {
    fingerprint_for(build.hash_of(key))
}

/// Default fingerprint provider (spec §6.1).
///
/// - Trivially-copyable integer key types hash by raw byte image — no
///   mixing at all; avalanche is injected only lazily, by the central
///   remix-on-zero-fingerprint step, not on every call.
/// - Byte-sequence and `String`/`str` keys are content-hashed through a
///   per-instance-seeded `ahash` mixer instead (spec §6.1: "String-like
///   keys MUST use content hashing").
///
/// Custom key types need a provider of their own — see
/// [`GenericFingerprinter`] for a generic `K: Hash` fallback.
#[derive(Clone)]
pub struct AHashFingerprinter {
    content_state: RandomState,
}

impl Default for AHashFingerprinter {
    fn default() -> Self {
        AHashFingerprinter {
            content_state: RandomState::new(),
        }
    }
}

impl AHashFingerprinter {
    #[inline]
    fn content_hash(&self, bytes: &[u8]) -> u64 {
        let mut hasher = self.content_state.build_hasher();
        bytes.hash(&mut hasher);
        hasher.finish()
    }
}

macro_rules! impl_default_fingerprinter_raw_image {
    ($($t:ty),* $(,)?) => {
        $(
            impl BuildFingerprint<$t> for AHashFingerprinter {
                #[inline]
                fn hash_of(&self, key: &$t) -> u64 {
                    *key as u64
                }
            }
        )*
    };
}

impl_default_fingerprinter_raw_image!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl BuildFingerprint<String> for AHashFingerprinter {
    #[inline]
    fn hash_of(&self, key: &String) -> u64 {
        self.content_hash(key.as_bytes())
    }
}

impl BuildFingerprint<str> for AHashFingerprinter {
    #[inline]
    fn hash_of(&self, key: &str) -> u64 {
        self.content_hash(key.as_bytes())
    }
}

impl BuildFingerprint<&str> for AHashFingerprinter {
    #[inline]
    fn hash_of(&self, key: &&str) -> u64 {
        self.content_hash(key.as_bytes())
    }
}

impl BuildFingerprint<[u8]> for AHashFingerprinter {
    #[inline]
    fn hash_of(&self, key: &[u8]) -> u64 {
        self.content_hash(key)
    }
}

impl BuildFingerprint<Vec<u8>> for AHashFingerprinter {
    #[inline]
    fn hash_of(&self, key: &Vec<u8>) -> u64 {
        self.content_hash(key.as_slice())
    }
}

/// Generic provider for arbitrary `K: Hash` key types (structs, tuples,
/// enums) that [`AHashFingerprinter`] has no concrete impl for. Content
/// hashing runs through a per-table-seeded `ahash::AHasher`; seeding per
/// instance (rather than sharing one global hasher state) avoids
/// correlated worst-case probe sequences across independently constructed
/// tables fed attacker-controlled keys.
#[derive(Clone)]
pub struct GenericFingerprinter {
    state: RandomState,
}

impl Default for GenericFingerprinter {
    fn default() -> Self {
        GenericFingerprinter {
            state: RandomState::new(),
        }
    }
}

impl<K: Hash + ?Sized> BuildFingerprint<K> for GenericFingerprinter {
    #[inline]
    fn hash_of(&self, key: &K) -> u64 {
        let mut hasher = self.state.build_hasher();
        key.hash(&mut hasher);
        hasher.finish()
    }
}
