//! `densehash` — a dense, cache-friendly Robin-Hood hash map.
//!
//! Two variants share the same probing discipline and split metadata/entry
//! layout:
//!
//! - [`table::DenseMap`] — single-threaded, optimized for iteration speed
//!   and memory density. Iteration order is arbitrary and not stable
//!   across mutation.
//! - [`concurrent::ConcurrentDenseMap`] — a sharded composition of
//!   partitions, each an independent dense table, for many concurrent
//!   readers and writers.
//!
//! Neither variant persists state, supports ordered range queries, or
//! promises index/reference stability across mutation — see DESIGN.md for
//! the full non-goal list.

pub mod bucket;
pub mod concurrent;
pub mod entry;
pub mod error;
pub mod hash;
pub mod table;

pub use concurrent::ConcurrentDenseMap;
pub use error::DenseMapError;
pub use table::DenseMap;

/// Initial bucket capacity for a table constructed with no size hint.
pub const INITIAL_CAPACITY: usize = 16;

/// Load factor bound, expressed as a numerator/denominator pair so callers
/// can compare against it with integer arithmetic (`size * MAX_LOAD_DEN >
/// capacity * MAX_LOAD_NUM` rather than floating point).
pub const MAX_LOAD_NUM: usize = 3;
pub const MAX_LOAD_DEN: usize = 4;

/// Recommended partition count for the concurrent variant.
pub const PARTITIONS: usize = 64;
