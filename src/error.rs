//! Error taxonomy for `densehash` (spec §7).
//!
//! Duplicate insert and missing erase targets are normal returns, not
//! errors (spec §7) — they surface as `bool`/`usize` return values on the
//! happy-path APIs, not through this enum.

use thiserror::Error;

/// Errors surfaced by fallible `densehash` operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DenseMapError {
    /// `at(k)` (the `Index` impl) was called on a key the table does not
    /// contain.
    #[error("key not found")]
    KeyNotFound,

    /// A probe exceeded `MAX_DISTANCE` and the table could not grow further
    /// to recover (capacity already at the addressable limit for a 46-bit
    /// entry index).
    #[error("probe distance exceeded MAX_DISTANCE and capacity cannot grow further")]
    CapacityExhausted,

    /// Resize or entry-store growth could not allocate the requested
    /// capacity. The table is left in its pre-operation state (strong
    /// exception safety, spec §7).
    #[error("allocation failed while growing table to capacity {requested}")]
    AllocationFailure { requested: usize },
}
