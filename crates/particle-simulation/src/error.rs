//! Error types for snapshot persistence

use std::io;
use thiserror::Error;

/// Why a snapshot could not be saved or restored
///
/// None of these are fatal: the engine logs them and keeps animating.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// No record in the storage slot
    #[error("no snapshot stored")]
    Missing,

    /// Record is older than the freshness window
    #[error("snapshot is stale ({age_ms} ms old, limit {limit_ms} ms)")]
    Stale { age_ms: u64, limit_ms: u64 },

    /// Record could not be encoded or decoded
    #[error("malformed snapshot: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Storage could not be read or written
    #[error("snapshot storage unavailable: {0}")]
    Unavailable(#[from] io::Error),
}
