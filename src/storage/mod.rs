//! Storage Module
//!
//! Partitioned record storage behind a deterministic key router.
//!
//! ## Responsibilities
//! - Route each key to exactly one partition
//! - Store records under generated record identifiers
//! - Point/batch fetch by location pointer
//! - Brute-force scans used as the unindexed baseline
//!
//! ## Structure
//! - [`Partition`]: one addressable storage unit (in-memory or file-backed)
//! - [`StorageRouter`]: owns the partition set and the routing function

mod partition;
mod router;

pub use partition::{FilePartition, MemoryPartition, Partition};
pub use router::{PointScan, RangeScan, StorageRouter};

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of one storage partition (index into the router's partition set)
pub type PartitionId = u32;

/// Identifier of one stored record, unique across all partitions
pub type RecordId = u64;

/// A record key: an orderable scalar, integer in the common case with a
/// text fallback. The derived `Ord` gives a total order (all integer keys
/// sort before all text keys).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Key {
    Int(i64),
    Text(String),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Int(i) => write!(f, "{}", i),
            Key::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for Key {
    fn from(v: i64) -> Self {
        Key::Int(v)
    }
}

impl From<&str> for Key {
    fn from(v: &str) -> Self {
        Key::Text(v.to_string())
    }
}

impl From<String> for Key {
    fn from(v: String) -> Self {
        Key::Text(v)
    }
}

/// Indirection stored in the index instead of the record payload.
/// Opaque to the index; only the router can dereference it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocationPointer {
    pub partition_id: PartitionId,
    pub record_id: RecordId,
}

/// A stored record, owned by its partition after a successful store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Generated identifier, unique across partitions
    pub record_id: RecordId,

    /// The key the record was stored under
    pub key: Key,

    /// Opaque payload
    pub value: Vec<u8>,

    /// Unix timestamp (millis) at store time
    pub inserted_at: u64,
}

/// Display name for a partition, used in scan traces
pub fn partition_name(id: PartitionId) -> String {
    format!("partition_{}", id)
}
