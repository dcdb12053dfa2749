//! Storage Router
//!
//! Owns the partition set and assigns every key to exactly one partition.
//!
//! ## Responsibilities
//! - Deterministic key-to-partition routing
//! - Record construction and identifier generation
//! - Single and batched fetch by location pointer
//! - Brute-force scans across all partitions (the unindexed baseline)

use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{DistriError, Result};

use super::{Key, LocationPointer, Partition, PartitionId, Record, RecordId};

/// Outcome of a brute-force point scan across partitions
#[derive(Debug, Clone)]
pub struct PointScan {
    /// The matching record and its location, if any partition held the key
    pub result: Option<(LocationPointer, Record)>,

    /// Names of partitions visited, in visit order
    pub visited: Vec<String>,

    /// Human-readable step-by-step scan description
    pub trace: Vec<String>,
}

/// Outcome of a brute-force range scan across partitions
#[derive(Debug, Clone)]
pub struct RangeScan {
    /// Matching records merged across partitions, ascending by key
    pub results: Vec<(LocationPointer, Record)>,

    /// Names of partitions visited (always all of them)
    pub visited: Vec<String>,

    /// Human-readable step-by-step scan description
    pub trace: Vec<String>,
}

/// Routes keys to partitions and mediates all record access
pub struct StorageRouter {
    /// The partition set, indexed by `PartitionId`
    partitions: Vec<Box<dyn Partition>>,

    /// Next record identifier. Single mutator, so a plain counter keeps
    /// identifiers collision-free.
    next_record_id: RecordId,
}

impl StorageRouter {
    /// Create a router over the given partitions
    ///
    /// Partition `i` in the vector must report id `i`; the routing function
    /// produces indices into this vector.
    pub fn new(partitions: Vec<Box<dyn Partition>>) -> Result<Self> {
        if partitions.is_empty() {
            return Err(DistriError::Config(
                "router requires at least one partition".to_string(),
            ));
        }
        for (i, p) in partitions.iter().enumerate() {
            if p.id() as usize != i {
                return Err(DistriError::Config(format!(
                    "partition at index {} reports id {}",
                    i,
                    p.id()
                )));
            }
        }
        // Resume id generation past anything a durable partition reloaded.
        let next_record_id = partitions
            .iter()
            .filter_map(|p| p.max_record_id())
            .max()
            .map_or(1, |max| max + 1);

        Ok(Self {
            partitions,
            next_record_id,
        })
    }

    /// Deterministic key-to-partition routing
    ///
    /// Pure function of the key and the partition count: integer keys use
    /// `key mod N` (euclidean, so negative keys stay in range), text keys a
    /// stable CRC32 of the text. The same key always routes to the same
    /// partition.
    pub fn route(&self, key: &Key) -> PartitionId {
        let n = self.partitions.len() as u32;
        match key {
            Key::Int(i) => i.rem_euclid(n as i64) as PartitionId,
            Key::Text(s) => crc32fast::hash(s.as_bytes()) % n,
        }
    }

    /// Store a value under a key, returning where it landed
    ///
    /// Generates a fresh record identifier, builds the record, and writes it
    /// to the routed partition. Identifiers are generated, never reused, so
    /// a store can never silently overwrite another record.
    pub fn store(&mut self, key: Key, value: Vec<u8>) -> Result<LocationPointer> {
        let partition_id = self.route(&key);
        let record_id = self.next_record_id;
        self.next_record_id += 1;

        let record = Record {
            record_id,
            key,
            value,
            inserted_at: unix_millis(),
        };

        self.partitions[partition_id as usize].insert(record)?;
        tracing::debug!(partition_id, record_id, "stored record");

        Ok(LocationPointer {
            partition_id,
            record_id,
        })
    }

    /// Point lookup within one partition; `Ok(None)` when absent
    pub fn fetch(&self, partition_id: PartitionId, record_id: RecordId) -> Result<Option<Record>> {
        self.partition(partition_id)?.get(record_id)
    }

    /// Fetch multiple records from one partition in a single logical call
    ///
    /// Exists so a caller holding pointers spanning several partitions can
    /// group them and issue one call per distinct partition instead of one
    /// per record. Result order is unspecified; re-sort if order matters.
    pub fn fetch_batch(
        &self,
        partition_id: PartitionId,
        record_ids: &[RecordId],
    ) -> Result<Vec<Record>> {
        self.partition(partition_id)?.get_batch(record_ids)
    }

    /// Brute-force point lookup: visit partitions in order until a match
    ///
    /// Behaves as if the key's location were unknown; partitions before the
    /// match are always visited, partitions after it never are.
    pub fn scan_all(&self, key: &Key) -> Result<PointScan> {
        let mut visited = Vec::new();
        let mut trace = Vec::new();
        let mut result = None;

        for partition in &self.partitions {
            trace.push(format!("scanning {}", partition.name()));
            visited.push(partition.name().to_string());

            if let Some(record) = partition.find_by_key(key)? {
                trace.push(format!("found in {}", partition.name()));
                let pointer = LocationPointer {
                    partition_id: partition.id(),
                    record_id: record.record_id,
                };
                result = Some((pointer, record));
                break;
            }
        }

        tracing::debug!(%key, visited = visited.len(), found = result.is_some(), "point scan");
        Ok(PointScan {
            result,
            visited,
            trace,
        })
    }

    /// Brute-force range lookup: visit every partition, merge and sort
    ///
    /// No short-circuit, since matches may exist in any partition. Output is
    /// ascending by key across all partitions.
    pub fn scan_range(&self, start: &Key, end: &Key) -> Result<RangeScan> {
        if start > end {
            return Err(DistriError::InvalidRange {
                start: start.clone(),
                end: end.clone(),
            });
        }

        let mut visited = Vec::new();
        let mut trace = Vec::new();
        let mut results = Vec::new();

        for partition in &self.partitions {
            trace.push(format!("scanning {}", partition.name()));
            visited.push(partition.name().to_string());

            for record in partition.find_in_range(start, end)? {
                let pointer = LocationPointer {
                    partition_id: partition.id(),
                    record_id: record.record_id,
                };
                results.push((pointer, record));
            }
        }

        results.sort_by(|a, b| a.1.key.cmp(&b.1.key));

        tracing::debug!(%start, %end, matches = results.len(), "range scan");
        Ok(RangeScan {
            results,
            visited,
            trace,
        })
    }

    /// Empty every partition; safe to call repeatedly
    pub fn clear_all(&mut self) -> Result<()> {
        for partition in &mut self.partitions {
            partition.clear()?;
        }
        tracing::info!("cleared all partitions");
        Ok(())
    }

    /// Number of partitions owned by this router
    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }

    /// Total records across all partitions
    pub fn total_records(&self) -> usize {
        self.partitions.iter().map(|p| p.len()).sum()
    }

    /// Display name of a partition
    pub fn partition_name(&self, partition_id: PartitionId) -> Result<&str> {
        Ok(self.partition(partition_id)?.name())
    }

    fn partition(&self, partition_id: PartitionId) -> Result<&dyn Partition> {
        self.partitions
            .get(partition_id as usize)
            .map(|p| p.as_ref())
            .ok_or(DistriError::UnknownPartition(partition_id))
    }
}

/// Current unix timestamp in milliseconds
fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
