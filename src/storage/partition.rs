//! Partition implementations
//!
//! A partition is one addressable storage unit holding records under
//! generated record identifiers. Two implementations:
//! - [`MemoryPartition`]: plain in-memory map, the reference backend
//! - [`FilePartition`]: durable JSON-lines file, reloaded on open
//!
//! Both are single-owner: reads take `&self`, writes `&mut self`.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::{DistriError, Result};

use super::{partition_name, Key, PartitionId, Record, RecordId};

/// One addressable storage unit
///
/// Pluggable: the router only talks to this trait, so a durable backend
/// drops in without touching routing or the index.
pub trait Partition {
    /// Partition identifier (position in the router's partition set)
    fn id(&self) -> PartitionId;

    /// Display name used in scan traces
    fn name(&self) -> &str;

    /// Insert a record under its generated identifier
    fn insert(&mut self, record: Record) -> Result<()>;

    /// Point lookup by record identifier; absence is a normal outcome
    fn get(&self, record_id: RecordId) -> Result<Option<Record>>;

    /// Fetch multiple records in one logical call.
    /// Missing identifiers are skipped; result order is unspecified.
    fn get_batch(&self, record_ids: &[RecordId]) -> Result<Vec<Record>>;

    /// Linear search for a record by key (the unindexed path)
    fn find_by_key(&self, key: &Key) -> Result<Option<Record>>;

    /// Collect all records with `start <= key <= end` (unsorted)
    fn find_in_range(&self, start: &Key, end: &Key) -> Result<Vec<Record>>;

    /// Remove every record; idempotent
    fn clear(&mut self) -> Result<()>;

    /// Number of records held
    fn len(&self) -> usize;

    /// Largest record identifier held, if any.
    /// The router seeds its id counter from this so reopened durable
    /// partitions never hand out an identifier that is already taken.
    fn max_record_id(&self) -> Option<RecordId>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// =============================================================================
// In-Memory Partition
// =============================================================================

/// In-memory partition backed by a `HashMap`
#[derive(Debug)]
pub struct MemoryPartition {
    id: PartitionId,
    name: String,
    records: HashMap<RecordId, Record>,
}

impl MemoryPartition {
    /// Create an empty partition with the given identifier
    pub fn new(id: PartitionId) -> Self {
        Self {
            id,
            name: partition_name(id),
            records: HashMap::new(),
        }
    }
}

impl Partition for MemoryPartition {
    fn id(&self) -> PartitionId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn insert(&mut self, record: Record) -> Result<()> {
        self.records.insert(record.record_id, record);
        Ok(())
    }

    fn get(&self, record_id: RecordId) -> Result<Option<Record>> {
        Ok(self.records.get(&record_id).cloned())
    }

    fn get_batch(&self, record_ids: &[RecordId]) -> Result<Vec<Record>> {
        Ok(record_ids
            .iter()
            .filter_map(|id| self.records.get(id).cloned())
            .collect())
    }

    fn find_by_key(&self, key: &Key) -> Result<Option<Record>> {
        Ok(self.records.values().find(|r| &r.key == key).cloned())
    }

    fn find_in_range(&self, start: &Key, end: &Key) -> Result<Vec<Record>> {
        Ok(self
            .records
            .values()
            .filter(|r| &r.key >= start && &r.key <= end)
            .cloned()
            .collect())
    }

    fn clear(&mut self) -> Result<()> {
        self.records.clear();
        Ok(())
    }

    fn len(&self) -> usize {
        self.records.len()
    }

    fn max_record_id(&self) -> Option<RecordId> {
        self.records.keys().max().copied()
    }
}

// =============================================================================
// File-Backed Partition
// =============================================================================

/// Durable partition backed by a JSON-lines file
///
/// The file is the source of truth; an in-memory map mirrors it for reads.
/// Every insert appends one JSON line and flushes, so reopening the same
/// path reloads all previously stored records.
///
/// I/O failures surface as [`DistriError::PartitionUnavailable`], distinct
/// from a not-found result.
pub struct FilePartition {
    id: PartitionId,
    name: String,
    path: PathBuf,
    file: File,
    records: HashMap<RecordId, Record>,
}

impl FilePartition {
    /// Open or create a partition file, loading any existing records
    pub fn open(id: PartitionId, path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let name = partition_name(id);

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)
            .map_err(|e| unavailable(&name, &e.to_string()))?;

        let mut records = HashMap::new();
        let reader = BufReader::new(
            File::open(&path).map_err(|e| unavailable(&name, &e.to_string()))?,
        );
        for line in reader.lines() {
            let line = line.map_err(|e| unavailable(&name, &e.to_string()))?;
            if line.trim().is_empty() {
                continue;
            }
            let record: Record = serde_json::from_str(&line)
                .map_err(|e| DistriError::Serialization(e.to_string()))?;
            records.insert(record.record_id, record);
        }

        Ok(Self {
            id,
            name,
            path,
            file,
            records,
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn unavailable(name: &str, reason: &str) -> DistriError {
    DistriError::PartitionUnavailable {
        partition: name.to_string(),
        reason: reason.to_string(),
    }
}

impl Partition for FilePartition {
    fn id(&self) -> PartitionId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn insert(&mut self, record: Record) -> Result<()> {
        let line = serde_json::to_string(&record)
            .map_err(|e| DistriError::Serialization(e.to_string()))?;
        writeln!(self.file, "{}", line).map_err(|e| unavailable(&self.name, &e.to_string()))?;
        self.file
            .flush()
            .map_err(|e| unavailable(&self.name, &e.to_string()))?;
        self.records.insert(record.record_id, record);
        Ok(())
    }

    fn get(&self, record_id: RecordId) -> Result<Option<Record>> {
        Ok(self.records.get(&record_id).cloned())
    }

    fn get_batch(&self, record_ids: &[RecordId]) -> Result<Vec<Record>> {
        Ok(record_ids
            .iter()
            .filter_map(|id| self.records.get(id).cloned())
            .collect())
    }

    fn find_by_key(&self, key: &Key) -> Result<Option<Record>> {
        Ok(self.records.values().find(|r| &r.key == key).cloned())
    }

    fn find_in_range(&self, start: &Key, end: &Key) -> Result<Vec<Record>> {
        Ok(self
            .records
            .values()
            .filter(|r| &r.key >= start && &r.key <= end)
            .cloned()
            .collect())
    }

    fn clear(&mut self) -> Result<()> {
        self.file
            .set_len(0)
            .map_err(|e| unavailable(&self.name, &e.to_string()))?;
        self.file
            .seek(SeekFrom::Start(0))
            .map_err(|e| unavailable(&self.name, &e.to_string()))?;
        self.records.clear();
        Ok(())
    }

    fn len(&self) -> usize {
        self.records.len()
    }

    fn max_record_id(&self) -> Option<RecordId> {
        self.records.keys().max().copied()
    }
}
