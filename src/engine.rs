//! Engine Module
//!
//! Query orchestrator tying the index to partitioned storage.
//!
//! ## Responsibilities
//! - Insert: store the payload, then index the returned location pointer
//! - Optimized reads: index search followed by targeted fetches
//! - Unoptimized reads: brute-force partition scans (the baseline)
//! - Wall-clock cost measurement around every query path
//!
//! ## Concurrency Model
//! Single-threaded: the engine exclusively owns one index and one router,
//! and mutation requires `&mut self`. No locks, no interleaving. A
//! multi-threaded deployment would wrap the whole engine in one mutex.

use std::collections::BTreeMap;
use std::time::Instant;

use crate::config::Config;
use crate::error::{DistriError, Result};
use crate::index::{BPlusTree, TreeSnapshot};
use crate::storage::{
    FilePartition, Key, LocationPointer, MemoryPartition, Partition, PartitionId, Record,
    RecordId, StorageRouter,
};

/// Label for the query path that produced an outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMethod {
    /// Index search plus targeted fetches
    BTree,

    /// Brute-force scan of every partition
    Scan,
}

/// Outcome of an insert
#[derive(Debug, Clone)]
pub struct InsertOutcome {
    /// Where the record landed
    pub pointer: LocationPointer,

    /// Wall-clock cost in milliseconds (informational only)
    pub elapsed_ms: f64,
}

/// Outcome of a point query, optimized or not
#[derive(Debug, Clone)]
pub struct PointQuery {
    /// The record and its location, if found
    pub result: Option<(LocationPointer, Record)>,

    /// Human-readable steps taken, in order
    pub trace: Vec<String>,

    /// Partition names visited (scan path; empty or singleton for the
    /// index path, which touches at most one partition)
    pub visited: Vec<String>,

    pub method: QueryMethod,

    /// Wall-clock cost in milliseconds (informational only)
    pub elapsed_ms: f64,
}

/// Outcome of a range query, optimized or not
#[derive(Debug, Clone)]
pub struct RangeQuery {
    /// Matching records, ascending by key
    pub results: Vec<(Key, Record)>,

    pub trace: Vec<String>,

    /// Partition names touched
    pub visited: Vec<String>,

    pub method: QueryMethod,

    /// Wall-clock cost in milliseconds (informational only)
    pub elapsed_ms: f64,
}

/// The query orchestrator
///
/// Owns the B+Tree index and the storage router. The index holds location
/// pointers, never payloads; the router is the only component that
/// dereferences them.
pub struct Engine {
    config: Config,
    index: BPlusTree,
    router: StorageRouter,
}

impl Engine {
    /// Build an engine from a validated config
    ///
    /// Memory partitions by default; file-backed partitions when
    /// `data_dir` is set (the directory is created if missing).
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let mut partitions: Vec<Box<dyn Partition>> = Vec::with_capacity(config.partition_count);
        match &config.data_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                for id in 0..config.partition_count as PartitionId {
                    let file = format!("partition_{}.jsonl", id);
                    partitions.push(Box::new(FilePartition::open(id, dir.join(file))?));
                }
            }
            None => {
                for id in 0..config.partition_count as PartitionId {
                    partitions.push(Box::new(MemoryPartition::new(id)));
                }
            }
        }

        let router = StorageRouter::new(partitions)?;
        let index = BPlusTree::new(config.tree_order)?;

        tracing::info!(
            order = config.tree_order,
            partitions = config.partition_count,
            durable = config.data_dir.is_some(),
            "engine initialized"
        );

        Ok(Self {
            config,
            index,
            router,
        })
    }

    /// Insert a key/value record
    ///
    /// The duplicate check runs against the index before anything touches
    /// storage, and the index is only mutated after the store succeeds: a
    /// failed store leaves the index untouched, a duplicate key leaves
    /// storage untouched.
    pub fn insert(&mut self, key: Key, value: Vec<u8>) -> Result<InsertOutcome> {
        let started = Instant::now();

        if self.index.contains(&key) {
            return Err(DistriError::DuplicateKey(key));
        }

        let pointer = self.router.store(key.clone(), value)?;
        self.index.insert(key, pointer)?;

        Ok(InsertOutcome {
            pointer,
            elapsed_ms: elapsed_ms(started),
        })
    }

    /// Optimized point query: index search, then one targeted fetch
    pub fn search(&self, key: &Key) -> Result<PointQuery> {
        let started = Instant::now();

        let (pointer, mut trace) = self.index.search(key);
        let mut visited = Vec::new();
        let result = match pointer {
            Some(ptr) => {
                let name = self.router.partition_name(ptr.partition_id)?.to_string();
                trace.push(format!("fetch {} (record {})", name, ptr.record_id));
                visited.push(name);
                self.router
                    .fetch(ptr.partition_id, ptr.record_id)?
                    .map(|record| (ptr, record))
            }
            None => {
                trace.push("not found".to_string());
                None
            }
        };

        Ok(PointQuery {
            result,
            trace,
            visited,
            method: QueryMethod::BTree,
            elapsed_ms: elapsed_ms(started),
        })
    }

    /// Unoptimized point query: scan partitions until the key turns up
    pub fn scan(&self, key: &Key) -> Result<PointQuery> {
        let started = Instant::now();
        let scan = self.router.scan_all(key)?;

        Ok(PointQuery {
            result: scan.result,
            trace: scan.trace,
            visited: scan.visited,
            method: QueryMethod::Scan,
            elapsed_ms: elapsed_ms(started),
        })
    }

    /// Optimized range query
    ///
    /// Index range search yields pointers; these are grouped by partition
    /// so exactly one batch fetch goes to each distinct partition touched.
    /// Batch order is unspecified, so results are re-sorted by key before
    /// returning.
    pub fn range_search(&self, start: &Key, end: &Key) -> Result<RangeQuery> {
        let started = Instant::now();

        let (entries, mut trace) = self.index.range_search(start, end)?;

        // Group record ids by home partition: one batch call per partition.
        let mut by_partition: BTreeMap<PartitionId, Vec<RecordId>> = BTreeMap::new();
        for (_, ptr) in &entries {
            by_partition
                .entry(ptr.partition_id)
                .or_default()
                .push(ptr.record_id);
        }

        let mut visited = Vec::new();
        let mut results = Vec::new();
        for (partition_id, record_ids) in &by_partition {
            let name = self.router.partition_name(*partition_id)?.to_string();
            trace.push(format!(
                "batch fetch {} ({} records)",
                name,
                record_ids.len()
            ));
            visited.push(name);
            for record in self.router.fetch_batch(*partition_id, record_ids)? {
                results.push((record.key.clone(), record));
            }
        }
        results.sort_by(|a, b| a.0.cmp(&b.0));

        tracing::debug!(
            %start, %end,
            matches = results.len(),
            partitions = visited.len(),
            "indexed range query"
        );

        Ok(RangeQuery {
            results,
            trace,
            visited,
            method: QueryMethod::BTree,
            elapsed_ms: elapsed_ms(started),
        })
    }

    /// Unoptimized range query: scan every partition, merge, sort
    pub fn scan_range(&self, start: &Key, end: &Key) -> Result<RangeQuery> {
        let started = Instant::now();
        let scan = self.router.scan_range(start, end)?;

        Ok(RangeQuery {
            results: scan
                .results
                .into_iter()
                .map(|(_, record)| (record.key.clone(), record))
                .collect(),
            trace: scan.trace,
            visited: scan.visited,
            method: QueryMethod::Scan,
            elapsed_ms: elapsed_ms(started),
        })
    }

    /// Read-only structural snapshot of the index
    pub fn tree_structure(&self) -> TreeSnapshot {
        self.index.snapshot()
    }

    /// Clear every partition and reset the index to an empty root
    pub fn reset(&mut self) -> Result<()> {
        self.router.clear_all()?;
        self.index.reset();
        Ok(())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Number of indexed entries
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// The configuration this engine was built from
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The underlying router (routing checks, record counts)
    pub fn router(&self) -> &StorageRouter {
        &self.router
    }

    /// The underlying index (depth, order)
    pub fn index(&self) -> &BPlusTree {
        &self.index
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}
