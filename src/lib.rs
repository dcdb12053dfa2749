//! # distritree
//!
//! Indexed vs. unindexed lookup over partitioned storage:
//! - In-memory B+Tree index holding location pointers, not payloads
//! - Deterministic key-to-partition routing across N storage partitions
//! - Optimized reads (index + targeted fetch) vs. brute-force scans
//! - Per-query latency cost and human-readable traversal traces
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Engine                               │
//! │              (query orchestration + timing)                  │
//! └──────────┬───────────────────────────────┬───────────────────┘
//!            │ optimized                     │ unoptimized
//!            ▼                               ▼
//!     ┌─────────────┐                ┌───────────────┐
//!     │  B+Tree     │  pointers      │ StorageRouter │
//!     │  (index)    │ ─────────────▶ │  (scan path)  │
//!     └─────────────┘                └───────┬───────┘
//!                                            │ route(key)
//!                          ┌─────────────────┼─────────────────┐
//!                          ▼                 ▼                 ▼
//!                   ┌────────────┐   ┌────────────┐   ┌────────────┐
//!                   │ partition_0│   │ partition_1│   │ partition_2│
//!                   └────────────┘   └────────────┘   └────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod index;
pub mod storage;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use config::Config;
pub use engine::{Engine, InsertOutcome, PointQuery, QueryMethod, RangeQuery};
pub use error::{DistriError, Result};
pub use index::{BPlusTree, TreeSnapshot};
pub use storage::{Key, LocationPointer, Record, StorageRouter};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of distritree
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
