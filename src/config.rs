//! Configuration for distritree
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{DistriError, Result};

/// Minimum tree order that still allows a meaningful split
pub const MIN_TREE_ORDER: usize = 3;

/// Main configuration for a distritree instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Index Configuration
    // -------------------------------------------------------------------------
    /// B+Tree order (maximum children per internal node).
    /// A node holds at most `tree_order - 1` keys.
    pub tree_order: usize,

    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Number of storage partitions records are routed across
    pub partition_count: usize,

    /// Optional directory for durable file-backed partitions.
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── partition_0.jsonl
    ///     ├── partition_1.jsonl
    ///     └── ...
    /// When unset, partitions are purely in-memory.
    pub data_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tree_order: 4,
            partition_count: 3,
            data_dir: None,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Validate the configuration
    ///
    /// - `tree_order` must be at least 3 (orders below that cannot split)
    /// - `partition_count` must be at least 1
    pub fn validate(&self) -> Result<()> {
        if self.tree_order < MIN_TREE_ORDER {
            return Err(DistriError::Config(format!(
                "tree_order must be at least {}, got {}",
                MIN_TREE_ORDER, self.tree_order
            )));
        }
        if self.partition_count < 1 {
            return Err(DistriError::Config(
                "partition_count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the B+Tree order (branching factor)
    pub fn tree_order(mut self, order: usize) -> Self {
        self.config.tree_order = order;
        self
    }

    /// Set the number of storage partitions
    pub fn partition_count(mut self, count: usize) -> Self {
        self.config.partition_count = count;
        self
    }

    /// Set the data directory, switching partitions to file-backed storage
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = Some(path.into());
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
