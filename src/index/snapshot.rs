//! Structural tree snapshot
//!
//! Read-only nested view of the tree, consumed by presentation layers.
//! Stable shape: `{keys, values, type, children}` per node.

use serde::Serialize;

use crate::storage::{Key, LocationPointer};

/// Node kind as rendered in a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NodeType {
    Leaf,
    Internal,
}

/// One node of the snapshot tree
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeSnapshot {
    /// Keys of the node, ascending
    pub keys: Vec<Key>,

    /// Location pointers (leaves only; empty for internal nodes)
    pub values: Vec<LocationPointer>,

    #[serde(rename = "type")]
    pub node_type: NodeType,

    /// Child snapshots (internal nodes only; empty for leaves)
    pub children: Vec<TreeSnapshot>,
}
