//! Tree node definitions
//!
//! Nodes live in the tree's arena and refer to each other by [`NodeId`].

use crate::storage::{Key, LocationPointer};

/// Handle into the tree's node arena
pub type NodeId = usize;

/// A node in the B+Tree
#[derive(Debug)]
pub struct Node {
    /// Keys in strictly ascending order.
    /// Leaves: one pointer per key. Internals: one more child than keys.
    pub keys: Vec<Key>,

    pub kind: NodeKind,
}

/// Leaf/internal payload of a node
#[derive(Debug)]
pub enum NodeKind {
    /// Leaf holding the location pointers, chained to its right sibling
    Leaf {
        values: Vec<LocationPointer>,
        next: Option<NodeId>,
    },

    /// Internal node holding child handles around the separator keys
    Internal { children: Vec<NodeId> },
}

impl Node {
    /// Fresh empty leaf, not yet chained
    pub fn empty_leaf() -> Self {
        Self {
            keys: Vec::new(),
            kind: NodeKind::Leaf {
                values: Vec::new(),
                next: None,
            },
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf { .. })
    }

    /// One-line description used in traversal traces
    pub fn describe(&self) -> String {
        let keys = self
            .keys
            .iter()
            .map(|k| k.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        match self.kind {
            NodeKind::Leaf { .. } => format!("Leaf (keys: [{}])", keys),
            NodeKind::Internal { .. } => format!("Internal (keys: [{}])", keys),
        }
    }
}
