//! B+Tree implementation
//!
//! Values live only at leaves; leaves form a singly linked chain in
//! ascending key order for sequential range scans. Insertion recurses from
//! the root and propagates splits upward as `(separator, new sibling)`
//! results, so no node ever needs a parent pointer.

use crate::error::{DistriError, Result};
use crate::storage::{Key, LocationPointer};

use super::node::{Node, NodeId, NodeKind};
use super::snapshot::{NodeType, TreeSnapshot};

/// In-memory B+Tree keyed by record key, valued by location pointer
pub struct BPlusTree {
    /// Node arena; handles are indices. Nodes are only ever added (splits)
    /// or dropped wholesale (reset); there is no delete operation.
    nodes: Vec<Node>,

    root: NodeId,

    /// Maximum children per internal node; a node holds at most
    /// `order - 1` keys once splits have settled.
    order: usize,

    /// Number of entries stored
    len: usize,
}

impl BPlusTree {
    /// Create an empty tree with the given order (minimum 3)
    pub fn new(order: usize) -> Result<Self> {
        if order < crate::config::MIN_TREE_ORDER {
            return Err(DistriError::Config(format!(
                "tree order must be at least {}, got {}",
                crate::config::MIN_TREE_ORDER,
                order
            )));
        }
        Ok(Self {
            nodes: vec![Node::empty_leaf()],
            root: 0,
            order,
            len: 0,
        })
    }

    pub fn order(&self) -> usize {
        self.order
    }

    /// Number of entries in the tree
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Height of the tree: number of levels from root to leaf
    pub fn depth(&self) -> usize {
        let mut depth = 1;
        let mut node = &self.nodes[self.root];
        while let NodeKind::Internal { children } = &node.kind {
            node = &self.nodes[children[0]];
            depth += 1;
        }
        depth
    }

    // =========================================================================
    // Insertion
    // =========================================================================

    /// Insert a key and its location pointer
    ///
    /// Fails with [`DistriError::DuplicateKey`] if the key is already
    /// present; the tree is unchanged in that case. If the root splits, a
    /// new root with one separator is created, the only way depth grows.
    pub fn insert(&mut self, key: Key, pointer: LocationPointer) -> Result<()> {
        tracing::debug!(%key, "index insert");
        if let Some((separator, right)) = self.insert_recursive(self.root, key, pointer)? {
            let old_root = self.root;
            self.root = self.alloc(Node {
                keys: vec![separator],
                kind: NodeKind::Internal {
                    children: vec![old_root, right],
                },
            });
        }
        self.len += 1;
        Ok(())
    }

    /// Recursive descent; returns `Some((separator, new sibling))` when this
    /// level split and the parent must absorb the promotion.
    fn insert_recursive(
        &mut self,
        node_id: NodeId,
        key: Key,
        pointer: LocationPointer,
    ) -> Result<Option<(Key, NodeId)>> {
        if self.nodes[node_id].is_leaf() {
            let node = &mut self.nodes[node_id];
            let idx = match node.keys.binary_search(&key) {
                Ok(_) => return Err(DistriError::DuplicateKey(key)),
                Err(idx) => idx,
            };
            node.keys.insert(idx, key);
            if let NodeKind::Leaf { values, .. } = &mut node.kind {
                values.insert(idx, pointer);
            }

            if node.keys.len() > self.order - 1 {
                return Ok(Some(self.split_leaf(node_id)));
            }
            return Ok(None);
        }

        let child_idx = child_index(&self.nodes[node_id].keys, &key);
        let child_id = match &self.nodes[node_id].kind {
            NodeKind::Internal { children } => children[child_idx],
            NodeKind::Leaf { .. } => unreachable!("leaf handled above"),
        };

        if let Some((separator, right)) = self.insert_recursive(child_id, key, pointer)? {
            let node = &mut self.nodes[node_id];
            node.keys.insert(child_idx, separator);
            if let NodeKind::Internal { children } = &mut node.kind {
                children.insert(child_idx + 1, right);
            }

            if node.keys.len() > self.order - 1 {
                return Ok(Some(self.split_internal(node_id)));
            }
        }
        Ok(None)
    }

    /// Split an overfull leaf at `mid = order / 2`
    ///
    /// The right sibling takes entries `[mid..]`; its first key is copied
    /// (not removed) up as the separator. The sibling is spliced into the
    /// leaf chain in the same step.
    fn split_leaf(&mut self, node_id: NodeId) -> (Key, NodeId) {
        let mid = self.order / 2;

        let (right_keys, right_values, old_next) = {
            let node = &mut self.nodes[node_id];
            let right_keys = node.keys.split_off(mid);
            match &mut node.kind {
                NodeKind::Leaf { values, next } => (right_keys, values.split_off(mid), *next),
                NodeKind::Internal { .. } => unreachable!("split_leaf on internal node"),
            }
        };

        let separator = right_keys[0].clone();
        let right_id = self.alloc(Node {
            keys: right_keys,
            kind: NodeKind::Leaf {
                values: right_values,
                next: old_next,
            },
        });

        if let NodeKind::Leaf { next, .. } = &mut self.nodes[node_id].kind {
            *next = Some(right_id);
        }

        (separator, right_id)
    }

    /// Split an overfull internal node at `mid = order / 2`
    ///
    /// The separator at `mid` is removed and pushed up; keys `[mid+1..]`
    /// and children `[mid+1..]` move to the right sibling.
    fn split_internal(&mut self, node_id: NodeId) -> (Key, NodeId) {
        let mid = self.order / 2;

        let (separator, right_keys, right_children) = {
            let node = &mut self.nodes[node_id];
            let separator = node.keys.remove(mid);
            let right_keys = node.keys.split_off(mid);
            match &mut node.kind {
                NodeKind::Internal { children } => {
                    (separator, right_keys, children.split_off(mid + 1))
                }
                NodeKind::Leaf { .. } => unreachable!("split_internal on leaf"),
            }
        };

        let right_id = self.alloc(Node {
            keys: right_keys,
            kind: NodeKind::Internal {
                children: right_children,
            },
        });

        (separator, right_id)
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Exact search, returning the pointer (if present) and the
    /// root-to-leaf trace of nodes visited.
    pub fn search(&self, key: &Key) -> (Option<LocationPointer>, Vec<String>) {
        let mut trace = vec!["Root".to_string()];
        let mut node = &self.nodes[self.root];

        while let NodeKind::Internal { children } = &node.kind {
            trace.push(node.describe());
            let idx = child_index(&node.keys, key);
            node = &self.nodes[children[idx]];
        }
        trace.push(node.describe());

        let pointer = match node.keys.binary_search(key) {
            Ok(idx) => match &node.kind {
                NodeKind::Leaf { values, .. } => Some(values[idx]),
                NodeKind::Internal { .. } => unreachable!("descent ends at a leaf"),
            },
            Err(_) => None,
        };
        (pointer, trace)
    }

    /// Whether a key is present (no trace)
    pub fn contains(&self, key: &Key) -> bool {
        let mut node = &self.nodes[self.root];
        while let NodeKind::Internal { children } = &node.kind {
            node = &self.nodes[children[child_index(&node.keys, key)]];
        }
        node.keys.binary_search(key).is_ok()
    }

    /// Inclusive range search, ascending by key
    ///
    /// Descends to the leaf where `start` would live, then walks the leaf
    /// chain, stopping at the first key past `end`. Rejects `start > end`
    /// before any traversal.
    pub fn range_search(
        &self,
        start: &Key,
        end: &Key,
    ) -> Result<(Vec<(Key, LocationPointer)>, Vec<String>)> {
        if start > end {
            return Err(DistriError::InvalidRange {
                start: start.clone(),
                end: end.clone(),
            });
        }

        let mut trace = vec!["Root".to_string()];
        let mut node_id = self.root;
        loop {
            let node = &self.nodes[node_id];
            match &node.kind {
                NodeKind::Internal { children } => {
                    trace.push(node.describe());
                    node_id = children[child_index(&node.keys, start)];
                }
                NodeKind::Leaf { .. } => break,
            }
        }

        let mut results = Vec::new();
        let mut current = Some(node_id);
        let mut first = true;
        while let Some(id) = current {
            let node = &self.nodes[id];
            trace.push(format!(
                "{} {}",
                if first { "Start" } else { "Next" },
                node.describe()
            ));
            first = false;

            let (values, next) = match &node.kind {
                NodeKind::Leaf { values, next } => (values, *next),
                NodeKind::Internal { .. } => unreachable!("leaf chain holds only leaves"),
            };
            for (idx, key) in node.keys.iter().enumerate() {
                if key < start {
                    continue;
                }
                if key > end {
                    return Ok((results, trace));
                }
                results.push((key.clone(), values[idx]));
            }
            current = next;
        }
        Ok((results, trace))
    }

    // =========================================================================
    // Introspection & Reset
    // =========================================================================

    /// Read-only nested snapshot of the whole tree
    pub fn snapshot(&self) -> TreeSnapshot {
        self.snapshot_node(self.root)
    }

    fn snapshot_node(&self, node_id: NodeId) -> TreeSnapshot {
        let node = &self.nodes[node_id];
        match &node.kind {
            NodeKind::Leaf { values, .. } => TreeSnapshot {
                keys: node.keys.clone(),
                values: values.clone(),
                node_type: NodeType::Leaf,
                children: Vec::new(),
            },
            NodeKind::Internal { children } => TreeSnapshot {
                keys: node.keys.clone(),
                values: Vec::new(),
                node_type: NodeType::Internal,
                children: children.iter().map(|&c| self.snapshot_node(c)).collect(),
            },
        }
    }

    /// Drop the entire node graph and start over with an empty leaf root
    pub fn reset(&mut self) {
        self.nodes.clear();
        self.nodes.push(Node::empty_leaf());
        self.root = 0;
        self.len = 0;
        tracing::info!("index reset");
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        self.nodes.len() - 1
    }
}

/// Child slot for a key: the count of separators `<= key`
/// (rightmost-insertion-point semantics, so a key equal to a separator
/// descends right, where the copied-up leaf key lives).
fn child_index(keys: &[Key], key: &Key) -> usize {
    match keys.binary_search(key) {
        Ok(idx) => idx + 1,
        Err(idx) => idx,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LocationPointer;

    fn ptr(record_id: u64) -> LocationPointer {
        LocationPointer {
            partition_id: 0,
            record_id,
        }
    }

    #[test]
    fn empty_tree_finds_nothing() {
        let tree = BPlusTree::new(4).unwrap();
        let (found, trace) = tree.search(&Key::Int(1));
        assert!(found.is_none());
        assert_eq!(trace[0], "Root");
        assert_eq!(tree.depth(), 1);
    }

    #[test]
    fn order_below_three_is_rejected() {
        assert!(matches!(
            BPlusTree::new(2),
            Err(DistriError::Config(_))
        ));
    }

    #[test]
    fn leaf_split_copies_separator_up() {
        // Order 3: third key overflows the root leaf.
        let mut tree = BPlusTree::new(3).unwrap();
        for k in [10, 20, 30] {
            tree.insert(Key::Int(k), ptr(k as u64)).unwrap();
        }
        let snap = tree.snapshot();
        assert_eq!(snap.node_type, NodeType::Internal);
        // mid = 3/2 = 1: right leaf takes [20, 30], 20 is copied up.
        assert_eq!(snap.keys, vec![Key::Int(20)]);
        assert_eq!(snap.children[0].keys, vec![Key::Int(10)]);
        assert_eq!(snap.children[1].keys, vec![Key::Int(20), Key::Int(30)]);
        // The copied-up key is still findable at the leaf level.
        assert_eq!(tree.search(&Key::Int(20)).0, Some(ptr(20)));
    }

    #[test]
    fn trace_is_root_to_leaf() {
        let mut tree = BPlusTree::new(3).unwrap();
        for k in 1..=5 {
            tree.insert(Key::Int(k), ptr(k as u64)).unwrap();
        }
        let (found, trace) = tree.search(&Key::Int(4));
        assert!(found.is_some());
        assert_eq!(trace[0], "Root");
        assert!(trace[1].starts_with("Internal"));
        assert!(trace.last().unwrap().starts_with("Leaf"));
    }

    #[test]
    fn range_rejects_inverted_bounds() {
        let tree = BPlusTree::new(4).unwrap();
        assert!(matches!(
            tree.range_search(&Key::Int(9), &Key::Int(5)),
            Err(DistriError::InvalidRange { .. })
        ));
    }

    #[test]
    fn range_walks_leaf_chain() {
        let mut tree = BPlusTree::new(3).unwrap();
        for k in 1..=10 {
            tree.insert(Key::Int(k), ptr(k as u64)).unwrap();
        }
        let (entries, trace) = tree.range_search(&Key::Int(3), &Key::Int(8)).unwrap();
        let keys: Vec<_> = entries.iter().map(|(k, _)| k.clone()).collect();
        assert_eq!(keys, (3..=8).map(Key::Int).collect::<Vec<_>>());
        // The walk crosses more than one leaf at order 3.
        assert!(trace.iter().any(|s| s.starts_with("Next Leaf")));
    }

    #[test]
    fn reset_drops_everything() {
        let mut tree = BPlusTree::new(4).unwrap();
        for k in 1..=20 {
            tree.insert(Key::Int(k), ptr(k as u64)).unwrap();
        }
        assert!(tree.depth() > 1);
        tree.reset();
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.len(), 0);
        assert!(tree.search(&Key::Int(5)).0.is_none());
        // Reusable after reset.
        tree.insert(Key::Int(5), ptr(5)).unwrap();
        assert_eq!(tree.search(&Key::Int(5)).0, Some(ptr(5)));
    }

    #[test]
    fn text_keys_order_lexicographically() {
        let mut tree = BPlusTree::new(4).unwrap();
        for (i, name) in ["mango", "apple", "zebra", "fig"].iter().enumerate() {
            tree.insert(Key::from(*name), ptr(i as u64)).unwrap();
        }
        let (entries, _) = tree
            .range_search(&Key::from("a"), &Key::from("zz"))
            .unwrap();
        let keys: Vec<_> = entries.iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(keys, vec!["apple", "fig", "mango", "zebra"]);
    }
}
