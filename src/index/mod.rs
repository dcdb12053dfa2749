//! Index Module
//!
//! In-memory B+Tree mapping keys to location pointers.
//!
//! ## Responsibilities
//! - Point and range search with a root-to-leaf traversal trace
//! - Insertion with automatic node splitting
//! - Structural snapshot for external visualization
//!
//! ## Data Structure Choice
//! Arena-allocated nodes (`Vec<Node>` + index handles):
//! - The tree owns every node through the arena; internal nodes refer to
//!   children by id, never by owning pointer
//! - The leaf chain is a plain `Option<NodeId>` per leaf: a non-owning
//!   traversal aid, not a second ownership edge
//! - Values live only at leaves; internal nodes hold separators only

mod node;
mod snapshot;
mod tree;

pub use node::{Node, NodeId, NodeKind};
pub use snapshot::{NodeType, TreeSnapshot};
pub use tree::BPlusTree;
